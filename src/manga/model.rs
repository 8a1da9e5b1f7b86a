use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One cover image, addressed by its storage key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Cover {
    pub b2key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<u32>,
}

/// The comic a listing entry points at.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ComicSummary {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub hid: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub md_covers: Vec<Cover>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entry of the hot (or newest) chapter listing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MangaChapter {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub hid: Option<String>,
    #[serde(default)]
    pub chap: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub md_comics: Option<ComicSummary>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TrendingManga {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub hid: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content_rating: Option<String>,
    #[serde(default)]
    pub md_covers: Vec<Cover>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MangaInfo {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub hid: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub md_covers: Vec<Cover>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<Recommendation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MangaInfo {
    pub fn publication_status(&self) -> PublicationStatus {
        self.status
            .map(PublicationStatus::from_code)
            .unwrap_or(PublicationStatus::Unknown)
    }

    pub fn kind(&self) -> MangaKind {
        self.country
            .as_deref()
            .map(MangaKind::from_country)
            .unwrap_or(MangaKind::International)
    }

    pub fn cover_key(&self) -> Option<&str> {
        self.md_covers.first().map(|cover| cover.b2key.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Recommendation {
    #[serde(default)]
    pub up: Option<i64>,
    #[serde(default)]
    pub down: Option<i64>,
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub relates: Option<ComicSummary>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A comic together with the recommendations shipped alongside it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MangaDetails {
    pub comic: MangaInfo,
    pub recommendations: Vec<Recommendation>,
}

/// The `/comic/{slug}` payload.
#[derive(Deserialize, Debug)]
pub(crate) struct ComicResponse {
    pub comic: MangaInfo,
}

impl From<ComicResponse> for MangaDetails {
    fn from(mut value: ComicResponse) -> Self {
        let recommendations = std::mem::take(&mut value.comic.recommendations);
        Self {
            comic: value.comic,
            recommendations,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Chapter {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub hid: Option<String>,
    #[serde(default)]
    pub chap: Option<String>,
    #[serde(default)]
    pub vol: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ChapterList {
    pub chapters: Vec<Chapter>,
    pub total: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SearchResult {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub hid: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub md_covers: Vec<Cover>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Neighbouring chapter ids, as reported by `/chapter/{hid}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ChapterNavigation {
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl ChapterNavigation {
    pub(crate) fn from_payload(payload: &Value) -> Self {
        let hid = |field: &str| {
            payload
                .get(field)
                .and_then(|chapter| chapter.get("hid"))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Self {
            prev: hid("prev_chapter").or_else(|| hid("prev")),
            next: hid("next_chapter").or_else(|| hid("next")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChapterOrder {
    #[default]
    Descending,
    Ascending,
}

impl ChapterOrder {
    /// Value of the upstream `chap-order` parameter.
    pub fn as_param(&self) -> u8 {
        match self {
            ChapterOrder::Descending => 0,
            ChapterOrder::Ascending => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationStatus {
    Ongoing,
    Completed,
    Cancelled,
    Hiatus,
    Unknown,
}

impl PublicationStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => PublicationStatus::Ongoing,
            2 => PublicationStatus::Completed,
            3 => PublicationStatus::Cancelled,
            4 => PublicationStatus::Hiatus,
            _ => PublicationStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationStatus::Ongoing => "Ongoing",
            PublicationStatus::Completed => "Completed",
            PublicationStatus::Cancelled => "Cancelled",
            PublicationStatus::Hiatus => "Hiatus",
            PublicationStatus::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MangaKind {
    Manga,
    Manhwa,
    Manhua,
    International,
}

impl MangaKind {
    pub fn from_country(country: &str) -> Self {
        match country {
            "jp" => MangaKind::Manga,
            "kr" => MangaKind::Manhwa,
            "cn" => MangaKind::Manhua,
            _ => MangaKind::International,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MangaKind::Manga => "Manga",
            MangaKind::Manhwa => "Manhwa",
            MangaKind::Manhua => "Manhua",
            MangaKind::International => "International",
        }
    }
}
