use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_string_from_number;

pub const DEFAULT_MANGA_COUNTRY: &str = "jp";
pub const DEFAULT_MANGA_STATUS: i64 = 1;

/// Where the reader stands with a bookmarked title. Unrelated to the title's
/// own publication status.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    PlanToRead,
    Reading,
    OnHold,
    Dropped,
    Completed,
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::PlanToRead => "plan_to_read",
            ReadingStatus::Reading => "reading",
            ReadingStatus::OnHold => "on_hold",
            ReadingStatus::Dropped => "dropped",
            ReadingStatus::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReadingStatus::PlanToRead => "Plan to read",
            ReadingStatus::Reading => "Reading",
            ReadingStatus::OnHold => "On hold",
            ReadingStatus::Dropped => "Dropped",
            ReadingStatus::Completed => "Completed",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Bookmark {
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub manga_id: String,
    #[serde(default)]
    pub manga_hid: Option<String>,
    pub manga_title: String,
    #[serde(default)]
    pub manga_slug: Option<String>,
    #[serde(default)]
    pub manga_cover_b2key: Option<String>,
    #[serde(default)]
    pub manga_status: Option<i64>,
    #[serde(default)]
    pub manga_country: Option<String>,
    #[serde(default)]
    pub last_read_chapter: Option<String>,
    #[serde(default)]
    pub last_read_chapter_hid: Option<String>,
    #[serde(default)]
    pub reading_status: Option<ReadingStatus>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of `POST /bookmarks`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct BookmarkInput {
    pub manga_id: String,
    pub manga_hid: String,
    pub manga_title: String,
    pub manga_slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manga_cover_b2key: Option<String>,
    pub manga_status: Option<i64>,
    pub manga_country: Option<String>,
}

impl BookmarkInput {
    /// Fills the country and publication status the backend requires.
    pub fn with_defaults(mut self) -> Self {
        if self.manga_country.as_deref().is_none_or(str::is_empty) {
            self.manga_country = Some(DEFAULT_MANGA_COUNTRY.to_string());
        }
        if self.manga_status.is_none_or(|status| status == 0) {
            self.manga_status = Some(DEFAULT_MANGA_STATUS);
        }
        self
    }
}

/// Answer of `GET /bookmarks/check/{manga_id}`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct BookmarkCheck {
    #[serde(default, rename = "isBookmarked")]
    pub is_bookmarked: bool,
    #[serde(default, rename = "bookmarkData")]
    pub bookmark: Option<Bookmark>,
}

/// Outcome of a reading-status change, with the status the listing held
/// before it so the caller can roll its own view back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingStatusUpdate {
    pub success: bool,
    pub previous: Option<ReadingStatus>,
}
