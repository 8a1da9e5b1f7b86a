use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    cache::{CacheEntry, HitRate, Resource},
    clock::SharedClock,
    configuration::Cache,
    http::HttpError,
    storage::{SharedStorage, load_snapshot, save_snapshot},
};

use super::{
    Chapter, ChapterList, ChapterNavigation, ChapterOrder, Cover, MangaApi, MangaChapter,
    MangaDetails, SearchResult, TrendingManga,
    api::CHAPTER_REQUEST_LIMIT,
    model::ComicResponse,
    normalize::{
        CHAPTER_SHAPES, HOT_MANGA_SHAPES, IMAGE_SHAPES, SEARCH_SHAPES, TRENDING_SHAPES,
        decode_items, normalize, normalize_into,
    },
};

pub const SNAPSHOT_KEY: &str = "manga-storage";

const NEW_MANGA_LIMIT: usize = 10;
const MIN_SEARCH_LENGTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Failed(String),
}

/// One page of the hot listing. The page number is part of the cache key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HotPage {
    pub page: u32,
    pub items: Arc<Vec<MangaChapter>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheHits {
    pub hot_manga: u64,
    pub trending: u64,
    pub manga_info: u64,
    pub chapters: u64,
}

impl CacheHits {
    pub fn total(&self) -> u64 {
        self.hot_manga + self.trending + self.manga_info + self.chapters
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LastFetch {
    pub hot_manga: Option<DateTime<Utc>>,
    pub trending: Option<DateTime<Utc>>,
    pub manga_info: Option<DateTime<Utc>>,
    pub chapters: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MangaCacheReport {
    pub total_refreshes: u64,
    pub api_calls: u64,
    pub cache_hits: CacheHits,
    pub hit_rate: HitRate,
    pub session_time: Duration,
    pub last_fetch: LastFetch,
}

/// The persisted part of the store.
#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
struct Snapshot {
    hot_manga: Option<CacheEntry<HotPage>>,
    current_page: u32,
    total_pages: u32,
    trending: Option<CacheEntry<Arc<Vec<TrendingManga>>>>,
    manga_info: HashMap<String, CacheEntry<Arc<MangaDetails>>>,
    chapters: HashMap<String, CacheEntry<Arc<ChapterList>>>,
    cache_hits: CacheHits,
    last_fetch: LastFetch,
    api_call_count: u64,
    refresh_count: u64,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            hot_manga: None,
            current_page: 1,
            total_pages: 1,
            trending: None,
            manga_info: HashMap::new(),
            chapters: HashMap::new(),
            cache_hits: CacheHits::default(),
            last_fetch: LastFetch::default(),
            api_call_count: 0,
            refresh_count: 0,
        }
    }
}

#[derive(Default)]
struct Resources {
    hot_manga: Resource<ResourceError>,
    trending: Resource<ResourceError>,
    manga_info: Resource<ResourceError>,
    chapters: Resource<ResourceError>,
}

struct State {
    cache: Snapshot,
    resources: Resources,
    dirty: bool,
}

pub fn chapter_key(hid: &str, order: ChapterOrder) -> String {
    format!("{hid}_{}", order.as_param())
}

/// Cached access to the manga metadata API.
///
/// Every fetch serves a fresh cache entry without touching the network unless
/// `force` is set. A failed refresh records an error on its resource and keeps
/// whatever entry was there before.
pub struct MangaStore {
    api: MangaApi,
    storage: SharedStorage,
    clock: SharedClock,
    config: Cache,
    session_start: DateTime<Utc>,
    state: Mutex<State>,
}

impl MangaStore {
    pub fn new(api: MangaApi, storage: SharedStorage, clock: SharedClock, config: Cache) -> Self {
        let cache = load_snapshot(storage.as_ref(), SNAPSHOT_KEY).unwrap_or_default();
        let session_start = clock.now();

        Self {
            api,
            storage,
            clock,
            config,
            session_start,
            state: Mutex::new(State {
                cache,
                resources: Resources::default(),
                dirty: false,
            }),
        }
    }

    fn persist(&self, state: &mut State) {
        save_snapshot(self.storage.as_ref(), SNAPSHOT_KEY, &state.cache);
        state.dirty = false;
    }

    /// Writes counters that changed since the last cache write.
    ///
    /// Cache hits only bump counters, so they are held in memory until the
    /// next write or until the store is dropped.
    pub fn flush(&self) {
        let mut state = self.state.lock();
        if state.dirty {
            self.persist(&mut state);
        }
    }

    #[tracing::instrument(name = "fetch hot manga", skip(self))]
    pub async fn fetch_hot_manga(
        &self,
        page: Option<u32>,
        force: bool,
    ) -> Result<Arc<Vec<MangaChapter>>, ResourceError> {
        let now = self.clock.now();
        let ttl = self.config.hot_manga_ttl();
        let page_size = self.config.hot_manga_page_size.max(1);

        let page = {
            let mut state = self.state.lock();
            let page = page.unwrap_or(state.cache.current_page);

            if !force {
                let cached = state
                    .cache
                    .hot_manga
                    .as_ref()
                    .filter(|entry| {
                        entry.data.page == page
                            && !entry.data.items.is_empty()
                            && entry.is_fresh(now, ttl)
                    })
                    .map(|entry| entry.data.items.clone());

                if let Some(items) = cached {
                    tracing::debug!("Serving hot manga from cache");
                    state.cache.cache_hits.hot_manga += 1;
                    state.dirty = true;
                    return Ok(items);
                }
            }

            state.cache.current_page = page;
            state.resources.hot_manga.start();
            page
        };

        let result = self.api.hot_chapters(page, page_size).await;

        let mut state = self.state.lock();
        match result {
            Ok(payload) => {
                let total = payload.pointer("/pagination/total").and_then(Value::as_u64);
                let items: Arc<Vec<MangaChapter>> =
                    Arc::new(normalize_into(payload, HOT_MANGA_SHAPES, page_size));

                state.cache.hot_manga = Some(CacheEntry::new(
                    HotPage {
                        page,
                        items: items.clone(),
                    },
                    now,
                ));
                if let Some(total) = total {
                    state.cache.total_pages = total.div_ceil(page_size as u64).max(1) as u32;
                }
                state.cache.api_call_count += 1;
                state.cache.last_fetch.hot_manga = Some(now);
                state.resources.hot_manga.succeed();
                self.persist(&mut state);

                Ok(items)
            }
            Err(error) => {
                tracing::error!(err.msg = %error, err.details = ?error, "Failed to fetch hot manga");
                let error =
                    ResourceError::Failed("Failed to load manga data. Please try again later.".into());
                state.resources.hot_manga.fail(error.clone());
                Err(error)
            }
        }
    }

    #[tracing::instrument(name = "fetch trending manga", skip(self))]
    pub async fn fetch_trending(
        &self,
        force: bool,
    ) -> Result<Arc<Vec<TrendingManga>>, ResourceError> {
        let now = self.clock.now();
        let ttl = self.config.trending_ttl();

        {
            let mut state = self.state.lock();

            if !force {
                let cached = state
                    .cache
                    .trending
                    .as_ref()
                    .filter(|entry| !entry.data.is_empty() && entry.is_fresh(now, ttl))
                    .map(|entry| entry.data.clone());

                if let Some(items) = cached {
                    tracing::debug!("Serving trending manga from cache");
                    state.cache.cache_hits.trending += 1;
                    state.dirty = true;
                    return Ok(items);
                }
            }

            state.resources.trending.start();
        }

        let result = self.api.trending().await;

        let mut state = self.state.lock();
        match result {
            Ok(payload) => {
                let items: Arc<Vec<TrendingManga>> = Arc::new(normalize_into(
                    payload,
                    TRENDING_SHAPES,
                    self.config.trending_limit,
                ));

                state.cache.trending = Some(CacheEntry::new(items.clone(), now));
                state.cache.api_call_count += 1;
                state.cache.last_fetch.trending = Some(now);
                state.resources.trending.succeed();
                self.persist(&mut state);

                Ok(items)
            }
            Err(error) => {
                tracing::error!(err.msg = %error, err.details = ?error, "Failed to fetch trending manga");
                let error = ResourceError::Failed(
                    "Failed to load trending manga. Please try again later.".into(),
                );
                state.resources.trending.fail(error.clone());
                Err(error)
            }
        }
    }

    #[tracing::instrument(name = "fetch manga info", skip(self))]
    pub async fn fetch_manga_info(
        &self,
        slug: &str,
        force: bool,
    ) -> Result<Arc<MangaDetails>, ResourceError> {
        let now = self.clock.now();
        let ttl = self.config.manga_info_ttl();

        {
            let mut state = self.state.lock();

            if !force {
                let cached = state
                    .cache
                    .manga_info
                    .get(slug)
                    .filter(|entry| entry.is_fresh(now, ttl))
                    .map(|entry| entry.data.clone());

                if let Some(details) = cached {
                    tracing::debug!("Serving manga info from cache");
                    state.cache.cache_hits.manga_info += 1;
                    state.dirty = true;
                    return Ok(details);
                }
            }

            state.resources.manga_info.start();
        }

        let result = self.api.comic(slug).await.and_then(|payload| {
            serde_json::from_value::<ComicResponse>(payload).map_err(|error| {
                HttpError::MalformedResponse {
                    status: None,
                    message: error.to_string(),
                }
            })
        });

        let mut state = self.state.lock();
        match result {
            Ok(response) => {
                let details = Arc::new(MangaDetails::from(response));

                state
                    .cache
                    .manga_info
                    .insert(slug.to_string(), CacheEntry::new(details.clone(), now));
                state.cache.api_call_count += 1;
                state.cache.last_fetch.manga_info = Some(now);
                state.resources.manga_info.succeed();
                self.persist(&mut state);

                Ok(details)
            }
            Err(error) => {
                tracing::error!(err.msg = %error, err.details = ?error, "Failed to fetch manga info");
                let error = if error.is_not_found() {
                    ResourceError::NotFound("Manga not found.".into())
                } else {
                    ResourceError::Failed(format!("Failed to fetch manga info: {}", error.message()))
                };
                state.resources.manga_info.fail(error.clone());
                Err(error)
            }
        }
    }

    #[tracing::instrument(name = "fetch chapters", skip(self))]
    pub async fn fetch_chapters(
        &self,
        hid: &str,
        order: ChapterOrder,
        force: bool,
    ) -> Result<Arc<ChapterList>, ResourceError> {
        let now = self.clock.now();
        let ttl = self.config.chapters_ttl();
        let key = chapter_key(hid, order);

        {
            let mut state = self.state.lock();

            if !force {
                let cached = state
                    .cache
                    .chapters
                    .get(&key)
                    .filter(|entry| entry.is_fresh(now, ttl))
                    .map(|entry| entry.data.clone());

                if let Some(chapters) = cached {
                    tracing::debug!(key = %key, "Serving chapters from cache");
                    state.cache.cache_hits.chapters += 1;
                    state.dirty = true;
                    return Ok(chapters);
                }
            }

            state.resources.chapters.start();
        }

        let result = self.api.chapters(hid, order).await;

        let mut state = self.state.lock();
        match result {
            Ok(payload) => {
                let total = payload.get("total").and_then(Value::as_u64);
                let chapters: Vec<Chapter> =
                    normalize_into(payload, CHAPTER_SHAPES, CHAPTER_REQUEST_LIMIT as usize);

                if chapters.is_empty() {
                    tracing::info!(key = %key, "Manga has no chapters");
                    let error = ResourceError::NotFound("No chapters found for this manga.".into());
                    state.resources.chapters.fail(error.clone());
                    return Err(error);
                }

                let list = Arc::new(ChapterList {
                    total: total.unwrap_or(chapters.len() as u64),
                    chapters,
                });

                state
                    .cache
                    .chapters
                    .insert(key, CacheEntry::new(list.clone(), now));
                state.cache.api_call_count += 1;
                state.cache.last_fetch.chapters = Some(now);
                state.resources.chapters.succeed();
                self.persist(&mut state);

                Ok(list)
            }
            Err(error) => {
                tracing::error!(err.msg = %error, err.details = ?error, "Failed to fetch chapters");
                let error =
                    ResourceError::Failed(format!("Failed to fetch chapters: {}", error.message()));
                state.resources.chapters.fail(error.clone());
                Err(error)
            }
        }
    }

    /// Fresh cached details for `slug`, without fetching.
    pub fn get_manga_info(&self, slug: &str) -> Option<Arc<MangaDetails>> {
        let now = self.clock.now();
        let ttl = self.config.manga_info_ttl();

        self.state
            .lock()
            .cache
            .manga_info
            .get(slug)
            .filter(|entry| entry.is_fresh(now, ttl))
            .map(|entry| entry.data.clone())
    }

    pub fn get_chapters(&self, hid: &str, order: ChapterOrder) -> Option<Arc<ChapterList>> {
        let now = self.clock.now();
        let ttl = self.config.chapters_ttl();

        self.state
            .lock()
            .cache
            .chapters
            .get(&chapter_key(hid, order))
            .filter(|entry| entry.is_fresh(now, ttl))
            .map(|entry| entry.data.clone())
    }

    #[tracing::instrument(name = "search manga", skip(self))]
    pub async fn search(
        &self,
        query: &str,
        page: u32,
        limit: usize,
    ) -> Result<Vec<SearchResult>, ResourceError> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LENGTH {
            return Ok(Vec::new());
        }

        match self.api.search(query, page, limit).await {
            Ok(payload) => {
                self.record_api_call();
                Ok(normalize_into(payload, SEARCH_SHAPES, limit))
            }
            Err(error) => {
                tracing::error!(err.msg = %error, err.details = ?error, "Search failed");
                Err(ResourceError::Failed(format!("Search failed: {}", error.message())))
            }
        }
    }

    /// Latest chapter releases. Never cached.
    pub async fn fetch_new_manga(&self) -> Result<Vec<MangaChapter>, ResourceError> {
        match self.api.new_chapters(1, NEW_MANGA_LIMIT).await {
            Ok(payload) => {
                self.record_api_call();
                Ok(normalize_into(payload, HOT_MANGA_SHAPES, NEW_MANGA_LIMIT))
            }
            Err(error) => {
                tracing::error!(err.msg = %error, err.details = ?error, "Failed to fetch new manga");
                Err(ResourceError::Failed(
                    "Failed to load new manga. Please try again later.".into(),
                ))
            }
        }
    }

    /// Page image URLs of one chapter, in reading order.
    pub async fn chapter_images(&self, hid: &str) -> Result<Vec<String>, ResourceError> {
        let payload = self.api.chapter_images(hid).await.map_err(|error| {
            tracing::error!(err.msg = %error, err.details = ?error, "Failed to fetch chapter images");
            ResourceError::Failed(format!("Failed to load chapter images: {}", error.message()))
        })?;
        self.record_api_call();

        let images: Vec<String> = decode_items::<Cover>(normalize(payload, IMAGE_SHAPES))
            .iter()
            .map(|image| self.api.cover_url(&image.b2key))
            .collect();

        if images.is_empty() {
            return Err(ResourceError::NotFound("No images found for this chapter.".into()));
        }

        Ok(images)
    }

    pub async fn chapter_navigation(&self, hid: &str) -> Result<ChapterNavigation, ResourceError> {
        let payload = self.api.chapter(hid).await.map_err(|error| {
            tracing::error!(err.msg = %error, err.details = ?error, "Failed to fetch chapter");
            if error.is_not_found() {
                ResourceError::NotFound("Chapter not found.".into())
            } else {
                ResourceError::Failed(format!("Failed to load chapter: {}", error.message()))
            }
        })?;
        self.record_api_call();

        Ok(ChapterNavigation::from_payload(&payload))
    }

    pub fn cover_url(&self, b2key: &str) -> String {
        self.api.cover_url(b2key)
    }

    fn record_api_call(&self) {
        let mut state = self.state.lock();
        state.cache.api_call_count += 1;
        state.dirty = true;
    }

    /// Items of the cached hot page, fresh or not.
    pub fn hot_manga(&self) -> Arc<Vec<MangaChapter>> {
        self.state
            .lock()
            .cache
            .hot_manga
            .as_ref()
            .map(|entry| entry.data.items.clone())
            .unwrap_or_default()
    }

    pub fn trending(&self) -> Arc<Vec<TrendingManga>> {
        self.state
            .lock()
            .cache
            .trending
            .as_ref()
            .map(|entry| entry.data.clone())
            .unwrap_or_default()
    }

    pub fn current_page(&self) -> u32 {
        self.state.lock().cache.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.state.lock().cache.total_pages
    }

    pub fn hot_manga_state(&self) -> Resource<ResourceError> {
        self.state.lock().resources.hot_manga.clone()
    }

    pub fn trending_state(&self) -> Resource<ResourceError> {
        self.state.lock().resources.trending.clone()
    }

    pub fn manga_info_state(&self) -> Resource<ResourceError> {
        self.state.lock().resources.manga_info.clone()
    }

    pub fn chapters_state(&self) -> Resource<ResourceError> {
        self.state.lock().resources.chapters.clone()
    }

    pub fn increment_refresh_count(&self) {
        let mut state = self.state.lock();
        state.cache.refresh_count += 1;
        state.dirty = true;
    }

    /// Drops every cached entry. Counters are kept.
    pub fn clear_cache(&self) {
        let mut state = self.state.lock();
        state.cache.hot_manga = None;
        state.cache.trending = None;
        state.cache.manga_info.clear();
        state.cache.chapters.clear();
        self.persist(&mut state);
    }

    pub fn stats(&self) -> MangaCacheReport {
        let state = self.state.lock();
        let cache = &state.cache;

        MangaCacheReport {
            total_refreshes: cache.refresh_count,
            api_calls: cache.api_call_count,
            cache_hits: cache.cache_hits,
            hit_rate: HitRate::from_counts(cache.cache_hits.total(), cache.api_call_count),
            session_time: self.clock.now() - self.session_start,
            last_fetch: cache.last_fetch,
        }
    }
}

impl Drop for MangaStore {
    fn drop(&mut self) {
        self.flush();
    }
}
