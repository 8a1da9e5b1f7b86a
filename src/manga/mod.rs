pub mod api;
pub mod model;
pub mod normalize;
pub mod store;

pub use api::MangaApi;
pub use model::{
    Chapter, ChapterList, ChapterNavigation, ChapterOrder, ComicSummary, Cover, MangaChapter,
    MangaDetails, MangaInfo, MangaKind, PublicationStatus, Recommendation, SearchResult,
    TrendingManga,
};
pub use store::{CacheHits, HotPage, LastFetch, MangaCacheReport, MangaStore, ResourceError};
