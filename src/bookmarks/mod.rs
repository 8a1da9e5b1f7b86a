pub mod manager;
pub mod model;

pub use manager::BookmarkManager;
pub use model::{Bookmark, BookmarkCheck, BookmarkInput, ReadingStatus, ReadingStatusUpdate};
