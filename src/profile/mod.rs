pub mod error;
pub mod model;
pub mod service;
pub mod store;

pub use error::ProfileError;
pub use model::{ImageUpload, ProfileImage, ProfileStats, ProfileUpdate, StatsPatch};
pub use service::ProfileService;
pub use store::{ProfileCacheReport, ProfileStore};
