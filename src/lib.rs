pub mod auth;
pub mod bookmarks;
pub mod cache;
pub mod clock;
pub mod comments;
pub mod configuration;
pub mod error;
pub mod http;
pub mod manga;
pub mod notify;
pub mod profile;
pub mod startup;
pub mod storage;
pub mod telemetry;
