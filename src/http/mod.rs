pub mod client;
pub mod error;
pub mod events;
pub mod retry;

pub use client::{ApiClient, ApiResponse};
pub use error::HttpError;
pub use events::{AuthEvent, AuthEventBus};
pub use retry::RetryPolicy;
