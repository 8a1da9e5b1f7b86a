use validator::ValidationErrors;

use crate::http::HttpError;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("No profile loaded")]
    NotLoaded,
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Http(#[from] HttpError),
}
