use crate::{
    auth::AuthError, comments::CommentError, http::HttpError, manga::ResourceError,
    profile::ProfileError, storage::StorageError,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Http error: {0}")]
    Http(HttpError),

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Auth error: {0}")]
    Auth(AuthError),

    #[error("Resource error: {0}")]
    Resource(ResourceError),

    #[error("Profile error: {0}")]
    Profile(ProfileError),

    #[error("Comment error: {0}")]
    Comment(CommentError),

    #[error("Other error: {0}")]
    Other(anyhow::Error),
}

impl From<HttpError> for Error {
    fn from(value: HttpError) -> Self {
        Self::Http(value)
    }
}

impl From<StorageError> for Error {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<AuthError> for Error {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<ResourceError> for Error {
    fn from(value: ResourceError) -> Self {
        Self::Resource(value)
    }
}

impl From<ProfileError> for Error {
    fn from(value: ProfileError) -> Self {
        Self::Profile(value)
    }
}

impl From<CommentError> for Error {
    fn from(value: CommentError) -> Self {
        Self::Comment(value)
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(value)
    }
}
