use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateLength, ValidationError, ValidationErrors};

use crate::{
    auth::UserIdentity,
    bookmarks::{Bookmark, ReadingStatus},
};

const MAX_BIO_LENGTH: u64 = 500;

/// Body of `PUT /profile`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl Validate for ProfileUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.username.trim().validate_length(Some(3), Some(32), None) {
            errors.add(
                "username",
                ValidationError::new("username_length")
                    .with_message(Cow::from("Username length must be between 3 and 32")),
            );
        }

        if let Some(bio) = &self.bio {
            if !bio.validate_length(None, Some(MAX_BIO_LENGTH), None) {
                errors.add(
                    "bio",
                    ValidationError::new("bio_length")
                        .with_message(Cow::from("Bio must be at most 500 characters")),
                );
            }
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

/// An avatar picked for upload.
#[derive(Debug, Clone)]
pub struct ProfileImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub avatar_url: String,
    pub profile: UserIdentity,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ProfileData {
    pub profile: UserIdentity,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileStats {
    pub currently_reading: u64,
    pub completed: u64,
    pub plan_to_read: u64,
    pub favorites: u64,
}

impl ProfileStats {
    /// Tallies a bookmark listing. Every bookmark counts as a favorite.
    pub fn from_bookmarks(bookmarks: &[Bookmark]) -> Self {
        bookmarks
            .iter()
            .fold(Self::default(), |mut stats, bookmark| {
                match bookmark.reading_status {
                    Some(ReadingStatus::Reading) => stats.currently_reading += 1,
                    Some(ReadingStatus::Completed) => stats.completed += 1,
                    Some(ReadingStatus::PlanToRead) => stats.plan_to_read += 1,
                    _ => {}
                }
                stats.favorites += 1;
                stats
            })
    }
}

/// Partial stats update; unset fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsPatch {
    pub currently_reading: Option<u64>,
    pub completed: Option<u64>,
    pub plan_to_read: Option<u64>,
    pub favorites: Option<u64>,
}

impl ProfileStats {
    pub fn apply(&mut self, patch: StatsPatch) {
        if let Some(value) = patch.currently_reading {
            self.currently_reading = value;
        }
        if let Some(value) = patch.completed {
            self.completed = value;
        }
        if let Some(value) = patch.plan_to_read {
            self.plan_to_read = value;
        }
        if let Some(value) = patch.favorites {
            self.favorites = value;
        }
    }
}
