use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    auth::UserIdentity,
    cache::HitRate,
    clock::SharedClock,
    configuration::Cache,
    storage::{SharedStorage, load_snapshot, save_snapshot},
};

use super::{
    ImageUpload, ProfileError, ProfileImage, ProfileService, ProfileStats, ProfileUpdate,
    StatsPatch,
};

pub const SNAPSHOT_KEY: &str = "profile-storage";

/// Everything cached about one account. Owned by `profile.id`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
struct Snapshot {
    profile: Option<UserIdentity>,
    last_fetch_time: Option<DateTime<Utc>>,
    bio: String,
    original_bio: String,
    stats: ProfileStats,
    cache_hits: u64,
    api_call_count: u64,
    #[serde(skip)]
    dirty: bool,
}

impl Snapshot {
    fn owner_id(&self) -> Option<&str> {
        self.profile.as_ref().map(|profile| profile.id.as_str())
    }

    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.profile.is_some() && self.last_fetch_time.is_some_and(|fetched| now - fetched < ttl)
    }

    /// Forgets the account but keeps the counters.
    fn reset(&mut self) {
        self.profile = None;
        self.last_fetch_time = None;
        self.bio.clear();
        self.original_bio.clear();
        self.stats = ProfileStats::default();
    }

    fn store_profile(&mut self, profile: UserIdentity, fetch_time: Option<DateTime<Utc>>) {
        self.bio = profile.bio.clone().unwrap_or_default();
        self.original_bio = self.bio.clone();
        self.profile = Some(profile);
        self.last_fetch_time = fetch_time;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileCacheReport {
    pub api_calls: u64,
    pub cache_hits: u64,
    pub hit_rate: HitRate,
    pub last_fetched: Option<DateTime<Utc>>,
}

/// Cache of the signed-in user's profile.
///
/// The cached entry belongs to exactly one user id; loading for anyone else
/// wipes it first.
pub struct ProfileStore {
    service: ProfileService,
    storage: SharedStorage,
    clock: SharedClock,
    config: Cache,
    state: Mutex<Snapshot>,
}

impl ProfileStore {
    pub fn new(
        service: ProfileService,
        storage: SharedStorage,
        clock: SharedClock,
        config: Cache,
    ) -> Self {
        let state = load_snapshot(storage.as_ref(), SNAPSHOT_KEY).unwrap_or_default();

        Self {
            service,
            storage,
            clock,
            config,
            state: Mutex::new(state),
        }
    }

    fn persist(&self, state: &mut Snapshot) {
        save_snapshot(self.storage.as_ref(), SNAPSHOT_KEY, &*state);
        state.dirty = false;
    }

    /// Writes the hit counter if it moved since the last write.
    pub fn flush(&self) {
        let mut state = self.state.lock();
        if state.dirty {
            self.persist(&mut state);
        }
    }

    #[tracing::instrument(
        name = "load profile",
        skip(self, auth_user),
        fields(user_id = ?auth_user.map(|user| &user.id))
    )]
    pub async fn load_profile(
        &self,
        auth_user: Option<&UserIdentity>,
        force: bool,
    ) -> Option<UserIdentity> {
        let Some(auth_user) = auth_user else {
            tracing::debug!("No signed-in user, clearing profile cache");
            self.clear_profile();
            return None;
        };

        let now = self.clock.now();
        let ttl = self.config.profile_ttl();

        {
            let mut state = self.state.lock();

            if state
                .owner_id()
                .is_some_and(|owner| owner != auth_user.id.as_str())
            {
                tracing::info!("Signed-in user changed, discarding cached profile");
                state.reset();
                self.persist(&mut state);
            }

            if !force && state.is_fresh(now, ttl) {
                tracing::debug!("Serving profile from cache");
                state.cache_hits += 1;
                state.dirty = true;
                return state.profile.clone();
            }
        }

        let result = self.service.get_profile().await;

        let mut state = self.state.lock();
        match result {
            Ok(profile) => {
                state.store_profile(profile.clone(), Some(now));
                state.api_call_count += 1;
                self.persist(&mut state);
                Some(profile)
            }
            Err(error) => {
                tracing::warn!(err.msg = %error, err.details = ?error, "Failed to fetch profile");

                if state.owner_id() == Some(auth_user.id.as_str()) {
                    return state.profile.clone();
                }

                tracing::info!("Falling back to session identity");
                state.store_profile(auth_user.clone(), None);
                self.persist(&mut state);
                Some(auth_user.clone())
            }
        }
    }

    #[tracing::instrument(name = "update profile", skip(self))]
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserIdentity, ProfileError> {
        if self.state.lock().profile.is_none() {
            return Err(ProfileError::NotLoaded);
        }
        update.validate()?;

        let profile = self.service.update_profile(&update).await.inspect_err(|error| {
            tracing::error!(err.msg = %error, err.details = ?error, "Failed to update profile");
        })?;
        self.overwrite(profile.clone());

        Ok(profile)
    }

    #[tracing::instrument(name = "upload profile image", skip_all)]
    pub async fn upload_profile_image(
        &self,
        image: ProfileImage,
    ) -> Result<ImageUpload, ProfileError> {
        let upload = self
            .service
            .upload_profile_image(image)
            .await
            .inspect_err(|error| {
                tracing::error!(err.msg = %error, err.details = ?error, "Failed to upload profile image");
            })?;
        self.overwrite(upload.profile.clone());

        Ok(upload)
    }

    #[tracing::instrument(name = "delete profile image", skip_all)]
    pub async fn delete_profile_image(&self) -> Result<UserIdentity, ProfileError> {
        let profile = self.service.delete_profile_image().await.inspect_err(|error| {
            tracing::error!(err.msg = %error, err.details = ?error, "Failed to delete profile image");
        })?;
        self.overwrite(profile.clone());

        Ok(profile)
    }

    fn overwrite(&self, profile: UserIdentity) {
        let now = self.clock.now();
        let mut state = self.state.lock();

        if state.owner_id().is_some_and(|owner| owner != profile.id) {
            state.reset();
        }
        state.store_profile(profile, Some(now));
        state.api_call_count += 1;
        self.persist(&mut state);
    }

    pub fn profile(&self) -> Option<UserIdentity> {
        self.state.lock().profile.clone()
    }

    /// The bio as currently being edited.
    pub fn bio(&self) -> String {
        self.state.lock().bio.clone()
    }

    pub fn original_bio(&self) -> String {
        self.state.lock().original_bio.clone()
    }

    pub fn set_bio(&self, bio: impl Into<String>) {
        let mut state = self.state.lock();
        state.bio = bio.into();
        self.persist(&mut state);
    }

    pub fn reset_edit_state(&self) {
        let mut state = self.state.lock();
        state.bio = state.original_bio.clone();
        self.persist(&mut state);
    }

    pub fn stats(&self) -> ProfileStats {
        self.state.lock().stats
    }

    pub fn set_stats(&self, patch: StatsPatch) {
        let mut state = self.state.lock();
        state.stats.apply(patch);
        self.persist(&mut state);
    }

    /// Seeds the cache from the session's identity without fetching.
    ///
    /// The entry is left stale so the next load still asks the server.
    pub fn initialize_from_auth(&self, auth_user: Option<&UserIdentity>) {
        let mut state = self.state.lock();

        match auth_user {
            Some(user) => {
                if state.owner_id() != Some(user.id.as_str()) {
                    state.reset();
                    state.store_profile(user.clone(), None);
                }
            }
            None => state.reset(),
        }

        self.persist(&mut state);
    }

    pub fn clear_profile(&self) {
        let mut state = self.state.lock();
        state.reset();
        self.persist(&mut state);
    }

    pub fn cache_report(&self) -> ProfileCacheReport {
        let state = self.state.lock();

        ProfileCacheReport {
            api_calls: state.api_call_count,
            cache_hits: state.cache_hits,
            hit_rate: HitRate::from_counts(state.cache_hits, state.api_call_count),
            last_fetched: state.last_fetch_time,
        }
    }
}

impl Drop for ProfileStore {
    fn drop(&mut self) {
        self.flush();
    }
}
