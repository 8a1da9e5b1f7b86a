use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{
    auth::AuthSession,
    bookmarks::BookmarkManager,
    clock::{SharedClock, SystemClock},
    comments::CommentService,
    configuration::Config,
    error::Error,
    http::{ApiClient, AuthEventBus},
    manga::{MangaApi, MangaStore},
    notify::Notifier,
    profile::{ProfileService, ProfileStore},
    storage::{CredentialStore, FileStorage, MemoryStorage, SharedStorage},
};

/// Every store and service of the client, wired to one backend.
pub struct Application {
    config: Config,
    storage: SharedStorage,
    events: AuthEventBus,
    notifier: Notifier,
    credentials: CredentialStore,
    session: Arc<AuthSession>,
    manga: Arc<MangaStore>,
    profile: Arc<ProfileStore>,
    bookmarks: Arc<BookmarkManager>,
    comments: Arc<CommentService>,
    forced_logout_listener: JoinHandle<()>,
}

impl Application {
    /// Builds the client with the storage named in `config` and the system
    /// clock. Must run inside a tokio runtime.
    pub fn build(config: Config) -> Result<Self, Error> {
        let storage: SharedStorage = match &config.storage.directory {
            Some(directory) => {
                tracing::info!(directory = %directory.display(), "Using file storage");
                Arc::new(FileStorage::open(directory)?)
            }
            None => {
                tracing::info!("No storage directory configured, state will not survive restarts");
                Arc::new(MemoryStorage::new())
            }
        };

        Self::build_with(config, storage, Arc::new(SystemClock))
    }

    pub fn build_with(
        config: Config,
        storage: SharedStorage,
        clock: SharedClock,
    ) -> Result<Self, Error> {
        let events = AuthEventBus::new();
        let notifier = Notifier::new();
        let credentials =
            CredentialStore::new(storage.clone(), clock.clone(), &config.storage.namespace);

        let api = ApiClient::new(&config.backend, credentials.clone(), events.clone())?;
        let manga_api = MangaApi::new(&config.manga_api)?;

        let session = Arc::new(AuthSession::new(
            api.clone(),
            credentials.clone(),
            notifier.clone(),
        ));
        let forced_logout_listener = session.spawn_forced_logout_listener();

        let manga = Arc::new(MangaStore::new(
            manga_api,
            storage.clone(),
            clock.clone(),
            config.cache.clone(),
        ));
        let profile = Arc::new(ProfileStore::new(
            ProfileService::new(api.clone()),
            storage.clone(),
            clock,
            config.cache.clone(),
        ));
        let bookmarks = Arc::new(BookmarkManager::new(
            api.clone(),
            session.clone(),
            notifier.clone(),
        ));
        let comments = Arc::new(CommentService::new(api, session.clone(), notifier.clone()));

        Ok(Self {
            config,
            storage,
            events,
            notifier,
            credentials,
            session,
            manga,
            profile,
            bookmarks,
            comments,
            forced_logout_listener,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    pub fn events(&self) -> &AuthEventBus {
        &self.events
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub fn manga(&self) -> &Arc<MangaStore> {
        &self.manga
    }

    pub fn profile(&self) -> &Arc<ProfileStore> {
        &self.profile
    }

    pub fn bookmarks(&self) -> &Arc<BookmarkManager> {
        &self.bookmarks
    }

    pub fn comments(&self) -> &Arc<CommentService> {
        &self.comments
    }

    /// Restores the session and loads the matching profile, if any.
    pub async fn initialize(&self) {
        let session = self.session.initialize().await;
        self.profile.initialize_from_auth(session.user.as_ref());

        if session.is_authenticated {
            self.profile.load_profile(session.user.as_ref(), false).await;
        }
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        self.forced_logout_listener.abort();
    }
}
