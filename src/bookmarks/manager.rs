use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::{
    auth::AuthSession,
    cache::Resource,
    http::{ApiClient, ApiResponse, HttpError},
    notify::{Notification, Notifier},
};

use super::{Bookmark, BookmarkCheck, BookmarkInput, ReadingStatus, ReadingStatusUpdate};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;

struct Listing {
    bookmarks: Vec<Bookmark>,
    page: u32,
    limit: u32,
    resource: Resource<String>,
}

impl Default for Listing {
    fn default() -> Self {
        Self {
            bookmarks: Vec::new(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            resource: Resource::default(),
        }
    }
}

/// Bookmark operations for the signed-in user.
///
/// Keeps the listing of the current view in memory and refetches it after
/// every successful mutation. Expected failures are reported through the
/// notifier and a `false`, never as an error.
pub struct BookmarkManager {
    api: ApiClient,
    session: Arc<AuthSession>,
    notifier: Notifier,
    listing: Mutex<Listing>,
}

impl BookmarkManager {
    pub fn new(api: ApiClient, session: Arc<AuthSession>, notifier: Notifier) -> Self {
        Self {
            api,
            session,
            notifier,
            listing: Mutex::new(Listing::default()),
        }
    }

    pub fn bookmarks(&self) -> Vec<Bookmark> {
        self.listing.lock().bookmarks.clone()
    }

    pub fn state(&self) -> Resource<String> {
        self.listing.lock().resource.clone()
    }

    /// Loads one page of bookmarks into the listing.
    ///
    /// Returns `None` when signed out or when the request failed; the failure
    /// is kept in [`BookmarkManager::state`].
    #[tracing::instrument(name = "fetch bookmarks", skip(self))]
    pub async fn fetch_bookmarks(&self, page: u32, limit: u32) -> Option<Vec<Bookmark>> {
        if !self.session.is_authenticated() {
            return None;
        }

        {
            let mut listing = self.listing.lock();
            listing.page = page;
            listing.limit = limit;
            listing.resource.start();
        }

        let result = self
            .api
            .get::<ApiResponse<Vec<Bookmark>>>(&format!("/bookmarks?page={page}&limit={limit}"))
            .await;

        match result {
            Ok(response) => {
                let mut listing = self.listing.lock();
                if response.success {
                    if let Some(bookmarks) = response.data {
                        listing.bookmarks = bookmarks;
                    }
                }
                listing.resource.succeed();
                Some(listing.bookmarks.clone())
            }
            Err(error) => {
                tracing::warn!(err.msg = %error, err.details = ?error, "Failed to fetch bookmarks");
                let message = error
                    .server_message()
                    .unwrap_or("Failed to fetch bookmarks")
                    .to_string();
                self.listing.lock().resource.fail(message.clone());
                self.notifier.notify(Notification::error("Error", message));
                None
            }
        }
    }

    async fn refetch(&self) {
        let (page, limit) = {
            let listing = self.listing.lock();
            (listing.page, listing.limit)
        };
        self.fetch_bookmarks(page, limit).await;
    }

    /// Never fails: anything but a clear answer reads as "not bookmarked".
    #[tracing::instrument(name = "check bookmark", skip(self))]
    pub async fn check_bookmark(&self, manga_id: &str) -> BookmarkCheck {
        if !self.session.is_authenticated() {
            return BookmarkCheck::default();
        }

        match self
            .api
            .get::<Value>(&format!("/bookmarks/check/{manga_id}"))
            .await
        {
            Ok(body) if body.get("success").and_then(Value::as_bool) != Some(false) => {
                read_check(body)
            }
            Ok(_) => BookmarkCheck::default(),
            Err(error) => {
                tracing::warn!(err.msg = %error, "Failed to check bookmark status");
                BookmarkCheck::default()
            }
        }
    }

    #[tracing::instrument(name = "add bookmark", skip_all, fields(manga_id = %input.manga_id))]
    pub async fn add_bookmark(&self, input: BookmarkInput) -> bool {
        if !self.session.is_authenticated() {
            self.notifier.notify(Notification::error(
                "Authentication required",
                "Please log in to bookmark manga",
            ));
            return false;
        }

        let input = input.with_defaults();
        let result = self
            .api
            .post::<_, ApiResponse<Value>>("/bookmarks", &input)
            .await;

        if self.report(result, "Failed to add bookmark") {
            self.notifier.notify(Notification::info(
                "Bookmark added",
                format!("{} has been bookmarked", input.manga_title),
            ));
            self.refetch().await;
            return true;
        }

        false
    }

    #[tracing::instrument(name = "remove bookmark", skip(self))]
    pub async fn remove_bookmark(&self, bookmark_id: &str, manga_title: Option<&str>) -> bool {
        if !self.session.is_authenticated() {
            return false;
        }

        let result = self
            .api
            .delete::<ApiResponse<Value>>(&format!("/bookmarks/{bookmark_id}"))
            .await;

        if self.report(result, "Failed to remove bookmark") {
            let description = match manga_title {
                Some(title) => format!("{title} has been removed from bookmarks"),
                None => "Bookmark removed".to_string(),
            };
            self.notifier
                .notify(Notification::info("Bookmark removed", description));
            self.refetch().await;
            return true;
        }

        false
    }

    /// Changes the reading status of one bookmark.
    ///
    /// With `skip_refetch` the caller has already updated its own view; the
    /// listing is patched in place instead of reloaded. On failure the caller
    /// rolls back to `previous`.
    #[tracing::instrument(name = "update reading status", skip(self))]
    pub async fn update_reading_status(
        &self,
        bookmark_id: &str,
        status: ReadingStatus,
        skip_refetch: bool,
    ) -> ReadingStatusUpdate {
        let previous = self
            .listing
            .lock()
            .bookmarks
            .iter()
            .find(|bookmark| bookmark.id == bookmark_id)
            .and_then(|bookmark| bookmark.reading_status);

        if !self.session.is_authenticated() {
            return ReadingStatusUpdate {
                success: false,
                previous,
            };
        }

        let result = self
            .api
            .put::<_, ApiResponse<Value>>(
                &format!("/bookmarks/{bookmark_id}/progress"),
                &json!({ "reading_status": status }),
            )
            .await;

        let success = self.report(result, "Failed to update reading status");
        if success {
            self.notifier.notify(Notification::info(
                "Reading status updated",
                format!("Marked as {}", status.label()),
            ));

            if skip_refetch {
                let mut listing = self.listing.lock();
                if let Some(bookmark) = listing
                    .bookmarks
                    .iter_mut()
                    .find(|bookmark| bookmark.id == bookmark_id)
                {
                    bookmark.reading_status = Some(status);
                }
            } else {
                self.refetch().await;
            }
        }

        ReadingStatusUpdate { success, previous }
    }

    #[tracing::instrument(name = "update reading progress", skip(self))]
    pub async fn update_reading_progress(
        &self,
        bookmark_id: &str,
        chapter_number: &str,
        chapter_hid: &str,
    ) -> bool {
        if !self.session.is_authenticated() {
            return false;
        }

        let result = self
            .api
            .put::<_, ApiResponse<Value>>(
                &format!("/bookmarks/{bookmark_id}/progress"),
                &json!({
                    "last_read_chapter": chapter_number,
                    "last_read_chapter_hid": chapter_hid,
                }),
            )
            .await;

        if self.report(result, "Failed to update reading progress") {
            self.refetch().await;
            return true;
        }

        false
    }

    /// Turns a mutation result into a success flag, notifying on failure.
    fn report(&self, result: Result<ApiResponse<Value>, HttpError>, fallback: &str) -> bool {
        let message = match result {
            Ok(response) if response.success => return true,
            Ok(response) => response.message.unwrap_or_else(|| fallback.to_string()),
            Err(error) => {
                tracing::warn!(err.msg = %error, err.details = ?error, "{fallback}");
                error.server_message().unwrap_or(fallback).to_string()
            }
        };

        self.notifier.notify(Notification::error("Error", message));
        false
    }
}

/// The flag and the bookmark are read separately so a bookmark the client
/// cannot decode does not hide that one exists.
fn read_check(mut body: Value) -> BookmarkCheck {
    let is_bookmarked = body
        .get("isBookmarked")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let bookmark = match body.get_mut("bookmarkData").map(Value::take) {
        Some(Value::Null) | None => None,
        Some(data) => serde_json::from_value(data)
            .inspect_err(|error| {
                tracing::warn!(err.msg = %error, "Unexpected bookmark check payload");
            })
            .ok(),
    };

    BookmarkCheck {
        is_bookmarked,
        bookmark,
    }
}
