use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    auth::AuthSession,
    http::{ApiClient, ApiResponse, HttpError},
    notify::{Notification, Notifier},
};

use super::{Comment, CommentThread, NewComment};

#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("Please log in to comment")]
    AuthRequired,
    #[error("Comment cannot be empty")]
    EmptyContent,
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Http(#[from] HttpError),
}

#[derive(Deserialize, Debug)]
struct PostedComment {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    comment: Option<Comment>,
}

/// Chapter comment threads.
pub struct CommentService {
    api: ApiClient,
    session: Arc<AuthSession>,
    notifier: Notifier,
}

impl CommentService {
    pub fn new(api: ApiClient, session: Arc<AuthSession>, notifier: Notifier) -> Self {
        Self {
            api,
            session,
            notifier,
        }
    }

    /// Comments of one chapter. Any failure reads as an empty thread.
    #[tracing::instrument(name = "list comments", skip(self))]
    pub async fn list(&self, manga_id: &str, chapter_hid: &str) -> CommentThread {
        if manga_id.is_empty() || chapter_hid.is_empty() {
            return CommentThread::default();
        }

        match self
            .api
            .get::<ApiResponse<Vec<Comment>>>(&format!(
                "/comments/manga/{manga_id}/chapter/{chapter_hid}"
            ))
            .await
        {
            Ok(response) if response.success => {
                CommentThread::new(response.data.unwrap_or_default())
            }
            Ok(_) => CommentThread::default(),
            Err(error) => {
                tracing::warn!(err.msg = %error, "Failed to fetch comments");
                CommentThread::default()
            }
        }
    }

    #[tracing::instrument(name = "post comment", skip(self, content))]
    pub async fn post(
        &self,
        manga_id: &str,
        chapter_hid: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<Comment, CommentError> {
        if !self.session.is_authenticated() {
            self.notifier.notify(Notification::error(
                "Authentication required",
                CommentError::AuthRequired.to_string(),
            ));
            return Err(CommentError::AuthRequired);
        }

        let content = content.trim();
        if content.is_empty() {
            return Err(CommentError::EmptyContent);
        }

        let body = NewComment {
            manga_id: manga_id.to_string(),
            chapter_hid: chapter_hid.to_string(),
            content: content.to_string(),
            parent_id: parent_id.map(str::to_string),
        };

        let result = self
            .api
            .post::<_, PostedComment>("/comments", &body)
            .await
            .map_err(CommentError::from)
            .and_then(|posted| match posted {
                PostedComment {
                    success: true,
                    comment: Some(comment),
                    ..
                } => Ok(comment),
                PostedComment { message, .. } => Err(CommentError::Rejected(
                    message.unwrap_or_else(|| "Failed to add comment".to_string()),
                )),
            });

        if let Err(error) = &result {
            self.notify_failure(error, "Failed to add comment");
        }

        result
    }

    #[tracing::instrument(name = "delete comment", skip(self))]
    pub async fn delete(&self, comment_id: &str) -> Result<(), CommentError> {
        if !self.session.is_authenticated() {
            return Err(CommentError::AuthRequired);
        }

        let result = self
            .api
            .delete::<ApiResponse<Value>>(&format!("/comments/{comment_id}"))
            .await
            .map_err(CommentError::from)
            .and_then(|response| {
                if response.success {
                    Ok(())
                } else {
                    Err(CommentError::Rejected(
                        response
                            .message
                            .unwrap_or_else(|| "Failed to delete comment".to_string()),
                    ))
                }
            });

        if let Err(error) = &result {
            self.notify_failure(error, "Failed to delete comment");
        }

        result
    }

    fn notify_failure(&self, error: &CommentError, fallback: &str) {
        tracing::warn!(err.msg = %error, err.details = ?error, "{fallback}");

        let description = match error {
            CommentError::Http(error) => error.server_message().unwrap_or(fallback).to_string(),
            other => other.to_string(),
        };
        self.notifier
            .notify(Notification::error("Error", description));
    }
}
