use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_string_from_number;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Comment {
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub manga_id: String,
    #[serde(default)]
    pub chapter_hid: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub replies: Vec<Comment>,
}

/// Body of `POST /comments`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub manga_id: String,
    pub chapter_hid: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Top-level comments of one chapter, newest first, each with its replies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentThread {
    pub comments: Vec<Comment>,
}

impl CommentThread {
    pub fn new(comments: Vec<Comment>) -> Self {
        Self { comments }
    }

    /// Places a freshly posted comment: replies go to the end of their
    /// parent's replies, top-level comments go first.
    pub fn insert(&mut self, comment: Comment) {
        match comment.parent_id.clone() {
            Some(parent_id) => {
                if let Some(parent) = self.comments.iter_mut().find(|c| c.id == parent_id) {
                    parent.replies.push(comment);
                } else {
                    tracing::debug!(parent_id = %parent_id, "Reply to a comment outside this thread");
                }
            }
            None => self.comments.insert(0, comment),
        }
    }

    /// Removes a comment or reply by id. Returns whether anything was removed.
    pub fn remove(&mut self, comment_id: &str) -> bool {
        let before = self.total();

        self.comments.retain(|comment| comment.id != comment_id);
        for comment in &mut self.comments {
            comment.replies.retain(|reply| reply.id != comment_id);
        }

        self.total() != before
    }

    /// Comments plus replies.
    pub fn total(&self) -> usize {
        self.comments
            .iter()
            .map(|comment| 1 + comment.replies.len())
            .sum()
    }
}
