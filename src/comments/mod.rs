pub mod model;
pub mod service;

pub use model::{Comment, CommentThread, NewComment};
pub use service::{CommentError, CommentService};
