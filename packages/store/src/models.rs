//! # Domain models for identities, posts and comments
//!
//! These are the records exchanged with the blog API and held in client-side
//! state. All of them are `Serialize + Deserialize` so the same structs are
//! used for the wire format and for the persisted identity.
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`Identity`] | The authenticated user (`id`, `username`, `email`). Persisted next to the credential token. |
//! | [`AuthorSummary`] | The short form of a user embedded in posts, comments and like lists. |
//! | [`Post`] | A blog post with its like set and its comments in creation order. |
//! | [`Comment`] | A comment owned by exactly one post. |
//!
//! The API names entity ids `_id` while identities returned from `/auth/*` use
//! `id`; both spellings are accepted when reading.

use serde::{Deserialize, Serialize};

/// Authenticated user record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
}

impl Identity {
    /// A persisted identity without an id cannot be acted on.
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// The form of this identity that appears in `likes` and `author` fields.
    pub fn summary(&self) -> AuthorSummary {
        AuthorSummary {
            id: self.id.clone(),
            username: self.username.clone(),
        }
    }
}

/// User reference embedded in posts, comments and like lists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub username: String,
}

/// A blog post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: AuthorSummary,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
    /// At most one entry per user id.
    #[serde(default)]
    pub likes: Vec<AuthorSummary>,
    /// Creation order.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Post {
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|like| like.id == user_id)
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author.id == user_id
    }

    pub fn comment(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }
}

/// A comment on a post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub author: AuthorSummary,
    pub content: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
}

impl Comment {
    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author.id == user_id
    }
}
