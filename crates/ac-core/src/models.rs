//! # Domain Models
//!
//! These structs represent the core entities of altchan. Relationships are
//! plain foreign-key fields: a Thread names its Board by tag, a Post names
//! its Thread by id. Nothing holds a pointer back to its parent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a single board (e.g., /b/, /g/)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// The URL tag (e.g., "b" for /b/). Unique, at most 8 characters.
    pub tag: String,
    pub name: String,
    pub nsfw: bool,
}

/// A Thread groups Posts under a Board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    pub board_tag: String,
    pub subject: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The fundamental unit of conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub thread_id: i64,
    pub name: String,
    pub content: String,
    /// Stored name of the uploaded file, as handled by `MediaStore`
    pub filename: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A Thread joined with its Posts at query time, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadWithPosts {
    pub thread: Thread,
    pub posts: Vec<Post>,
}

/// A Thread that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewThread {
    pub board_tag: String,
    pub subject: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A Post that has not been persisted yet. Its thread is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub name: String,
    pub content: String,
    pub filename: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewThread {
    pub fn into_thread(self, id: i64) -> Thread {
        Thread {
            id,
            board_tag: self.board_tag,
            subject: self.subject,
            created_at: self.created_at,
        }
    }
}

impl NewPost {
    pub fn into_post(self, id: i64, thread_id: i64) -> Post {
        Post {
            id,
            thread_id,
            name: self.name,
            content: self.content,
            filename: self.filename,
            email: self.email,
            created_at: self.created_at,
        }
    }
}
