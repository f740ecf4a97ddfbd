//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use bytes::Bytes;

use crate::models::{Board, NewPost, NewThread, Post, Thread};

/// Data persistence contract for boards, threads, and posts.
///
/// Listing order is part of the contract: boards by tag, threads and posts by
/// ascending id (which is creation order).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BoardRepo: Send + Sync {
    // Board Operations
    async fn get_board(&self, tag: &str) -> anyhow::Result<Option<Board>>;
    async fn list_boards(&self) -> anyhow::Result<Vec<Board>>;
    /// Creates the board or replaces its name and flag. Used by seeding only.
    async fn upsert_board(&self, board: Board) -> anyhow::Result<()>;

    // Thread Operations
    async fn list_threads(&self, board_tag: &str) -> anyhow::Result<Vec<Thread>>;
    /// Persists a thread and its opening post as one unit: both or neither.
    async fn create_thread(&self, thread: NewThread, opening_post: NewPost) -> anyhow::Result<(Thread, Post)>;

    // Post Operations
    async fn list_posts(&self, thread_id: i64) -> anyhow::Result<Vec<Post>>;
}

/// Media storage contract for uploaded files.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Saves raw bytes under `filename`. An existing file of that name is replaced.
    async fn save_upload(&self, filename: &str, data: Bytes) -> anyhow::Result<()>;
    /// Removes a previously saved upload. Removing a missing file is not an error.
    async fn remove_upload(&self, filename: &str) -> anyhow::Result<()>;
    /// Returns the public URL of a stored file.
    fn get_url(&self, filename: &str) -> String;
}
