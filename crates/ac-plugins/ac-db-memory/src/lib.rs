//! # ac-db-memory
//!
//! In-process implementation of `BoardRepo`. Each entity lives in its own
//! vector table and rows refer to each other by tag or id, exactly like the
//! relational schema. Ids are handed out sequentially starting at 1.
//!
//! Data is lost when the process exits; use it for development and tests.

use ac_core::models::{Board, NewPost, NewThread, Post, Thread};
use ac_core::traits::BoardRepo;
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    boards: Vec<Board>,
    threads: Vec<Thread>,
    posts: Vec<Post>,
}

#[derive(Default)]
pub struct MemoryBoardRepo {
    tables: RwLock<Tables>,
}

impl MemoryBoardRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BoardRepo for MemoryBoardRepo {
    async fn get_board(&self, tag: &str) -> anyhow::Result<Option<Board>> {
        let tables = self.tables.read().await;
        Ok(tables.boards.iter().find(|b| b.tag == tag).cloned())
    }

    async fn list_boards(&self) -> anyhow::Result<Vec<Board>> {
        let tables = self.tables.read().await;
        let mut boards = tables.boards.clone();
        boards.sort_by(|a, b| a.tag.cmp(&b.tag));
        Ok(boards)
    }

    async fn upsert_board(&self, board: Board) -> anyhow::Result<()> {
        let mut tables = self.tables.write().await;
        match tables.boards.iter_mut().find(|b| b.tag == board.tag) {
            Some(existing) => *existing = board,
            None => tables.boards.push(board),
        }
        Ok(())
    }

    async fn list_threads(&self, board_tag: &str) -> anyhow::Result<Vec<Thread>> {
        let tables = self.tables.read().await;
        Ok(tables
            .threads
            .iter()
            .filter(|t| t.board_tag == board_tag)
            .cloned()
            .collect())
    }

    /// Both rows are pushed under one write lock, so readers never see a
    /// thread without its opening post.
    async fn create_thread(&self, thread: NewThread, opening_post: NewPost) -> anyhow::Result<(Thread, Post)> {
        let mut tables = self.tables.write().await;

        if !tables.boards.iter().any(|b| b.tag == thread.board_tag) {
            anyhow::bail!("board {} does not exist", thread.board_tag);
        }

        let thread_id = tables.threads.len() as i64 + 1;
        let post_id = tables.posts.len() as i64 + 1;
        let thread = thread.into_thread(thread_id);
        let post = opening_post.into_post(post_id, thread_id);

        tables.threads.push(thread.clone());
        tables.posts.push(post.clone());
        Ok((thread, post))
    }

    async fn list_posts(&self, thread_id: i64) -> anyhow::Result<Vec<Post>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .filter(|p| p.thread_id == thread_id)
            .cloned()
            .collect())
    }
}
