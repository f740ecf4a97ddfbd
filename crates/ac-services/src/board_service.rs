//! Read side: the board index and a board with its threads.

use std::sync::Arc;

use ac_core::{AppError, Board, BoardRepo, Result, ThreadWithPosts};

/// A board and every thread on it, each with its posts.
#[derive(Debug, Clone)]
pub struct BoardPage {
    pub board: Board,
    pub threads: Vec<ThreadWithPosts>,
}

pub struct BoardService {
    repo: Arc<dyn BoardRepo>,
}

impl BoardService {
    pub fn new(repo: Arc<dyn BoardRepo>) -> Self {
        Self { repo }
    }

    pub async fn list_boards(&self) -> Result<Vec<Board>> {
        Ok(self.repo.list_boards().await?)
    }

    /// Loads a board, its threads, and each thread's posts.
    #[tracing::instrument(skip(self))]
    pub async fn board_page(&self, tag: &str) -> Result<BoardPage> {
        let board = self
            .repo
            .get_board(tag)
            .await?
            .ok_or_else(|| AppError::NotFound("board", format!("/{tag}/")))?;

        let threads = self.repo.list_threads(&board.tag).await?;
        let mut with_posts = Vec::with_capacity(threads.len());
        for thread in threads {
            let posts = self.repo.list_posts(thread.id).await?;
            with_posts.push(ThreadWithPosts { thread, posts });
        }

        Ok(BoardPage {
            board,
            threads: with_posts,
        })
    }
}
