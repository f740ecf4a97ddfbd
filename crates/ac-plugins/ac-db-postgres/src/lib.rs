//! # ac-db-postgres Implementation
//!
//! This module implements the data mapping between the PostgreSQL relational
//! model and the `ac-core` domain models. The schema ships with the crate as
//! sqlx migrations.

use ac_core::models::{Board, NewPost, NewThread, Post, Thread};
use ac_core::traits::BoardRepo;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

pub use sqlx::postgres::PgConnectOptions;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

pub struct PgBoardRepo {
    pool: PgPool,
}

impl PgBoardRepo {
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect_with(options: PgConnectOptions, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self::from_pool(pool))
    }

    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new().connect(url).await?;
        Ok(Self::from_pool(pool))
    }

    /// Creates any missing tables.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    /// Drops every table, data included, and recreates the schema.
    pub async fn reset_schema(&self) -> anyhow::Result<()> {
        tracing::warn!("dropping all altchan tables");
        sqlx::query("DROP TABLE IF EXISTS posts, threads, boards, _sqlx_migrations CASCADE")
            .execute(&self.pool)
            .await?;
        self.migrate().await
    }
}

fn board_from_row(row: &PgRow) -> Result<Board, sqlx::Error> {
    Ok(Board {
        tag: row.try_get("tag")?,
        name: row.try_get("name")?,
        nsfw: row.try_get("nsfw")?,
    })
}

fn thread_from_row(row: &PgRow) -> Result<Thread, sqlx::Error> {
    Ok(Thread {
        id: row.try_get("id")?,
        board_tag: row.try_get("board_tag")?,
        subject: row.try_get("subject")?,
        created_at: row.try_get("created_at")?,
    })
}

fn post_from_row(row: &PgRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        thread_id: row.try_get("thread_id")?,
        name: row.try_get("name")?,
        content: row.try_get("content")?,
        filename: row.try_get("filename")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl BoardRepo for PgBoardRepo {
    async fn get_board(&self, tag: &str) -> anyhow::Result<Option<Board>> {
        let row = sqlx::query("SELECT tag, name, nsfw FROM boards WHERE tag = $1")
            .bind(tag)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(board_from_row).transpose()?)
    }

    async fn list_boards(&self) -> anyhow::Result<Vec<Board>> {
        let rows = sqlx::query("SELECT tag, name, nsfw FROM boards ORDER BY tag")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(board_from_row).collect::<Result<_, _>>()?)
    }

    async fn upsert_board(&self, board: Board) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO boards (tag, name, nsfw) VALUES ($1, $2, $3) \
             ON CONFLICT (tag) DO UPDATE SET name = EXCLUDED.name, nsfw = EXCLUDED.nsfw",
        )
        .bind(&board.tag)
        .bind(&board.name)
        .bind(board.nsfw)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_threads(&self, board_tag: &str) -> anyhow::Result<Vec<Thread>> {
        let rows = sqlx::query(
            "SELECT id, board_tag, subject, created_at FROM threads WHERE board_tag = $1 ORDER BY id",
        )
        .bind(board_tag)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(thread_from_row).collect::<Result<_, _>>()?)
    }

    /// Atomic operation to create a thread and its first post.
    ///
    /// If either insert fails the transaction is dropped without commit and
    /// rolled back, so no thread is left without its opening post.
    async fn create_thread(&self, thread: NewThread, opening_post: NewPost) -> anyhow::Result<(Thread, Post)> {
        let mut tx = self.pool.begin().await?;

        let thread_id: i64 = sqlx::query(
            "INSERT INTO threads (board_tag, subject, created_at) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&thread.board_tag)
        .bind(&thread.subject)
        .bind(thread.created_at)
        .fetch_one(&mut *tx)
        .await?
        .try_get("id")?;

        let post_id: i64 = sqlx::query(
            "INSERT INTO posts (thread_id, name, content, filename, email, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(thread_id)
        .bind(&opening_post.name)
        .bind(&opening_post.content)
        .bind(&opening_post.filename)
        .bind(&opening_post.email)
        .bind(opening_post.created_at)
        .fetch_one(&mut *tx)
        .await?
        .try_get("id")?;

        tx.commit().await?;

        Ok((thread.into_thread(thread_id), opening_post.into_post(post_id, thread_id)))
    }

    async fn list_posts(&self, thread_id: i64) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT id, thread_id, name, content, filename, email, created_at \
             FROM posts WHERE thread_id = $1 ORDER BY id",
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(post_from_row).collect::<Result<_, _>>()?)
    }
}
