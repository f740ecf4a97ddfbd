//! Thread creation: the only write path altchan exposes.

use std::sync::Arc;

use ac_core::{AppError, BoardRepo, MediaStore, NewPost, NewThread, Post, Result, Thread};
use anyhow::Context;
use chrono::Utc;

use crate::submission::{fresh_filename, PostingRules, ThreadSubmission};

pub struct ThreadService {
    repo: Arc<dyn BoardRepo>,
    media: Arc<dyn MediaStore>,
    rules: PostingRules,
}

impl ThreadService {
    pub fn new(repo: Arc<dyn BoardRepo>, media: Arc<dyn MediaStore>, rules: PostingRules) -> Self {
        Self { repo, media, rules }
    }

    pub fn rules(&self) -> &PostingRules {
        &self.rules
    }

    /// Validates a submission and starts a new thread on `board_tag`.
    ///
    /// The upload is written before the database rows so a post never names
    /// a file that is missing. If the rows cannot be written the file is
    /// removed again.
    #[tracing::instrument(skip(self, submission), fields(board = %board_tag))]
    pub async fn submit_thread(&self, board_tag: &str, submission: ThreadSubmission) -> Result<(Thread, Post)> {
        let valid = self.rules.validate_thread(submission).map_err(|errors| {
            tracing::debug!(count = errors.len(), "submission rejected");
            AppError::Rejected(errors.iter().map(ToString::to_string).collect())
        })?;

        let board = self
            .repo
            .get_board(board_tag)
            .await?
            .ok_or_else(|| AppError::NotFound("board", format!("/{board_tag}/")))?;

        let now = Utc::now();
        let filename = fresh_filename(now, &valid.extension);

        self.media
            .save_upload(&filename, valid.upload.data)
            .await
            .with_context(|| format!("saving upload {filename}"))?;

        let thread = NewThread {
            board_tag: board.tag,
            subject: valid.subject,
            created_at: now,
        };
        let post = NewPost {
            name: valid.name,
            content: valid.message,
            filename: Some(filename.clone()),
            email: valid.email,
            created_at: now,
        };

        match self.repo.create_thread(thread, post).await {
            Ok((thread, post)) => {
                tracing::info!(thread_id = thread.id, file = %filename, "thread created");
                Ok((thread, post))
            }
            Err(err) => {
                if let Err(cleanup) = self.media.remove_upload(&filename).await {
                    tracing::error!(file = %filename, error = %cleanup, "could not remove orphaned upload");
                }
                Err(err.context("persisting thread").into())
            }
        }
    }
}
