//! # ac-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the services.

use std::sync::Arc;

use ac_core::{AppError, MediaStore};
use ac_services::{BoardService, ThreadService};
use ac_ui::{BoardTemplate, FormLimits, IndexTemplate, ThreadView};
use askama::Template;
use axum::extract::{Multipart, Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::error::{ApiError, ApiResult};
use crate::flash::FlashSigner;
use crate::form;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub boards: Arc<BoardService>,
    pub threads: Arc<ThreadService>,
    pub media: Arc<dyn MediaStore>,
    pub flash: FlashSigner,
}

impl AppState {
    fn form_limits(&self) -> FormLimits {
        let rules = self.threads.rules();
        FormLimits {
            default_name: rules.default_name.clone(),
            subject: rules.max_subject_length,
            name: rules.max_name_length,
            email: rules.max_email_length,
            message: rules.max_message_length,
            accept: FormLimits::accept_list(&rules.allowed_extensions),
        }
    }
}

/// Renders the board index at "/".
pub async fn index(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let boards = state.boards.list_boards().await?;
    let html = IndexTemplate {
        title: "altchan".to_string(),
        boards,
    }
    .render()?;

    Ok(Html(html))
}

/// Renders a board with every thread and post on it (e.g., /boards/b/).
///
/// Pending flash messages are consumed whatever the outcome, so a 404 also
/// clears them.
pub async fn board_page(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), (CookieJar, ApiError)> {
    let (jar, flashes) = state.flash.take(jar);
    match render_board(&state, &tag, flashes).await {
        Ok(html) => Ok((jar, html)),
        Err(err) => Err((jar, err)),
    }
}

async fn render_board(state: &AppState, tag: &str, flashes: Vec<String>) -> ApiResult<Html<String>> {
    let page = state.boards.board_page(tag).await?;

    let threads = page
        .threads
        .iter()
        .map(|thread| ThreadView::build(thread, |file| state.media.get_url(file)))
        .collect();

    let html = BoardTemplate {
        title: format!("/{}/ - {}", page.board.tag, page.board.name),
        board: &page.board,
        threads,
        flashes,
        limits: state.form_limits(),
    }
    .render()?;

    Ok(Html(html))
}

/// Starts a new thread. Validation failures are flashed and the poster is
/// sent back to the board either way.
pub async fn submit_thread(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    jar: CookieJar,
    multipart: Multipart,
) -> ApiResult<Response> {
    let submission = form::read_thread_submission(multipart).await?;
    let board_url = format!("/boards/{tag}/");

    match state.threads.submit_thread(&tag, submission).await {
        Ok(_) => Ok(Redirect::to(&board_url).into_response()),
        Err(AppError::Rejected(messages)) => {
            let jar = state
                .flash
                .set(jar, &messages)
                .map_err(|err| AppError::Internal(err.into()))?;
            Ok((jar, Redirect::to(&board_url)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// Placeholder for the single-thread view.
pub async fn view_thread(Path((tag, thread)): Path<(String, String)>) -> String {
    format!("Visiting thread {thread} on board {tag}")
}

/// Placeholder for reply submission.
pub async fn submit_reply(Path((tag, thread)): Path<(String, String)>) -> String {
    format!("Submitting post to thread {thread} on board {tag}")
}
