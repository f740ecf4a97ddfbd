//! # ac-api
//!
//! The web routing and orchestration layer for altchan.

pub mod error;
pub mod flash;
pub mod form;
pub mod handlers;
pub mod middleware;

use std::path::PathBuf;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

pub use error::{ApiError, ApiResult};
pub use flash::FlashSigner;
pub use handlers::AppState;

/// Where uploads are stored, where they are served from, and how large a
/// submission may be.
#[derive(Debug, Clone)]
pub struct UploadRoute {
    pub directory: PathBuf,
    pub url_prefix: String,
    pub max_bytes: usize,
}

/// Builds the complete application: routes, static uploads and middleware.
pub fn router(state: AppState, uploads: &UploadRoute) -> Router {
    let routes = Router::new()
        .route("/", get(handlers::index))
        .route("/boards/{tag}/", get(handlers::board_page))
        .route("/boards/{tag}/{thread}/", get(handlers::view_thread))
        .route("/submit/{tag}/", post(handlers::submit_thread))
        .route(
            "/submit/{tag}/{thread}",
            get(handlers::submit_reply).post(handlers::submit_reply),
        )
        .nest_service(&uploads.url_prefix, ServeDir::new(&uploads.directory))
        .layer(DefaultBodyLimit::max(uploads.max_bytes))
        .with_state(state);

    middleware::standard_middleware(routes)
}
