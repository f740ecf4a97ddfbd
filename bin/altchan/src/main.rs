//! # altchan
//!
//! Assembles the board server from the configured backends and serves it.

use std::sync::Arc;

use ac_api::{router, AppState, FlashSigner, UploadRoute};
use ac_config::{LogFormat, LoggingSettings, Settings};
use ac_core::{BoardRepo, MediaStore};
use ac_services::{BoardService, PostingRules, ThreadService};
use ac_storage_local::LocalMediaStore;
use anyhow::Context;
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[cfg(not(any(feature = "db-postgres", feature = "db-memory")))]
compile_error!("enable one of the `db-postgres` or `db-memory` features");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load configuration")?;
    init_tracing(&settings.logging);

    let repo = open_repo(&settings).await?;

    let media = LocalMediaStore::new(
        settings.uploads.directory.clone(),
        settings.uploads.url_prefix.clone(),
    );
    media
        .init()
        .await
        .with_context(|| format!("cannot prepare {}", settings.uploads.directory.display()))?;
    let media: Arc<dyn MediaStore> = Arc::new(media);

    let posting = &settings.posting;
    let rules = PostingRules {
        default_name: posting.default_name.clone(),
        max_subject_length: posting.max_subject_length,
        max_name_length: posting.max_name_length,
        max_email_length: posting.max_email_length,
        max_message_length: posting.max_message_length,
        allowed_extensions: posting.allowed_extensions.clone(),
    };

    let flash = FlashSigner::new(settings.secret_key.expose_secret().as_bytes())
        .map_err(|err| anyhow::anyhow!("unusable secret_key: {err}"))?;

    let state = AppState {
        boards: Arc::new(BoardService::new(repo.clone())),
        threads: Arc::new(ThreadService::new(repo, media.clone(), rules)),
        media,
        flash,
    };
    let app = router(
        state,
        &UploadRoute {
            directory: settings.uploads.directory.clone(),
            url_prefix: settings.uploads.url_prefix.clone(),
            max_bytes: settings.uploads.max_bytes,
        },
    );

    let address = settings.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("cannot bind {address}"))?;
    tracing::info!(%address, "altchan listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("altchan stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured filter when it is set.
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

#[cfg(feature = "db-postgres")]
async fn open_repo(settings: &Settings) -> anyhow::Result<Arc<dyn BoardRepo>> {
    use ac_db_postgres::{PgBoardRepo, PgConnectOptions};

    let db = &settings.database;
    let options = PgConnectOptions::new()
        .host(&db.host)
        .port(db.port)
        .username(&db.username)
        .password(db.password.expose_secret())
        .database(&db.database);

    let repo = PgBoardRepo::connect_with(options, db.max_connections)
        .await
        .with_context(|| format!("cannot connect to postgres at {}:{}", db.host, db.port))?;
    repo.migrate().await.context("failed to apply migrations")?;
    tracing::info!(host = %db.host, database = %db.database, "connected to postgres");

    Ok(Arc::new(repo))
}

#[cfg(all(feature = "db-memory", not(feature = "db-postgres")))]
async fn open_repo(settings: &Settings) -> anyhow::Result<Arc<dyn BoardRepo>> {
    use ac_core::Board;
    use ac_db_memory::MemoryBoardRepo;

    let repo = MemoryBoardRepo::new();
    for seed in &settings.boards {
        repo.upsert_board(Board {
            tag: seed.tag.clone(),
            name: seed.name.clone(),
            nsfw: seed.nsfw,
        })
        .await?;
    }
    tracing::warn!(boards = settings.boards.len(), "using in-memory storage, posts are lost on exit");

    Ok(Arc::new(repo))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
