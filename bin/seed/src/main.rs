//! Prepares the database: applies migrations and upserts the boards listed
//! in the configuration. With `--reset` every table is dropped first.

use ac_config::Settings;
use ac_core::{Board, BoardRepo};
use ac_db_postgres::{PgBoardRepo, PgConnectOptions};
use anyhow::Context;
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let reset = match std::env::args().nth(1).as_deref() {
        None => false,
        Some("--reset") => true,
        Some(other) => anyhow::bail!("unknown argument {other:?}; usage: seed [--reset]"),
    };

    let settings = Settings::load().context("failed to load configuration")?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db = &settings.database;
    let options = PgConnectOptions::new()
        .host(&db.host)
        .port(db.port)
        .username(&db.username)
        .password(db.password.expose_secret())
        .database(&db.database);
    let repo = PgBoardRepo::connect_with(options, 1)
        .await
        .with_context(|| format!("cannot connect to postgres at {}:{}", db.host, db.port))?;

    if reset {
        repo.reset_schema().await.context("failed to reset schema")?;
    } else {
        repo.migrate().await.context("failed to apply migrations")?;
    }

    for seed in &settings.boards {
        repo.upsert_board(Board {
            tag: seed.tag.clone(),
            name: seed.name.clone(),
            nsfw: seed.nsfw,
        })
        .await
        .with_context(|| format!("cannot create board /{}/", seed.tag))?;
        tracing::info!(tag = %seed.tag, name = %seed.name, "board ready");
    }

    tracing::info!(boards = settings.boards.len(), reset, "seeding complete");
    Ok(())
}
