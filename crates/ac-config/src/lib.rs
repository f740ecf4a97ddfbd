//! # ac-config
//!
//! Deployment settings for altchan. Settings are read once at startup from a
//! JSON document layered under `ALTCHAN__*` environment variables, validated,
//! and then handed to whatever needs them. Nothing here is global.

pub mod error;

pub use error::{ConfigError, Result};

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the settings file location.
pub const CONFIG_PATH_VAR: &str = "ALTCHAN_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "altchan.json";

const MAX_TAG_LENGTH: usize = 8;
const MAX_BOARD_NAME_LENGTH: usize = 64;

/// Fully validated settings.
#[derive(Debug)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    /// Signs flash-message cookies.
    pub secret_key: SecretString,
    pub posting: PostingSettings,
    pub uploads: UploadSettings,
    pub logging: LoggingSettings,
    /// Boards created by the seed tool.
    pub boards: Vec<BoardSeed>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// PostgreSQL connection parameters. Every field except `max_connections`
/// must be present in the configuration.
#[derive(Debug)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub database: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostingSettings {
    pub default_name: String,
    pub max_subject_length: usize,
    pub max_name_length: usize,
    pub max_email_length: usize,
    pub max_message_length: usize,
    pub allowed_extensions: Vec<String>,
}

impl Default for PostingSettings {
    fn default() -> Self {
        Self {
            default_name: "Anonymous".to_string(),
            max_subject_length: 60,
            max_name_length: 30,
            max_email_length: 30,
            max_message_length: 10_000,
            allowed_extensions: ["jpg", "jpeg", "png", "gif"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Directory uploaded files are written to.
    pub directory: PathBuf,
    /// Public path the directory is served under.
    pub url_prefix: String,
    /// Largest accepted request body, in bytes.
    pub max_bytes: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("images"),
            url_prefix: "/images".to_string(),
            max_bytes: 8 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardSeed {
    pub tag: String,
    pub name: String,
    #[serde(default)]
    pub nsfw: bool,
}

/// Shape of the document before validation. Required fields are optional
/// here so their absence can be reported by name.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    server: ServerSettings,
    database: RawDatabase,
    secret_key: Option<String>,
    posting: PostingSettings,
    uploads: UploadSettings,
    logging: LoggingSettings,
    boards: Vec<BoardSeed>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDatabase {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    database: Option<String>,
    max_connections: Option<u32>,
}

impl Settings {
    /// Loads settings from `$ALTCHAN_CONFIG` (or `altchan.json`), with
    /// `ALTCHAN__SECTION__KEY` environment variables taking precedence.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading configuration");
        let builder = config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Json).required(true))
            .add_source(
                Environment::with_prefix("ALTCHAN")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::build(builder)
    }

    /// Parses a JSON document without consulting the environment.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::build(config::Config::builder().add_source(File::from_str(json, FileFormat::Json)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let raw: RawSettings = builder.build()?.try_deserialize()?;
        raw.validate()
    }
}

impl RawSettings {
    fn validate(self) -> Result<Settings> {
        let database = self.database.validate()?;

        let secret_key = self
            .secret_key
            .ok_or(ConfigError::MissingField("secret_key"))?;
        if secret_key.trim().is_empty() {
            return Err(invalid("secret_key", "must not be empty"));
        }

        let posting = self.posting.validate()?;

        let mut uploads = self.uploads;
        uploads.url_prefix = uploads.url_prefix.trim_end_matches('/').to_string();
        if !uploads.url_prefix.starts_with('/') {
            return Err(invalid("uploads.url_prefix", "must start with '/' and not be the root"));
        }

        for board in &self.boards {
            let len = board.tag.chars().count();
            if len == 0 || len > MAX_TAG_LENGTH || board.tag.contains('/') {
                return Err(invalid(
                    "boards.tag",
                    &format!("{:?} must be 1-{MAX_TAG_LENGTH} characters without '/'", board.tag),
                ));
            }
            if board.name.chars().count() > MAX_BOARD_NAME_LENGTH {
                return Err(invalid(
                    "boards.name",
                    &format!("{:?} exceeds {MAX_BOARD_NAME_LENGTH} characters", board.name),
                ));
            }
        }

        Ok(Settings {
            server: self.server,
            database,
            secret_key: SecretString::from(secret_key),
            posting,
            uploads,
            logging: self.logging,
            boards: self.boards,
        })
    }
}

impl RawDatabase {
    fn validate(self) -> Result<DatabaseSettings> {
        // Checked in this order so the first missing field is the one reported.
        let host = self.host.ok_or(ConfigError::MissingField("database.host"))?;
        let port = self.port.ok_or(ConfigError::MissingField("database.port"))?;
        let username = self
            .username
            .ok_or(ConfigError::MissingField("database.username"))?;
        let password = self
            .password
            .ok_or(ConfigError::MissingField("database.password"))?;
        let database = self
            .database
            .ok_or(ConfigError::MissingField("database.database"))?;

        Ok(DatabaseSettings {
            host,
            port,
            username,
            password: SecretString::from(password),
            database,
            max_connections: self.max_connections.unwrap_or(5),
        })
    }
}

impl PostingSettings {
    fn validate(mut self) -> Result<Self> {
        let limits = [
            ("posting.max_subject_length", self.max_subject_length),
            ("posting.max_name_length", self.max_name_length),
            ("posting.max_email_length", self.max_email_length),
            ("posting.max_message_length", self.max_message_length),
        ];
        for (field, value) in limits {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero"));
            }
        }

        self.allowed_extensions = self
            .allowed_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        if self.allowed_extensions.is_empty() {
            return Err(invalid("posting.allowed_extensions", "must list at least one extension"));
        }

        Ok(self)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
