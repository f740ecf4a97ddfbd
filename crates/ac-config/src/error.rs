//! # ConfigError
//!
//! Everything that can stop the configuration from loading. All of these are
//! fatal at startup.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A field the deployment must provide is absent (e.g. `database.host`).
    #[error("{0} is required in the configuration")]
    MissingField(&'static str),

    /// A field is present but unusable.
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },

    /// The underlying file or environment source could not be read or parsed.
    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
