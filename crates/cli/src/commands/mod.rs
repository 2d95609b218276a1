//! Subcommand implementations.
//!
//! Every command works directly on the files under the data directory, through
//! the same repositories the server uses.

pub mod seed;
pub mod transfer;
pub mod user;

use std::path::PathBuf;

use thiserror::Error;

use delivery_tracker_admin::config::AdminConfig;
use delivery_tracker_admin::db::RepositoryError;
use delivery_tracker_admin::services::{AuthError, ExportError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable or input is missing.
    #[error("missing input: {0}")]
    MissingInput(&'static str),

    /// File could not be read or written.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Seed file is not valid YAML for a delivery list.
    #[error("invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Input rows failed validation.
    #[error("{0} invalid row(s); nothing was written")]
    Invalid(usize),

    /// Output file extension is not one we can write.
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Local configuration from `TRACKER_DATA_DIR` and `TRACKER_USERS_FILE`.
///
/// Unlike the server this needs no base URL, so it never fails.
pub fn local_config() -> AdminConfig {
    dotenvy::dotenv().ok();

    let data_dir = std::env::var("TRACKER_DATA_DIR").unwrap_or_else(|_| "./data".to_owned());
    let mut config = AdminConfig::local(data_dir);
    if let Ok(users_file) = std::env::var("TRACKER_USERS_FILE") {
        config.users_file = PathBuf::from(users_file);
    }

    tracing::debug!(data_dir = %config.data_dir.display(), "Using data directory");
    config
}
