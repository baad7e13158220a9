//! Migration Errors
//!
//! Every failure is fatal for the run. Not-found on the bare-name lookup is
//! not an error and never reaches this type.

use thiserror::Error;

/// Errors that can occur during a migration run
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Connecting to or querying the records database failed
    #[error("database error during {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// A Route 53 call (or building its request) failed
    #[error("DNS provider error during {operation}: {message}")]
    Provider {
        operation: &'static str,
        message: String,
    },

    /// The hosted zone lookup returned no zone
    #[error("hosted zone not found: {0}")]
    HostedZoneNotFound(String),

    /// A selected row does not carry the escaped wildcard marker
    #[error("record name has no wildcard marker: {0}")]
    MalformedWildcard(String),

    /// The data source name could not be parsed
    #[error("invalid data source name: {0}")]
    InvalidDsn(String),

    /// A required flag (or its environment variable) was not supplied
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),

    /// Only one of the access key id and secret access key was supplied
    #[error("incomplete AWS credentials: {0} is set but {1} is not")]
    IncompleteCredentials(&'static str, &'static str),

    /// The process is not running with root privilege
    #[error("{0}: need to be root")]
    NotRoot(String),
}

impl MigrateError {
    pub fn database(operation: &'static str, source: sqlx::Error) -> Self {
        MigrateError::Database { operation, source }
    }

    pub fn provider(operation: &'static str, err: impl std::fmt::Display) -> Self {
        MigrateError::Provider {
            operation,
            message: err.to_string(),
        }
    }
}
