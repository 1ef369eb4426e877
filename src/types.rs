//! Error types for the mirror layer
//!
//! These errors never cross the public API boundary: the supervisor
//! collapses them into "not connected" and the sync service collapses
//! them into `false` / `None` / empty results, logging as it goes.

use thiserror::Error;

/// Internal error taxonomy for mirror operations
#[derive(Debug, Error)]
pub enum AnnexError {
    /// Connection settings could not be resolved
    #[error("Configuration error: {0}")]
    Config(String),

    /// Driver or network failure talking to the document store
    #[error("Database error: {0}")]
    Database(String),

    /// A snapshot could not be serialized into a document
    #[error("Mapping error: {0}")]
    Mapping(String),
}

pub type Result<T> = std::result::Result<T, AnnexError>;
