//! MongoDB connection supervision
//!
//! Owns the lifecycle of the connection to the document store: lazy
//! first connection, liveness probing, transparent reconnection, and
//! graceful shutdown. Every failure at this boundary is caught, logged,
//! and collapsed into "not connected" - nothing here is allowed to
//! escape to a caller as an error.

use bson::{doc, Document};
use mongodb::options::{ClientOptions, Credential, IndexOptions};
use mongodb::{Client, Database};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::{AuthMode, MongoSettings};
use crate::types::{AnnexError, Result};

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Binds a document type to its collection name, natural key, and
/// text-search fields
pub trait MirrorSchema:
    Serialize + DeserializeOwned + IntoIndexes + Unpin + Send + Sync
{
    /// Collection this schema is stored in
    const COLLECTION: &'static str;

    /// Immutable identifier carried over from the primary store
    fn primary_id(&self) -> i64;

    /// Case-insensitive substring filter across the schema's text fields
    fn search_filter(query: &str) -> Document;
}

/// Connection lifecycle state, shared by all mirror operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No attempt yet, or the last attempt failed
    Disconnected,
    /// Handle verified live by the last probe
    Connected,
    /// Handle existed but the last probe failed; reconnects on next use
    Degraded,
}

struct Inner {
    client: Option<Client>,
    state: ConnectionState,
}

/// Supervises the process-wide document store connection
///
/// Constructed explicitly at startup and shared behind an `Arc`; all
/// accessors are safe to call from concurrent requests. The handle is
/// cloned out before any network round trip, so no lock is ever held
/// across I/O. Redundant concurrent reconnects are tolerated; the last
/// installed handle wins.
pub struct MongoSupervisor {
    settings: MongoSettings,
    inner: RwLock<Inner>,
}

impl MongoSupervisor {
    /// Create a supervisor; no connection is attempted until first use
    pub fn new(settings: MongoSettings) -> Self {
        Self {
            settings,
            inner: RwLock::new(Inner {
                client: None,
                state: ConnectionState::Disconnected,
            }),
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> ConnectionState {
        self.inner.read().await.state
    }

    /// Database name this supervisor serves
    pub fn database_name(&self) -> &str {
        &self.settings.database
    }

    async fn build_client(&self) -> Result<Client> {
        let mut options = ClientOptions::parse(&self.settings.uri)
            .await
            .map_err(|e| AnnexError::Config(format!("Invalid MongoDB URI: {}", e)))?;

        // Bound server selection and handshakes so no operation can hang
        options.server_selection_timeout = Some(self.settings.server_selection_timeout);
        options.connect_timeout = Some(self.settings.server_selection_timeout);

        if let AuthMode::Credentials { username, password } = &self.settings.auth {
            options.credential = Some(
                Credential::builder()
                    .username(username.clone())
                    .password(password.clone())
                    .source("admin".to_string())
                    .build(),
            );
        }

        Client::with_options(options)
            .map_err(|e| AnnexError::Database(format!("Failed to create MongoDB client: {}", e)))
    }

    /// Attempt to establish and verify a connection
    ///
    /// Returns whether the store is reachable afterwards. Never errors:
    /// configuration and connectivity failures are logged and leave the
    /// supervisor `Disconnected`.
    pub async fn connect(&self) -> bool {
        let client = match self.build_client().await {
            Ok(client) => client,
            Err(e) => {
                error!("Document store client setup failed: {}", e);
                self.clear().await;
                return false;
            }
        };

        // Verify the handle with a liveness probe before publishing it
        match client
            .database(&self.settings.database)
            .run_command(doc! { "ping": 1 })
            .await
        {
            Ok(_) => {
                let mut guard = self.inner.write().await;
                guard.client = Some(client);
                guard.state = ConnectionState::Connected;
                info!(
                    "Connected to document store database '{}'",
                    self.settings.database
                );
                true
            }
            Err(e) => {
                warn!(
                    "Document store connection failed: {}. Operating without mirror.",
                    e
                );
                self.clear().await;
                false
            }
        }
    }

    /// Get a handle to the mirror database, connecting lazily
    ///
    /// Returns `None` when the store is unreachable.
    pub async fn database(&self) -> Option<Database> {
        let missing = self.inner.read().await.client.is_none();
        if missing {
            self.connect().await;
        }

        let guard = self.inner.read().await;
        guard
            .client
            .as_ref()
            .map(|client| client.database(&self.settings.database))
    }

    /// Re-probe the connection, reconnecting once if the probe fails
    ///
    /// This is the sole automatic-reconnection path; every mirror
    /// operation re-derives liveness through here.
    pub async fn is_alive(&self) -> bool {
        let client = self.inner.read().await.client.clone();

        let Some(client) = client else {
            return self.connect().await;
        };

        match client
            .database(&self.settings.database)
            .run_command(doc! { "ping": 1 })
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    "Document store connection lost: {}. Attempting reconnection...",
                    e
                );
                {
                    let mut guard = self.inner.write().await;
                    guard.client = None;
                    guard.state = ConnectionState::Degraded;
                }
                self.connect().await
            }
        }
    }

    /// Release the handle and reset to `Disconnected`; safe to call twice
    pub async fn shutdown(&self) {
        let client = {
            let mut guard = self.inner.write().await;
            guard.state = ConnectionState::Disconnected;
            guard.client.take()
        };

        if let Some(client) = client {
            client.shutdown().await;
            info!("Document store connection closed");
        }
    }

    async fn clear(&self) {
        let mut guard = self.inner.write().await;
        guard.client = None;
        guard.state = ConnectionState::Disconnected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable_settings() -> MongoSettings {
        // Nothing listens on port 9; the short timeout keeps tests fast
        MongoSettings {
            uri: "mongodb://127.0.0.1:9".to_string(),
            database: "annex_test".to_string(),
            auth: AuthMode::Anonymous,
            server_selection_timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_starts_disconnected() {
        let supervisor = MongoSupervisor::new(unreachable_settings());
        assert_eq!(supervisor.state().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_unreachable_store_reports_not_alive() {
        let supervisor = MongoSupervisor::new(unreachable_settings());
        assert!(!supervisor.is_alive().await);
        assert_eq!(supervisor.state().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_database_handle_is_none_when_unreachable() {
        let supervisor = MongoSupervisor::new(unreachable_settings());
        assert!(supervisor.database().await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_uri_collapses_to_disconnected() {
        let settings = MongoSettings {
            uri: "not-a-mongodb-uri".to_string(),
            ..unreachable_settings()
        };
        let supervisor = MongoSupervisor::new(settings);
        assert!(!supervisor.connect().await);
        assert_eq!(supervisor.state().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let supervisor = MongoSupervisor::new(unreachable_settings());
        supervisor.shutdown().await;
        supervisor.shutdown().await;
        assert_eq!(supervisor.state().await, ConnectionState::Disconnected);
    }
}
