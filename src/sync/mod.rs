//! Mirror synchronization service
//!
//! The single entry point callers use after committing to the primary
//! store. Composes the connection supervisor and the document mappers
//! into save, point lookup, search, and consistency verification.
//!
//! Every operation has a total, non-throwing contract: outages and
//! operation failures collapse into `false` / `None` / empty results and
//! are only observable through logs. The caller's primary-store commit
//! is already final by the time any of these run; nothing here may
//! block or fail it.

use std::sync::Arc;

use async_trait::async_trait;
use bson::{doc, DateTime};
use futures_util::StreamExt;
use mongodb::{Collection, Database, IndexModel};
use tracing::{debug, error, info, warn};

use crate::db::mongo::{MirrorSchema, MongoSupervisor};
use crate::model::{AccountSnapshot, AppointmentSnapshot};
use crate::projection::{AccountDocument, AppointmentDocument};
use crate::types::{AnnexError, Result};

/// Cap on the number of documents a search returns
const SEARCH_RESULT_LIMIT: i64 = 50;

/// Caller-supplied accessor for primary-store lookups
///
/// Only `verify_*` consults the primary store, and it borrows this
/// dependency per call rather than owning it.
#[async_trait]
pub trait PrimarySource: Send + Sync {
    async fn load_account(&self, primary_id: i64) -> anyhow::Result<Option<AccountSnapshot>>;

    async fn load_appointment(
        &self,
        primary_id: i64,
    ) -> anyhow::Result<Option<AppointmentSnapshot>>;
}

/// Service layer for mirror operations
pub struct SyncService {
    supervisor: Arc<MongoSupervisor>,
}

impl SyncService {
    /// Create a service on top of an existing supervisor
    pub fn new(supervisor: Arc<MongoSupervisor>) -> Self {
        Self { supervisor }
    }

    /// Save an account snapshot to the mirror
    ///
    /// Upserts by `primary_id`: replaying the same snapshot any number
    /// of times yields the same document, apart from `updated_at`.
    /// Returns `true` only if the write completed.
    pub async fn save_account(&self, snapshot: &AccountSnapshot) -> bool {
        if !self.supervisor.is_alive().await {
            warn!("Document store not connected. Skipping account save.");
            return false;
        }

        let document = AccountDocument::from_snapshot(snapshot);
        match self.upsert(&document).await {
            Ok(action) => {
                info!(
                    "Account {} in mirror: primary_id={}, email={}",
                    action, snapshot.id, snapshot.email
                );
                true
            }
            Err(e) => {
                error!(
                    "Failed to save account to mirror: primary_id={}, error={}",
                    snapshot.id, e
                );
                false
            }
        }
    }

    /// Save an appointment snapshot to the mirror
    pub async fn save_appointment(&self, snapshot: &AppointmentSnapshot) -> bool {
        if !self.supervisor.is_alive().await {
            warn!("Document store not connected. Skipping appointment save.");
            return false;
        }

        let document = AppointmentDocument::from_snapshot(snapshot);
        match self.upsert(&document).await {
            Ok(action) => {
                info!(
                    "Appointment {} in mirror: primary_id={}",
                    action, snapshot.id
                );
                true
            }
            Err(e) => {
                error!(
                    "Failed to save appointment to mirror: primary_id={}, error={}",
                    snapshot.id, e
                );
                false
            }
        }
    }

    /// Retrieve an account document by primary identifier
    pub async fn get_account(&self, primary_id: i64) -> Option<AccountDocument> {
        self.get::<AccountDocument>(primary_id).await
    }

    /// Retrieve an appointment document by primary identifier
    pub async fn get_appointment(&self, primary_id: i64) -> Option<AppointmentDocument> {
        self.get::<AppointmentDocument>(primary_id).await
    }

    /// Search account documents by name or email
    pub async fn search_accounts(&self, query: &str) -> Vec<AccountDocument> {
        self.search::<AccountDocument>(query).await
    }

    /// Search appointment documents by either party's name or email
    pub async fn search_appointments(&self, query: &str) -> Vec<AppointmentDocument> {
        self.search::<AppointmentDocument>(query).await
    }

    /// Verify that an account's identity fields match between stores
    ///
    /// Diagnostic only; `false` means either side is missing or the
    /// stores disagree.
    pub async fn verify_account(&self, primary_id: i64, source: &dyn PrimarySource) -> bool {
        if !self.supervisor.is_alive().await {
            return false;
        }

        let snapshot = match source.load_account(primary_id).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!("Account missing from primary store: primary_id={}", primary_id);
                return false;
            }
            Err(e) => {
                error!(
                    "Consistency check could not load account: primary_id={}, error={}",
                    primary_id, e
                );
                return false;
            }
        };

        match self.get_account(primary_id).await {
            Some(document) => account_matches(&snapshot, &document),
            None => false,
        }
    }

    /// Verify that an appointment's party identities match between stores
    pub async fn verify_appointment(&self, primary_id: i64, source: &dyn PrimarySource) -> bool {
        if !self.supervisor.is_alive().await {
            return false;
        }

        let snapshot = match source.load_appointment(primary_id).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!(
                    "Appointment missing from primary store: primary_id={}",
                    primary_id
                );
                return false;
            }
            Err(e) => {
                error!(
                    "Consistency check could not load appointment: primary_id={}, error={}",
                    primary_id, e
                );
                return false;
            }
        };

        match self.get_appointment(primary_id).await {
            Some(document) => appointment_matches(&snapshot, &document),
            None => false,
        }
    }

    /// Apply the declared indexes for every mirror collection
    ///
    /// Best-effort startup bootstrap; failures are logged and the mirror
    /// keeps operating without them.
    pub async fn ensure_indexes(&self) -> bool {
        let Some(db) = self.supervisor.database().await else {
            warn!("Document store not connected. Skipping index bootstrap.");
            return false;
        };

        let accounts = apply_indexes::<AccountDocument>(&db).await;
        let appointments = apply_indexes::<AppointmentDocument>(&db).await;
        accounts && appointments
    }

    async fn collection<T: MirrorSchema>(&self) -> Result<Collection<T>> {
        let db = self.supervisor.database().await.ok_or_else(|| {
            AnnexError::Database("document store not connected".to_string())
        })?;
        Ok(db.collection::<T>(T::COLLECTION))
    }

    /// Upsert keyed by `primary_id`, leaving `created_at` untouched on
    /// existing documents. Returns which action the store took.
    async fn upsert<T: MirrorSchema>(&self, item: &T) -> Result<&'static str> {
        let collection = self.collection::<T>().await?;

        let mut body = bson::to_document(item)
            .map_err(|e| AnnexError::Mapping(format!("Failed to serialize document: {}", e)))?;
        // _id and created_at are owned by the storage layer
        body.remove("_id");
        body.remove("created_at");

        let result = collection
            .update_one(
                doc! { "primary_id": item.primary_id() },
                doc! {
                    "$set": body,
                    "$setOnInsert": { "created_at": DateTime::now() },
                },
            )
            .upsert(true)
            .await
            .map_err(|e| AnnexError::Database(format!("Upsert failed: {}", e)))?;

        Ok(if result.matched_count > 0 {
            "updated"
        } else {
            "created"
        })
    }

    async fn get<T: MirrorSchema>(&self, primary_id: i64) -> Option<T> {
        if !self.supervisor.is_alive().await {
            return None;
        }

        let collection = match self.collection::<T>().await {
            Ok(collection) => collection,
            Err(e) => {
                error!("Failed to open collection '{}': {}", T::COLLECTION, e);
                return None;
            }
        };

        match collection.find_one(doc! { "primary_id": primary_id }).await {
            Ok(Some(document)) => {
                debug!(
                    "Retrieved document from mirror: collection={}, primary_id={}",
                    T::COLLECTION,
                    primary_id
                );
                Some(document)
            }
            Ok(None) => {
                debug!(
                    "Document not found in mirror: collection={}, primary_id={}",
                    T::COLLECTION,
                    primary_id
                );
                None
            }
            Err(e) => {
                error!(
                    "Failed to retrieve document from mirror: collection={}, primary_id={}, error={}",
                    T::COLLECTION,
                    primary_id, e
                );
                None
            }
        }
    }

    async fn search<T: MirrorSchema>(&self, query: &str) -> Vec<T> {
        if !self.supervisor.is_alive().await {
            return Vec::new();
        }

        let collection = match self.collection::<T>().await {
            Ok(collection) => collection,
            Err(e) => {
                error!("Failed to open collection '{}': {}", T::COLLECTION, e);
                return Vec::new();
            }
        };

        let cursor = match collection
            .find(T::search_filter(query))
            .limit(SEARCH_RESULT_LIMIT)
            .await
        {
            Ok(cursor) => cursor,
            Err(e) => {
                error!(
                    "Failed to search mirror: collection={}, error={}",
                    T::COLLECTION,
                    e
                );
                return Vec::new();
            }
        };

        let results: Vec<T> = cursor
            .filter_map(|item| async {
                match item {
                    Ok(document) => Some(document),
                    Err(e) => {
                        error!("Error reading document: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        info!(
            "Search in '{}' returned {} results for query: {}",
            T::COLLECTION,
            results.len(),
            query
        );
        results
    }
}

/// Identity fields that must agree for an account to count as consistent
fn account_matches(snapshot: &AccountSnapshot, document: &AccountDocument) -> bool {
    document.email == snapshot.email
        && document.name == snapshot.name
        && document.last_name == snapshot.last_name
}

/// Identity fields that must agree for an appointment to count as consistent
fn appointment_matches(snapshot: &AppointmentSnapshot, document: &AppointmentDocument) -> bool {
    document.patient.email == snapshot.patient.email
        && document.patient.name == snapshot.patient.full_name()
        && document.psychologist.email == snapshot.psychologist.email
        && document.psychologist.name == snapshot.psychologist.full_name()
}

async fn apply_indexes<T: MirrorSchema>(db: &Database) -> bool {
    let indices = T::into_indices();
    if indices.is_empty() {
        return true;
    }

    let models: Vec<IndexModel> = indices
        .into_iter()
        .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
        .collect();

    match db.collection::<T>(T::COLLECTION).create_indexes(models).await {
        Ok(_) => {
            debug!("Indexes ensured for collection '{}'", T::COLLECTION);
            true
        }
        Err(e) => {
            warn!("Failed to ensure indexes for '{}': {}", T::COLLECTION, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthMode, MongoSettings};
    use crate::model::{Gender, PartySnapshot, Role};
    use std::time::Duration;

    fn unreachable_service() -> SyncService {
        let settings = MongoSettings {
            uri: "mongodb://127.0.0.1:9".to_string(),
            database: "annex_test".to_string(),
            auth: AuthMode::Anonymous,
            server_selection_timeout: Duration::from_millis(200),
        };
        SyncService::new(Arc::new(MongoSupervisor::new(settings)))
    }

    fn account_snapshot() -> AccountSnapshot {
        AccountSnapshot {
            id: 42,
            name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@x.com".to_string(),
            age: 41,
            gender: Gender::Female,
            phone: "555-0102".to_string(),
            role: Role::Psychologist,
            doctor_profile: None,
        }
    }

    struct StubPrimary;

    #[async_trait]
    impl PrimarySource for StubPrimary {
        async fn load_account(&self, _: i64) -> anyhow::Result<Option<AccountSnapshot>> {
            Ok(Some(account_snapshot()))
        }

        async fn load_appointment(
            &self,
            _: i64,
        ) -> anyhow::Result<Option<AppointmentSnapshot>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_save_returns_false_when_unreachable() {
        let service = unreachable_service();
        assert!(!service.save_account(&account_snapshot()).await);
    }

    #[tokio::test]
    async fn test_get_returns_none_when_unreachable() {
        let service = unreachable_service();
        assert!(service.get_account(42).await.is_none());
    }

    #[tokio::test]
    async fn test_search_returns_empty_when_unreachable() {
        let service = unreachable_service();
        assert!(service.search_accounts("jane").await.is_empty());
        assert!(service.search_appointments("jane").await.is_empty());
    }

    #[tokio::test]
    async fn test_verify_returns_false_when_unreachable() {
        let service = unreachable_service();
        assert!(!service.verify_account(42, &StubPrimary).await);
        assert!(!service.verify_appointment(11, &StubPrimary).await);
    }

    #[tokio::test]
    async fn test_ensure_indexes_reports_failure_when_unreachable() {
        let service = unreachable_service();
        assert!(!service.ensure_indexes().await);
    }

    #[test]
    fn test_account_match_detects_email_drift() {
        let snapshot = account_snapshot();
        let mut document = AccountDocument::from_snapshot(&snapshot);
        document.email = "b@x.com".to_string();
        assert!(!account_matches(&snapshot, &document));
    }

    #[test]
    fn test_account_match_accepts_identical_identity() {
        let snapshot = account_snapshot();
        let document = AccountDocument::from_snapshot(&snapshot);
        assert!(account_matches(&snapshot, &document));
    }

    #[test]
    fn test_appointment_match_compares_both_parties() {
        use chrono::{NaiveDate, NaiveTime};
        use crate::model::AppointmentStatus;

        let snapshot = AppointmentSnapshot {
            id: 11,
            patient: PartySnapshot {
                id: 7,
                name: "Ana".to_string(),
                last_name: "Silva".to_string(),
                email: "ana@x.com".to_string(),
            },
            psychologist: PartySnapshot {
                id: 42,
                name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                email: "jane@x.com".to_string(),
            },
            date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
            time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            status: AppointmentStatus::Scheduled,
            notes: String::new(),
        };

        let document = AppointmentDocument::from_snapshot(&snapshot);
        assert!(appointment_matches(&snapshot, &document));

        let mut drifted = document.clone();
        drifted.psychologist.email = "impostor@x.com".to_string();
        assert!(!appointment_matches(&snapshot, &drifted));
    }
}
