//! Account mirror schema
//!
//! Denormalized view of one account, keyed by the primary store's
//! identifier. Psychologists embed their doctor profile with resolved
//! office fields; a psychologist whose profile is still missing is
//! marked explicitly so partially-onboarded accounts stay queryable.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MirrorSchema};
use crate::model::{AccountSnapshot, DoctorSnapshot, OfficeSnapshot, Role};

/// Collection name for account documents
pub const ACCOUNT_COLLECTION: &str = "accounts";

/// Denormalized office fields embedded in a doctor profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficeDoc {
    /// Primary-store office identifier
    pub primary_office_id: i64,
    pub name: String,
    pub address: String,
    pub phone: String,
}

impl OfficeDoc {
    fn from_snapshot(office: &OfficeSnapshot) -> Self {
        Self {
            primary_office_id: office.id,
            name: office.name.clone(),
            address: office.address.clone(),
            phone: office.phone.clone(),
        }
    }
}

/// Embedded doctor profile for psychologist accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfileDoc {
    /// Primary-store doctor identifier
    pub primary_doctor_id: i64,
    pub specialty: String,
    pub specialty_display: String,
    /// Office assignment, denormalized
    pub office: OfficeDoc,
}

impl DoctorProfileDoc {
    fn from_snapshot(doctor: &DoctorSnapshot) -> Self {
        Self {
            primary_doctor_id: doctor.id,
            specialty: doctor.specialty.code().to_string(),
            specialty_display: doctor.specialty.label().to_string(),
            office: OfficeDoc::from_snapshot(&doctor.office),
        }
    }
}

/// Account document stored in the mirror
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDocument {
    /// MongoDB document ID
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<ObjectId>,

    /// Immutable identifier from the primary store (natural key)
    pub primary_id: i64,

    pub name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub age: i32,

    /// Gender storage code plus display label
    pub gender: String,
    pub gender_display: String,

    pub phone: String,

    /// Role storage code plus display label
    pub role: String,
    pub role_display: String,

    /// Doctor profile; explicit null for patients and for psychologists
    /// that have not completed onboarding
    pub doctor_profile: Option<DoctorProfileDoc>,

    /// True only for a psychologist whose profile is still missing.
    /// Always written, so a later complete save overwrites a stale marker.
    pub doctor_profile_incomplete: bool,

    /// Counter for tracking document updates
    pub sync_version: i32,

    /// Stamped once by the insert path; the mapper never sets it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    /// Restamped on every mapping
    pub updated_at: DateTime,
}

impl AccountDocument {
    /// Map a fully-hydrated account snapshot into its mirror document
    pub fn from_snapshot(snapshot: &AccountSnapshot) -> Self {
        let doctor_profile = snapshot
            .doctor_profile
            .as_ref()
            .map(DoctorProfileDoc::from_snapshot);
        let doctor_profile_incomplete =
            snapshot.role == Role::Psychologist && doctor_profile.is_none();

        Self {
            mongo_id: None,
            primary_id: snapshot.id,
            name: snapshot.name.clone(),
            last_name: snapshot.last_name.clone(),
            full_name: snapshot.full_name(),
            email: snapshot.email.clone(),
            age: snapshot.age as i32,
            gender: snapshot.gender.code().to_string(),
            gender_display: snapshot.gender.label().to_string(),
            phone: snapshot.phone.clone(),
            role: snapshot.role.code().to_string(),
            role_display: snapshot.role.label().to_string(),
            doctor_profile,
            doctor_profile_incomplete,
            sync_version: 1,
            created_at: None,
            updated_at: DateTime::now(),
        }
    }
}

impl IntoIndexes for AccountDocument {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One document per primary entity
            (
                doc! { "primary_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("primary_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .name("email_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MirrorSchema for AccountDocument {
    const COLLECTION: &'static str = ACCOUNT_COLLECTION;

    fn primary_id(&self) -> i64 {
        self.primary_id
    }

    fn search_filter(query: &str) -> Document {
        doc! {
            "$or": [
                { "name": { "$regex": query, "$options": "i" } },
                { "last_name": { "$regex": query, "$options": "i" } },
                { "email": { "$regex": query, "$options": "i" } },
                { "full_name": { "$regex": query, "$options": "i" } },
            ]
        }
    }
}
