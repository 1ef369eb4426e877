//! Appointment mirror schema
//!
//! Denormalized view of one appointment with minimal identity for both
//! parties, so the mirror can answer list and search queries without
//! touching the primary store.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MirrorSchema};
use crate::model::{AppointmentSnapshot, PartySnapshot};

/// Collection name for appointment documents
pub const APPOINTMENT_COLLECTION: &str = "appointments";

/// Minimal denormalized identity of one side of an appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyDoc {
    /// Primary-store account identifier
    pub primary_id: i64,
    /// Display name
    pub name: String,
    pub email: String,
}

impl PartyDoc {
    fn from_snapshot(party: &PartySnapshot) -> Self {
        Self {
            primary_id: party.id,
            name: party.full_name(),
            email: party.email.clone(),
        }
    }
}

/// Appointment document stored in the mirror
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDocument {
    /// MongoDB document ID
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<ObjectId>,

    /// Immutable identifier from the primary store (natural key)
    pub primary_id: i64,

    pub patient: PartyDoc,
    pub psychologist: PartyDoc,

    /// ISO-8601 calendar date, e.g. "2026-08-05"
    pub date: String,
    /// ISO-8601 time of day, e.g. "14:30:00"
    pub time: String,

    /// Status storage code plus display label
    pub status: String,
    pub status_display: String,

    pub notes: String,

    /// Counter for tracking document updates
    pub sync_version: i32,

    /// Stamped once by the insert path; the mapper never sets it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    /// Restamped on every mapping
    pub updated_at: DateTime,
}

impl AppointmentDocument {
    /// Map a fully-hydrated appointment snapshot into its mirror document
    pub fn from_snapshot(snapshot: &AppointmentSnapshot) -> Self {
        Self {
            mongo_id: None,
            primary_id: snapshot.id,
            patient: PartyDoc::from_snapshot(&snapshot.patient),
            psychologist: PartyDoc::from_snapshot(&snapshot.psychologist),
            date: snapshot.date.format("%Y-%m-%d").to_string(),
            time: snapshot.time.format("%H:%M:%S").to_string(),
            status: snapshot.status.code().to_string(),
            status_display: snapshot.status.label().to_string(),
            notes: snapshot.notes.clone(),
            sync_version: 1,
            created_at: None,
            updated_at: DateTime::now(),
        }
    }
}

impl IntoIndexes for AppointmentDocument {
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
                doc! { "date": 1, "psychologist.primary_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("date_psychologist_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MirrorSchema for AppointmentDocument {
    const COLLECTION: &'static str = APPOINTMENT_COLLECTION;

    fn primary_id(&self) -> i64 {
        self.primary_id
    }

    fn search_filter(query: &str) -> Document {
        doc! {
            "$or": [
                { "patient.name": { "$regex": query, "$options": "i" } },
                { "patient.email": { "$regex": query, "$options": "i" } },
                { "psychologist.name": { "$regex": query, "$options": "i" } },
                { "psychologist.email": { "$regex": query, "$options": "i" } },
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppointmentStatus;
    use chrono::{NaiveDate, NaiveTime};

    fn snapshot() -> AppointmentSnapshot {
        AppointmentSnapshot {
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
            status: AppointmentStatus::Confirmed,
            notes: "Follow-up session".to_string(),
        }
    }

    #[test]
    fn test_appointment_mapping() {
        let doc = AppointmentDocument::from_snapshot(&snapshot());

        assert_eq!(doc.primary_id, 11);
        assert_eq!(doc.patient.primary_id, 7);
        assert_eq!(doc.patient.name, "Ana Silva");
        assert_eq!(doc.psychologist.email, "jane@x.com");
        assert_eq!(doc.date, "2026-08-05");
        assert_eq!(doc.time, "14:30:00");
        assert_eq!(doc.status, "confirmed");
        assert_eq!(doc.status_display, "Confirmed");
        assert_eq!(doc.sync_version, 1);
    }

    #[test]
    fn test_mapping_is_stable_apart_from_updated_at() {
        let snapshot = snapshot();
        let mut first = bson::to_document(&AppointmentDocument::from_snapshot(&snapshot)).unwrap();
        let mut second = bson::to_document(&AppointmentDocument::from_snapshot(&snapshot)).unwrap();
        first.remove("updated_at");
        second.remove("updated_at");
        assert_eq!(first, second);
    }

    #[test]
    fn test_search_filter_covers_both_parties() {
        let filter = AppointmentDocument::search_filter("ana");
        let branches = filter.get_array("$or").expect("$or branches");
        assert_eq!(branches.len(), 4);
    }
}
