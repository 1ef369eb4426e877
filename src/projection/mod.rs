//! Document projections for the mirror
//!
//! Pure mappings from primary-store snapshots into the canonical
//! document shapes stored in the mirror. Mapping never touches a store:
//! determinism (modulo the `updated_at` stamp) keeps it testable.

pub mod collections;

pub use collections::accounts::{AccountDocument, DoctorProfileDoc, OfficeDoc, ACCOUNT_COLLECTION};
pub use collections::appointments::{AppointmentDocument, PartyDoc, APPOINTMENT_COLLECTION};
