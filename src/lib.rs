//! annex - document-store mirror for the clinic records service
//!
//! Mirrors accounts and appointments from the authoritative relational
//! store into MongoDB for analytics and search. The relational store
//! stays the single source of truth: the mirror is best-effort, fed by
//! one writer, and an outage on this side is never allowed to block or
//! fail a primary-store write.
//!
//! ## Components
//!
//! - **Supervisor**: lazy, self-healing connection lifecycle for the
//!   document store
//! - **Projection**: pure snapshot-to-document mappings, one schema per
//!   collection
//! - **Sync**: the caller-facing service - idempotent upsert, point
//!   lookup, search, and consistency verification

pub mod config;
pub mod db;
pub mod model;
pub mod projection;
pub mod sync;
pub mod types;

pub use config::{Args, AuthMode, MongoSettings};
pub use db::{ConnectionState, MongoSupervisor};
pub use sync::{PrimarySource, SyncService};
pub use types::{AnnexError, Result};
