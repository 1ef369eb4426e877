//! Document store access layer

pub mod mongo;

pub use mongo::{ConnectionState, IntoIndexes, MirrorSchema, MongoSupervisor};
