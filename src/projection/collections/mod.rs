//! Typed mirror collections
//!
//! One schema module per collection; each declares its document shape,
//! indexes, and search filter.

pub mod accounts;
pub mod appointments;
