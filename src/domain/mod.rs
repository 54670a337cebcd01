//! Persistence-independent domain types.

pub mod dates;
pub mod termination;
pub mod types;
