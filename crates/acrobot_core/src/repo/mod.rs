//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Lookups return `Ok(None)` for unknown acronyms; errors mean storage
//!   failure or corrupt data.

pub mod acronym_repo;
