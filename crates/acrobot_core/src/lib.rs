//! Core storage logic for the acronym bot.
//! This crate owns the acronym/explanation data model and its invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::acronym::{normalize_acronym, Acronym, AcronymId};
pub use model::explanation::{Explanation, ExplanationId};
pub use repo::acronym_repo::{
    AcronymRepository, AuthoredExplanation, RepoError, RepoResult, SqliteAcronymRepository,
};
pub use service::acronym_service::{AcronymService, AcronymServiceError, AcronymServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
