//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate aggregate mutations and repository calls into use-case APIs.
//! - Keep callers decoupled from storage details.

pub mod acronym_service;
