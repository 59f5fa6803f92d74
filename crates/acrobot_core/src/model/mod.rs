//! Domain model for acronyms and their crowd-sourced explanations.
//!
//! # Responsibility
//! - Define the `Acronym` aggregate and the `Explanation` entity it owns.
//! - Own the canonical normalization used for acronym identity.
//!
//! # Invariants
//! - Acronym identity is its normalized text, never its surrogate id.
//! - Every `Explanation` is created through its owning `Acronym`.

pub mod acronym;
pub mod explanation;
