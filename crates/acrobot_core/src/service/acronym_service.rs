//! Acronym use-case service.
//!
//! # Responsibility
//! - Provide find-or-create, lookup and explanation use-cases to callers.
//! - Route every new explanation through `Acronym::create_explanation`.
//! - Enforce authorship for revising and removing explanations.
//!
//! # Invariants
//! - An explanation shown on an in-memory `Acronym` has been persisted; a
//!   failed insert is rolled back from the aggregate.
//! - Only the author of an explanation may revise or remove it. Unowned
//!   legacy explanations may be claimed by whoever revises or removes them.
//! - Revision never mutates a record; it swaps in a new one atomically.

use crate::model::acronym::Acronym;
use crate::model::explanation::Explanation;
use crate::repo::acronym_repo::{AcronymRepository, AuthoredExplanation, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AcronymServiceResult<T> = Result<T, AcronymServiceError>;

/// Service error for acronym use-cases.
#[derive(Debug)]
pub enum AcronymServiceError {
    /// No acronym is stored under the normalized form of this text.
    AcronymNotFound(String),
    /// The acronym has no explanation with this exact text.
    ExplanationNotFound { acronym: String, text: String },
    /// The explanation exists but was submitted by someone else.
    NotAuthor { acronym: String, author_id: String },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for AcronymServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AcronymNotFound(acronym) => write!(f, "acronym not found: `{acronym}`"),
            Self::ExplanationNotFound { acronym, text } => {
                write!(f, "explanation `{text}` not found for acronym `{acronym}`")
            }
            Self::NotAuthor { acronym, author_id } => write!(
                f,
                "author `{author_id}` did not submit this explanation for acronym `{acronym}`"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AcronymServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::AcronymNotFound(_) | Self::ExplanationNotFound { .. } | Self::NotAuthor { .. } => {
                None
            }
        }
    }
}

impl From<RepoError> for AcronymServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service wrapper for acronym operations.
pub struct AcronymService<R: AcronymRepository> {
    repo: R,
}

impl<R: AcronymRepository> AcronymService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the acronym for `raw` under any casing, creating it on first use.
    pub fn find_or_create(&self, raw: &str) -> AcronymServiceResult<Acronym> {
        Ok(self.repo.find_or_create(raw)?)
    }

    /// Case-insensitive lookup. `Ok(None)` when the acronym is unknown.
    pub fn find(&self, raw: &str) -> AcronymServiceResult<Option<Acronym>> {
        Ok(self.repo.find_by_normalized_text(raw)?)
    }

    /// Adds one explanation to a stored acronym and persists it.
    ///
    /// Duplicates are allowed. Appends to the same acronym from other
    /// handles are not reflected in `acronym` until it is read again.
    pub fn add_explanation(
        &self,
        acronym: &mut Acronym,
        author_id: &str,
        text: &str,
    ) -> AcronymServiceResult<Explanation> {
        let created = acronym.create_explanation(author_id, text);
        if let Err(err) = self.repo.insert_explanation(&created) {
            acronym.detach_explanation(created.id());
            return Err(err.into());
        }

        info!(
            "event=explanation_add module=service status=ok acronym_id={} explanation_id={}",
            acronym.id(),
            created.id()
        );
        Ok(created)
    }

    /// Returns the explanations of `raw` in case-insensitive text order.
    ///
    /// `Ok(None)` when the acronym is unknown or has nothing to show.
    pub fn explain(&self, raw: &str) -> AcronymServiceResult<Option<Vec<Explanation>>> {
        let Some(acronym) = self.repo.find_by_normalized_text(raw)? else {
            return Ok(None);
        };

        let sorted = acronym.sorted_explanations();
        if sorted.is_empty() {
            return Ok(None);
        }
        Ok(Some(sorted))
    }

    /// Replaces an explanation with new text on behalf of its author.
    ///
    /// The returned record has a new id and the same owner, and is authored
    /// by `author_id`. Revising an unowned record claims it.
    pub fn revise_explanation(
        &self,
        raw: &str,
        author_id: &str,
        old_text: &str,
        new_text: &str,
    ) -> AcronymServiceResult<Explanation> {
        let mut acronym = self.load(raw)?;
        let existing = select_authored(&acronym, author_id, old_text)?;

        let replacement = acronym.create_explanation(author_id, new_text);
        self.repo.replace_explanation(existing.id(), &replacement)?;
        acronym.detach_explanation(existing.id());

        info!(
            "event=explanation_revise module=service status=ok acronym_id={} explanation_id={}",
            acronym.id(),
            replacement.id()
        );
        Ok(replacement)
    }

    /// Removes an explanation on behalf of its author.
    ///
    /// The acronym itself stays stored, even when it has no explanations left.
    pub fn remove_explanation(
        &self,
        raw: &str,
        author_id: &str,
        text: &str,
    ) -> AcronymServiceResult<()> {
        let acronym = self.load(raw)?;
        let existing = select_authored(&acronym, author_id, text)?;
        self.repo.delete_explanation(existing.id())?;

        info!(
            "event=explanation_remove module=service status=ok acronym_id={} explanation_id={}",
            acronym.id(),
            existing.id()
        );
        Ok(())
    }

    /// Lists everything `author_id` contributed, grouped by acronym.
    pub fn explanations_by_author(
        &self,
        author_id: &str,
    ) -> AcronymServiceResult<Vec<AuthoredExplanation>> {
        Ok(self.repo.list_by_author(author_id)?)
    }

    /// Removes every explanation `author_id` contributed, across all acronyms.
    ///
    /// Acronyms stay stored. Returns the number of removed explanations.
    pub fn remove_all_by_author(&self, author_id: &str) -> AcronymServiceResult<u64> {
        let removed = self.repo.delete_by_author(author_id)?;
        info!("event=explanation_remove_by_author module=service status=ok removed={removed}");
        Ok(removed)
    }

    fn load(&self, raw: &str) -> AcronymServiceResult<Acronym> {
        self.repo
            .find_by_normalized_text(raw)?
            .ok_or_else(|| AcronymServiceError::AcronymNotFound(raw.to_string()))
    }
}

/// Picks the author's explanation with `text`.
///
/// When several contributors submitted the same text, the author's own record
/// wins, then an unowned record; a match owned only by others is a
/// `NotAuthor` error.
fn select_authored(
    acronym: &Acronym,
    author_id: &str,
    text: &str,
) -> AcronymServiceResult<Explanation> {
    let candidates: Vec<&Explanation> = acronym
        .explanations()
        .iter()
        .filter(|explanation| explanation.text() == text)
        .collect();

    if candidates.is_empty() {
        return Err(AcronymServiceError::ExplanationNotFound {
            acronym: acronym.text().to_string(),
            text: text.to_string(),
        });
    }

    candidates
        .iter()
        .find(|explanation| explanation.is_authored_by(author_id))
        .or_else(|| candidates.iter().find(|explanation| explanation.is_unowned()))
        .map(|explanation| (*explanation).clone())
        .ok_or_else(|| AcronymServiceError::NotAuthor {
            acronym: acronym.text().to_string(),
            author_id: author_id.to_string(),
        })
}
