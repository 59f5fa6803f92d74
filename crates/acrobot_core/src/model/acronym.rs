//! Acronym aggregate.
//!
//! # Responsibility
//! - Keep the raw display text of an acronym next to its owned explanations.
//! - Derive equality and hashing from the normalized natural key.
//! - Be the only place where new `Explanation` records are constructed.
//!
//! # Invariants
//! - `normalize_acronym(a.text()) == normalize_acronym(b.text())` iff `a == b`.
//! - Raw text is stored verbatim and never rewritten after construction.
//! - Every explanation in `explanations` carries this acronym's id as owner.

use crate::model::explanation::{Explanation, ExplanationId};
use serde::Serialize;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Stable surrogate identifier of a persisted acronym.
pub type AcronymId = Uuid;

/// Maps acronym text to its canonical natural key.
///
/// Uses the Unicode default (locale-independent) uppercase mapping, so
/// `"i"` becomes `"I"` on every host regardless of locale settings.
/// No trimming and no Unicode normalization form is applied.
pub fn normalize_acronym(raw: &str) -> String {
    raw.to_uppercase()
}

/// Canonical acronym record owning a set of explanations.
#[derive(Debug, Clone, Serialize)]
pub struct Acronym {
    id: AcronymId,
    text: String,
    explanations: Vec<Explanation>,
}

impl Acronym {
    /// Creates a new acronym with a generated id and no explanations.
    ///
    /// Any string is accepted, including the empty string.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            explanations: Vec::new(),
        }
    }

    /// Rebuilds an aggregate from persisted state.
    pub(crate) fn from_parts(
        id: AcronymId,
        text: String,
        explanations: Vec<Explanation>,
    ) -> Self {
        Self {
            id,
            text,
            explanations,
        }
    }

    pub fn id(&self) -> AcronymId {
        self.id
    }

    /// Raw text as first submitted, with its original casing.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Natural key used for identity and lookup.
    pub fn normalized_text(&self) -> String {
        normalize_acronym(&self.text)
    }

    /// Owned explanations. Order carries no meaning.
    pub fn explanations(&self) -> &[Explanation] {
        &self.explanations
    }

    /// Returns explanations ordered case-insensitively by text.
    ///
    /// Ties on the case-folded text fall back to the raw text, then to the
    /// id, so the order is total and stable across reads.
    pub fn sorted_explanations(&self) -> Vec<Explanation> {
        let mut sorted = self.explanations.clone();
        sorted.sort_by(compare_explanations);
        sorted
    }

    /// Creates a new explanation owned by this acronym and adds it to the set.
    ///
    /// Identical author/text pairs are kept as independent submissions.
    pub fn create_explanation(
        &mut self,
        author_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Explanation {
        let created = Explanation::new(self, author_id, text);
        self.explanations.push(created.clone());
        created
    }

    /// Drops an explanation from the in-memory set.
    ///
    /// Returns the removed record, or `None` when the id is not owned here.
    pub(crate) fn detach_explanation(&mut self, id: ExplanationId) -> Option<Explanation> {
        let position = self
            .explanations
            .iter()
            .position(|explanation| explanation.id() == id)?;
        Some(self.explanations.remove(position))
    }
}

impl PartialEq for Acronym {
    fn eq(&self, other: &Self) -> bool {
        self.normalized_text() == other.normalized_text()
    }
}

impl Eq for Acronym {}

impl Hash for Acronym {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized_text().hash(state);
    }
}

fn compare_explanations(left: &Explanation, right: &Explanation) -> Ordering {
    left.text()
        .to_lowercase()
        .cmp(&right.text().to_lowercase())
        .then_with(|| left.text().cmp(right.text()))
        .then_with(|| left.id().cmp(&right.id()))
}
