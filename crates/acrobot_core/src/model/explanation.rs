//! Explanation entity.
//!
//! # Invariants
//! - An explanation always records exactly one owning acronym.
//! - Fields are read-only after construction; revision replaces the record.
//! - Records created through an acronym always have an author. Only legacy
//!   rows loaded from storage may be unowned.

use crate::model::acronym::{Acronym, AcronymId};
use serde::Serialize;
use uuid::Uuid;

/// Stable surrogate identifier of a single explanation.
pub type ExplanationId = Uuid;

/// One contributor's submitted meaning for an acronym.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    id: ExplanationId,
    acronym_id: AcronymId,
    /// Opaque contributor id, stored as given. `None` for unowned legacy rows.
    author_id: Option<String>,
    /// Free-form text, stored verbatim.
    text: String,
}

impl Explanation {
    /// Only `Acronym::create_explanation` builds fresh records, so there is
    /// no way to obtain an explanation without an owner.
    pub(crate) fn new(
        owner: &Acronym,
        author_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            acronym_id: owner.id(),
            author_id: Some(author_id.into()),
            text: text.into(),
        }
    }

    /// Rebuilds a record from persisted state.
    pub(crate) fn from_parts(
        id: ExplanationId,
        acronym_id: AcronymId,
        author_id: Option<String>,
        text: String,
    ) -> Self {
        Self {
            id,
            acronym_id,
            author_id,
            text,
        }
    }

    pub fn id(&self) -> ExplanationId {
        self.id
    }

    /// Id of the owning acronym.
    pub fn acronym_id(&self) -> AcronymId {
        self.acronym_id
    }

    pub fn author_id(&self) -> Option<&str> {
        self.author_id.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether `author_id` submitted this explanation.
    pub fn is_authored_by(&self, author_id: &str) -> bool {
        self.author_id.as_deref() == Some(author_id)
    }

    /// Whether the record has no known contributor and may be claimed.
    pub fn is_unowned(&self) -> bool {
        self.author_id.is_none()
    }
}
