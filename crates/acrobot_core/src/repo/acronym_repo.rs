//! Acronym repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Look up acronyms by normalized text and create them on first use.
//! - Persist explanations produced by the `Acronym` aggregate.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - At most one `acronyms` row exists per normalized text. The `UNIQUE`
//!   constraint is the arbiter; `find_or_create` turns a conflict into a
//!   re-read of the winning row.
//! - Explanations are only written for an existing owning row.
//! - Deleting an acronym deletes its explanations (`ON DELETE CASCADE`).
//! - Author-scoped deletes never touch other authors' or unowned records.

use crate::db::DbError;
use crate::model::acronym::{normalize_acronym, Acronym, AcronymId};
use crate::model::explanation::{Explanation, ExplanationId};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Insert attempts before giving up on a key that keeps vanishing between
/// the conflict and the re-read (only possible with concurrent deletes).
const MAX_CREATE_ATTEMPTS: usize = 3;

const EXPLANATION_SELECT_SQL: &str = "SELECT
    uuid,
    acronym_uuid,
    author_id,
    explanation_text
FROM explanations";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for acronym persistence and query operations.
///
/// A missing acronym on lookup is `Ok(None)`, not an error.
#[derive(Debug)]
pub enum RepoError {
    /// Storage could not be reached or a write could not be committed.
    Db(DbError),
    AcronymNotFound(AcronymId),
    ExplanationNotFound(ExplanationId),
    /// A create kept conflicting with a row that was gone on re-read.
    CreateConflict(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::AcronymNotFound(id) => write!(f, "acronym not found: {id}"),
            Self::ExplanationNotFound(id) => write!(f, "explanation not found: {id}"),
            Self::CreateConflict(key) => write!(
                f,
                "acronym `{key}` conflicted on create {MAX_CREATE_ATTEMPTS} times without a readable row"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted acronym data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::AcronymNotFound(_)
            | Self::ExplanationNotFound(_)
            | Self::CreateConflict(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One explanation together with the display text of its acronym.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthoredExplanation {
    pub acronym_text: String,
    pub explanation: Explanation,
}

/// Repository interface for the acronym aggregate.
pub trait AcronymRepository {
    /// Loads the acronym whose normalized text matches `raw`, with all its
    /// explanations, from one consistent read.
    fn find_by_normalized_text(&self, raw: &str) -> RepoResult<Option<Acronym>>;
    /// Persists a new acronym row.
    ///
    /// Returns `Ok(false)` when another row already holds the normalized text.
    fn insert_acronym(&self, acronym: &Acronym) -> RepoResult<bool>;
    /// Persists an explanation created by its owning aggregate.
    fn insert_explanation(&self, explanation: &Explanation) -> RepoResult<()>;
    /// Lists all explanations owned by one acronym.
    fn list_explanations(&self, acronym_id: AcronymId) -> RepoResult<Vec<Explanation>>;
    /// Atomically swaps one explanation record for another of the same owner.
    fn replace_explanation(
        &self,
        old_id: ExplanationId,
        replacement: &Explanation,
    ) -> RepoResult<()>;
    fn delete_explanation(&self, id: ExplanationId) -> RepoResult<()>;
    /// Deletes an acronym together with every explanation it owns.
    fn delete_acronym(&self, id: AcronymId) -> RepoResult<()>;
    fn count_acronyms(&self) -> RepoResult<u64>;
    /// Lists every explanation `author_id` submitted, ordered by normalized
    /// acronym text, then explanation text.
    fn list_by_author(&self, author_id: &str) -> RepoResult<Vec<AuthoredExplanation>>;
    /// Deletes every explanation `author_id` submitted and returns how many.
    fn delete_by_author(&self, author_id: &str) -> RepoResult<u64>;

    /// Returns the existing acronym for `raw`, or persists a new one.
    ///
    /// A lost insert race is answered with the winner's row.
    fn find_or_create(&self, raw: &str) -> RepoResult<Acronym> {
        for attempt in 1..=MAX_CREATE_ATTEMPTS {
            if let Some(existing) = self.find_by_normalized_text(raw)? {
                return Ok(existing);
            }

            let created = Acronym::new(raw);
            if self.insert_acronym(&created)? {
                info!(
                    "event=acronym_create module=repo status=ok acronym_id={}",
                    created.id()
                );
                return Ok(created);
            }

            debug!("event=acronym_create module=repo status=conflict attempt={attempt}");
        }

        Err(RepoError::CreateConflict(normalize_acronym(raw)))
    }
}

/// SQLite-backed acronym repository.
///
/// Borrows one connection. Concurrent callers use one connection each.
pub struct SqliteAcronymRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAcronymRepository<'conn> {
    /// Constructs a repository from a connection returned by `db::open_db*`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AcronymRepository for SqliteAcronymRepository<'_> {
    fn find_by_normalized_text(&self, raw: &str) -> RepoResult<Option<Acronym>> {
        // The repository never nests transactions on its connection.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let found = tx
            .query_row(
                "SELECT uuid, acronym_text
                 FROM acronyms
                 WHERE normalized_text = ?1;",
                [normalize_acronym(raw)],
                |row| {
                    Ok((
                        row.get::<_, String>("uuid")?,
                        row.get::<_, String>("acronym_text")?,
                    ))
                },
            )
            .optional()?;

        let Some((uuid_text, text)) = found else {
            return Ok(None);
        };

        let id = parse_uuid(&uuid_text, "acronyms.uuid")?;
        let explanations = load_explanations(&tx, id)?;
        tx.commit()?;
        Ok(Some(Acronym::from_parts(id, text, explanations)))
    }

    fn insert_acronym(&self, acronym: &Acronym) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT INTO acronyms (
                uuid,
                acronym_text,
                normalized_text
            ) VALUES (?1, ?2, ?3);",
            params![
                acronym.id().to_string(),
                acronym.text(),
                acronym.normalized_text(),
            ],
        );

        match inserted {
            Ok(_) => Ok(true),
            Err(err) => {
                let err = DbError::from(err);
                if err.is_unique_violation() {
                    Ok(false)
                } else {
                    Err(err.into())
                }
            }
        }
    }

    fn insert_explanation(&self, explanation: &Explanation) -> RepoResult<()> {
        let inserted = self.conn.execute(
            "INSERT INTO explanations (
                uuid,
                acronym_uuid,
                author_id,
                explanation_text
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                explanation.id().to_string(),
                explanation.acronym_id().to_string(),
                explanation.author_id(),
                explanation.text(),
            ],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = DbError::from(err);
                if err.is_foreign_key_violation() {
                    Err(RepoError::AcronymNotFound(explanation.acronym_id()))
                } else {
                    Err(err.into())
                }
            }
        }
    }

    fn list_explanations(&self, acronym_id: AcronymId) -> RepoResult<Vec<Explanation>> {
        load_explanations(self.conn, acronym_id)
    }

    fn replace_explanation(
        &self,
        old_id: ExplanationId,
        replacement: &Explanation,
    ) -> RepoResult<()> {
        // The repository never nests transactions on its connection.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let owner: Option<String> = tx
            .query_row(
                "SELECT acronym_uuid FROM explanations WHERE uuid = ?1;",
                [old_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(owner) = owner else {
            return Err(RepoError::ExplanationNotFound(old_id));
        };
        if parse_uuid(&owner, "explanations.acronym_uuid")? != replacement.acronym_id() {
            return Err(RepoError::InvalidData(format!(
                "replacement for explanation {old_id} belongs to a different acronym"
            )));
        }

        tx.execute(
            "DELETE FROM explanations WHERE uuid = ?1;",
            [old_id.to_string()],
        )?;
        tx.execute(
            "INSERT INTO explanations (
                uuid,
                acronym_uuid,
                author_id,
                explanation_text
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                replacement.id().to_string(),
                replacement.acronym_id().to_string(),
                replacement.author_id(),
                replacement.text(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn delete_explanation(&self, id: ExplanationId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM explanations WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::ExplanationNotFound(id));
        }

        Ok(())
    }

    fn delete_acronym(&self, id: AcronymId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM acronyms WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::AcronymNotFound(id));
        }

        info!("event=acronym_delete module=repo status=ok acronym_id={id}");
        Ok(())
    }

    fn count_acronyms(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM acronyms;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative acronym count `{count}`")))
    }

    fn list_by_author(&self, author_id: &str) -> RepoResult<Vec<AuthoredExplanation>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                a.acronym_text,
                e.uuid,
                e.acronym_uuid,
                e.author_id,
                e.explanation_text
             FROM explanations e
             INNER JOIN acronyms a ON a.uuid = e.acronym_uuid
             WHERE e.author_id = ?1
             ORDER BY a.normalized_text ASC, e.explanation_text ASC, e.rowid ASC;",
        )?;

        let mut rows = stmt.query([author_id])?;
        let mut authored = Vec::new();
        while let Some(row) = rows.next()? {
            authored.push(AuthoredExplanation {
                acronym_text: row.get("acronym_text")?,
                explanation: parse_explanation_row(row)?,
            });
        }

        Ok(authored)
    }

    fn delete_by_author(&self, author_id: &str) -> RepoResult<u64> {
        let deleted = self.conn.execute(
            "DELETE FROM explanations WHERE author_id = ?1;",
            [author_id],
        )?;
        Ok(deleted as u64)
    }
}

/// Reads explanations of one acronym in insertion order.
fn load_explanations(conn: &Connection, acronym_id: AcronymId) -> RepoResult<Vec<Explanation>> {
    let mut stmt = conn.prepare(&format!(
        "{EXPLANATION_SELECT_SQL}
         WHERE acronym_uuid = ?1
         ORDER BY rowid ASC;"
    ))?;

    let mut rows = stmt.query([acronym_id.to_string()])?;
    let mut explanations = Vec::new();
    while let Some(row) = rows.next()? {
        explanations.push(parse_explanation_row(row)?);
    }

    Ok(explanations)
}

fn parse_explanation_row(row: &Row<'_>) -> RepoResult<Explanation> {
    let uuid_text: String = row.get("uuid")?;
    let owner_text: String = row.get("acronym_uuid")?;

    Ok(Explanation::from_parts(
        parse_uuid(&uuid_text, "explanations.uuid")?,
        parse_uuid(&owner_text, "explanations.acronym_uuid")?,
        row.get("author_id")?,
        row.get("explanation_text")?,
    ))
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
