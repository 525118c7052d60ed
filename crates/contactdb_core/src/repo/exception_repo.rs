//! Aggregation-exception repository.
//!
//! # Responsibility
//! - Persist manual keep-in/keep-out overrides between raw contact pairs.
//!
//! # Invariants
//! - Stored pairs always satisfy `raw_contact_id1 < raw_contact_id2`.
//! - At most one row exists per unordered pair.
//! - `Automatic` is represented by deleting the pair row.

use crate::model::contact::{ExceptionDecision, RawContactId, RawContactPair};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection};

/// SQLite-backed repository for aggregation exceptions.
pub struct ExceptionRepo<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ExceptionRepo<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Applies a decision to a pair: `Automatic` deletes any stored row,
    /// other decisions upsert it.
    pub fn apply(&self, pair: RawContactPair, decision: ExceptionDecision) -> RepoResult<()> {
        match decision.as_str() {
            None => {
                self.conn.execute(
                    "DELETE FROM aggregation_exceptions
                     WHERE raw_contact_id1 = ?1 AND raw_contact_id2 = ?2;",
                    params![pair.lower, pair.higher],
                )?;
            }
            Some(stored) => {
                self.conn.execute(
                    "INSERT INTO aggregation_exceptions (decision, raw_contact_id1, raw_contact_id2)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT (raw_contact_id1, raw_contact_id2)
                     DO UPDATE SET decision = excluded.decision;",
                    params![stored, pair.lower, pair.higher],
                )?;
            }
        }
        Ok(())
    }

    /// Current decision for a pair; absence means `Automatic`.
    pub fn decision(&self, pair: RawContactPair) -> RepoResult<ExceptionDecision> {
        let mut stmt = self.conn.prepare(
            "SELECT decision FROM aggregation_exceptions
             WHERE raw_contact_id1 = ?1 AND raw_contact_id2 = ?2;",
        )?;
        let mut rows = stmt.query(params![pair.lower, pair.higher])?;
        match rows.next()? {
            Some(row) => {
                let stored = row.get::<_, String>(0)?;
                ExceptionDecision::parse(&stored).ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "invalid decision `{stored}` in aggregation_exceptions.decision"
                    ))
                })
            }
            None => Ok(ExceptionDecision::Automatic),
        }
    }

    /// Every stored exception involving a raw contact.
    pub fn list_for(
        &self,
        raw_contact_id: RawContactId,
    ) -> RepoResult<Vec<(RawContactPair, ExceptionDecision)>> {
        let mut stmt = self.conn.prepare(
            "SELECT raw_contact_id1, raw_contact_id2, decision FROM aggregation_exceptions
             WHERE raw_contact_id1 = ?1 OR raw_contact_id2 = ?1
             ORDER BY raw_contact_id1, raw_contact_id2;",
        )?;
        let mut rows = stmt.query(params![raw_contact_id])?;
        let mut exceptions = Vec::new();
        while let Some(row) = rows.next()? {
            let pair = RawContactPair::new(row.get(0)?, row.get(1)?);
            let stored = row.get::<_, String>(2)?;
            let decision = ExceptionDecision::parse(&stored).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid decision `{stored}` in aggregation_exceptions.decision"
                ))
            })?;
            exceptions.push((pair, decision));
        }
        Ok(exceptions)
    }
}
