//! External-aggregator seam.
//!
//! # Responsibility
//! - Define the triggers this core fires toward the same-person
//!   aggregator without deciding aggregation itself.
//!
//! # Invariants
//! - Core only reacts to raw-contact-to-contact assignments; it never
//!   computes them.

use crate::model::contact::{ContactId, RawContactId};
use crate::repo::RepoResult;
use rusqlite::Connection;

/// Hooks into the external same-person aggregator.
///
/// Implementations run inside the triggering mutation's transaction.
pub trait Aggregator {
    /// Flags a raw contact whose child data changed for (re)aggregation.
    fn mark_for_aggregation(
        &self,
        conn: &Connection,
        raw_contact_id: RawContactId,
    ) -> RepoResult<()>;

    /// Recomputes a contact's cached aggregate data (display name,
    /// optimal/fallback pointers) after membership may have changed.
    fn refresh_aggregate_data(&self, conn: &Connection, contact_id: ContactId) -> RepoResult<()>;
}

/// Aggregator that ignores every trigger.
///
/// Used when aggregation is driven entirely by explicit assignment calls,
/// and by tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAggregator;

impl Aggregator for NoopAggregator {
    fn mark_for_aggregation(
        &self,
        _conn: &Connection,
        _raw_contact_id: RawContactId,
    ) -> RepoResult<()> {
        Ok(())
    }

    fn refresh_aggregate_data(&self, _conn: &Connection, _contact_id: ContactId) -> RepoResult<()> {
        Ok(())
    }
}
