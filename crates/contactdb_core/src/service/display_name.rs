//! Display-name derivation for raw contacts.
//!
//! # Responsibility
//! - Recompute the cached display name from display-eligible child
//!   records after a relevant insert or delete.
//!
//! # Invariants
//! - Kind priority is fixed: name > organization > phone > email.
//! - Name rows contribute regardless of their primary flag; other kinds
//!   only when flagged primary.
//! - A NULL write is permitted when no candidate remains.

use crate::model::contact::RawContactId;
use crate::model::record::RecordKind;
use crate::repo::data_repo::DataRepo;
use crate::repo::raw_contact_repo::RawContactRepo;
use crate::repo::RepoResult;
use rusqlite::Connection;

/// Whether a change to this kind can affect a derived display name.
pub fn is_display_name_eligible(kind: &RecordKind) -> bool {
    kind.display_name_priority().is_some()
}

/// Rescans a raw contact's children and rewrites its cached display name.
pub fn fix_display_name(conn: &Connection, raw_contact_id: RawContactId) -> RepoResult<()> {
    let candidates = DataRepo::new(conn).list_display_candidates(raw_contact_id)?;

    let mut best: Option<(u32, String)> = None;
    for candidate in candidates {
        let priority = match candidate.kind.display_name_priority() {
            Some(priority) => priority,
            None => continue,
        };
        // The full display string of a name row always counts.
        let usable = candidate.is_primary || candidate.kind == RecordKind::Name;
        if !usable {
            continue;
        }
        let value = match candidate.value {
            Some(value) => value,
            None => continue,
        };
        // Strictly-greater keeps the earliest row on priority ties.
        if best.as_ref().map_or(true, |(current, _)| priority > *current) {
            best = Some((priority, value));
        }
    }

    RawContactRepo::new(conn).set_display_name(
        raw_contact_id,
        best.as_ref().map(|(_, value)| value.as_str()),
    )
}
