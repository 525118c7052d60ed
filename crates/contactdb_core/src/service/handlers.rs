//! Kind-specific child-record handlers.
//!
//! # Responsibility
//! - Apply per-kind payload fix-ups (structured names, phone lookup rows)
//!   before the raw insert.
//! - Run the cascading cache fix-ups after an insert or delete.
//!
//! # Invariants
//! - Validation rejects a payload before any row is written.
//! - Deleting an unknown data id is not an error; it affects zero rows.
//! - Every fix-up runs on the caller's connection, inside its transaction.

use crate::model::contact::RawContactId;
use crate::model::phone::normalized_reversed;
use crate::model::record::{slot, DataId, NewChildRecord, RecordKind};
use crate::repo::data_repo::DataRepo;
use crate::service::display_name::{fix_display_name, is_display_name_eligible};
use crate::service::name_split::NameSplitter;
use crate::service::ServiceResult;
use rusqlite::Connection;

/// Inserts one child record with all kind-specific side effects applied.
pub fn insert_child<S: NameSplitter>(
    conn: &Connection,
    splitter: &S,
    raw_contact_id: RawContactId,
    kind: &RecordKind,
    payload: NewChildRecord,
) -> ServiceResult<DataId> {
    payload.validate_for(kind)?;

    let mut payload = payload;
    let mut normalized_number: Option<String> = None;
    match kind {
        RecordKind::Name => fix_structured_name(splitter, &mut payload),
        RecordKind::Phone => {
            if let Some(number) = payload.slots.get(slot::VALUE) {
                normalized_number = normalized_reversed(number);
            }
            match &normalized_number {
                Some(normalized) => payload.slots.set(slot::NORMALIZED_NUMBER, normalized.clone()),
                None => payload.slots.clear(slot::NORMALIZED_NUMBER),
            }
        }
        _ => {}
    }
    let requested_primary = payload.primary;

    let repo = DataRepo::new(conn);
    let data_id = repo.insert_row(raw_contact_id, kind, &payload)?;

    if let Some(normalized) = &normalized_number {
        repo.insert_phone_lookup(data_id, raw_contact_id, normalized)?;
    }
    if requested_primary {
        repo.set_primary(data_id)?;
    }
    if is_display_name_eligible(kind) {
        fix_display_name(conn, raw_contact_id)?;
    }

    Ok(data_id)
}

/// Deletes one child record and repairs every cache it participated in.
///
/// Returns the number of rows removed (0 for an unknown id).
pub fn delete_child(conn: &Connection, data_id: DataId) -> ServiceResult<usize> {
    let repo = DataRepo::new(conn);
    let plan = match repo.delete_plan(data_id)? {
        Some(plan) => plan,
        None => return Ok(0),
    };

    let deleted = repo.delete_row(data_id)?;

    if plan.was_primary {
        repo.fix_primary_after_delete(plan.raw_contact_id, &plan.kind)?;
    }
    if is_display_name_eligible(&plan.kind) {
        fix_display_name(conn, plan.raw_contact_id)?;
    }
    if let (Some(contact_id), Some(pointer_kind)) = (plan.contact_id, plan.pointer_kind) {
        repo.fix_contact_pointers_after_delete(
            contact_id,
            pointer_kind,
            &plan.kind,
            plan.value.as_deref(),
            plan.fix_optimal,
            plan.fix_fallback,
        )?;
    }

    Ok(deleted)
}

/// Reconciles the full display string and the structured components of a
/// name payload: splits the string when only it was given, joins the
/// components when only they were.
fn fix_structured_name<S: NameSplitter>(splitter: &S, payload: &mut NewChildRecord) {
    let has_components = payload.slots.get(slot::GIVEN_NAME).is_some()
        || payload.slots.get(slot::FAMILY_NAME).is_some()
        || payload.slots.get(slot::MIDDLE_NAME).is_some()
        || payload.slots.get(slot::PREFIX).is_some()
        || payload.slots.get(slot::SUFFIX).is_some();
    let full_name = payload.slots.get(slot::VALUE).map(str::to_string);

    match (full_name, has_components) {
        (Some(full_name), false) => {
            let parts = splitter.split(&full_name);
            if let Some(prefix) = parts.prefix {
                payload.slots.set(slot::PREFIX, prefix);
            }
            if let Some(given) = parts.given {
                payload.slots.set(slot::GIVEN_NAME, given);
            }
            if let Some(middle) = parts.middle {
                payload.slots.set(slot::MIDDLE_NAME, middle);
            }
            if let Some(family) = parts.family {
                payload.slots.set(slot::FAMILY_NAME, family);
            }
            if let Some(suffix) = parts.suffix {
                payload.slots.set(slot::SUFFIX, suffix);
            }
        }
        (None, true) => {
            // The synthesized display string carries given and family only;
            // prefix, middle, and suffix stay in their component slots.
            let joined = [
                payload.slots.get(slot::GIVEN_NAME),
                payload.slots.get(slot::FAMILY_NAME),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
            if !joined.is_empty() {
                payload.slots.set(slot::VALUE, joined);
            }
        }
        // Both present (caller knows best) or neither: nothing to reconcile.
        _ => {}
    }
}
