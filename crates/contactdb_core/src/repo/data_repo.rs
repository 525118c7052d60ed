//! Child-record repository and denormalized-pointer maintainers.
//!
//! # Responsibility
//! - Provide CRUD over the `data` table and `phone_lookup`.
//! - Maintain the per-raw-contact primary flag and the per-contact
//!   optimal/fallback pointer caches.
//!
//! # Invariants
//! - Primary and super-primary flips are single statements keyed by
//!   `(id = ?)`, so at-most-one holds even if a transaction is torn apart.
//! - A restricted record may become optimal but never fallback.
//! - Fix-up scans run inside the caller's transaction.

use crate::model::caller::CallerContext;
use crate::model::contact::{ContactId, PrimaryKind, RawContactId};
use crate::model::record::{
    ChildRecord, DataId, NewChildRecord, RecordKind, Subtype, ValueSlots, SLOT_COUNT,
};
use crate::repo::{bool_to_int, int_to_bool, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const DATA_SELECT_SQL: &str = "SELECT
    id,
    raw_contact_id,
    kind,
    subtype,
    label,
    is_primary,
    is_super_primary,
    slot1, slot2, slot3, slot4, slot5,
    slot6, slot7, slot8, slot9, slot10,
    slot11, slot12, slot13, slot14, slot15
FROM data";

/// Facts needed before deleting a data row to know which caches to fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePlan {
    pub data_id: DataId,
    pub raw_contact_id: RawContactId,
    pub kind: RecordKind,
    pub was_primary: bool,
    /// Canonical value of the doomed row, used for continuity scoring.
    pub value: Option<String>,
    pub contact_id: Option<ContactId>,
    pub pointer_kind: Option<PrimaryKind>,
    /// The doomed row currently holds the contact's optimal pointer.
    pub fix_optimal: bool,
    /// The doomed row currently holds the contact's fallback pointer.
    pub fix_fallback: bool,
}

/// One reverse-lookup hit for a phone number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhoneLookupHit {
    pub data_id: DataId,
    pub raw_contact_id: RawContactId,
}

/// One display-name candidate row for a raw contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCandidate {
    pub kind: RecordKind,
    pub is_primary: bool,
    pub value: Option<String>,
}

/// SQLite-backed repository for child records.
pub struct DataRepo<'conn> {
    conn: &'conn Connection,
}

impl<'conn> DataRepo<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Raw row insert; primary promotion and display-name derivation are
    /// orchestrated by the child-record handlers.
    pub fn insert_row(
        &self,
        raw_contact_id: RawContactId,
        kind: &RecordKind,
        payload: &NewChildRecord,
    ) -> RepoResult<DataId> {
        let mut bind_values: Vec<Value> = Vec::with_capacity(5 + SLOT_COUNT);
        bind_values.push(Value::Integer(raw_contact_id));
        bind_values.push(Value::Text(kind.as_str().to_string()));
        bind_values.push(match payload.subtype {
            Some(subtype) => Value::Text(subtype.as_str().to_string()),
            None => Value::Null,
        });
        bind_values.push(match &payload.label {
            Some(label) => Value::Text(label.clone()),
            None => Value::Null,
        });
        bind_values.push(Value::Integer(bool_to_int(payload.primary)));
        for slot_value in payload.slots.iter() {
            bind_values.push(match slot_value {
                Some(text) => Value::Text(text.to_string()),
                None => Value::Null,
            });
        }

        self.conn.execute(
            "INSERT INTO data (
                raw_contact_id, kind, subtype, label, is_primary,
                slot1, slot2, slot3, slot4, slot5,
                slot6, slot7, slot8, slot9, slot10,
                slot11, slot12, slot13, slot14, slot15
            ) VALUES (?1, ?2, ?3, ?4, ?5,
                      ?6, ?7, ?8, ?9, ?10,
                      ?11, ?12, ?13, ?14, ?15,
                      ?16, ?17, ?18, ?19, ?20);",
            params_from_iter(bind_values),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, id: DataId) -> RepoResult<Option<ChildRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DATA_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_child_row(row)?));
        }
        Ok(None)
    }

    /// Children of one kind under one raw contact, ascending by id.
    pub fn list_by_kind(
        &self,
        raw_contact_id: RawContactId,
        kind: &RecordKind,
    ) -> RepoResult<Vec<ChildRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DATA_SELECT_SQL} WHERE raw_contact_id = ?1 AND kind = ?2 ORDER BY id;"
        ))?;
        let mut rows = stmt.query(params![raw_contact_id, kind.as_str()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_child_row(row)?);
        }
        Ok(records)
    }

    /// Children of one kind across a whole contact, filtered by the
    /// caller's restricted-data visibility, ascending by id.
    pub fn list_for_contact(
        &self,
        contact_id: ContactId,
        kind: &RecordKind,
        caller: CallerContext,
    ) -> RepoResult<Vec<ChildRecord>> {
        let sql = format!(
            "SELECT
                data.id,
                data.raw_contact_id,
                data.kind,
                data.subtype,
                data.label,
                data.is_primary,
                data.is_super_primary,
                slot1, slot2, slot3, slot4, slot5,
                slot6, slot7, slot8, slot9, slot10,
                slot11, slot12, slot13, slot14, slot15
             FROM data
             JOIN raw_contacts ON raw_contacts.id = data.raw_contact_id
             WHERE raw_contacts.contact_id = ?1 AND data.kind = ?2 AND {}
             ORDER BY data.id;",
            caller.raw_contact_visibility_clause()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![contact_id, kind.as_str()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_child_row(row)?);
        }
        Ok(records)
    }

    /// Deletes the row; companion lookup rows cascade. Returns the number
    /// of rows removed (0 for an unknown id).
    pub fn delete_row(&self, id: DataId) -> RepoResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM data WHERE id = ?1;", params![id])?;
        Ok(deleted)
    }

    /// Flags `data_id` primary and clears every sibling of the same kind
    /// under the same raw contact, in one statement.
    pub fn set_primary(&self, data_id: DataId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE data SET is_primary = (id = ?1)
             WHERE raw_contact_id = (SELECT raw_contact_id FROM data WHERE id = ?1)
               AND kind = (SELECT kind FROM data WHERE id = ?1);",
            params![data_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(data_id));
        }
        Ok(())
    }

    /// Flags `data_id` super-primary across every raw contact of its
    /// contact, then refreshes the contact's cached pointers.
    ///
    /// The optimal pointer always follows the new super-primary; the
    /// fallback pointer follows only when the owning raw contact is
    /// unrestricted. Unaggregated raw contacts are left untouched.
    pub fn set_super_primary(&self, data_id: DataId) -> RepoResult<()> {
        let target = self
            .conn
            .query_row(
                "SELECT data.kind, raw_contacts.contact_id, raw_contacts.is_restricted
                 FROM data
                 JOIN raw_contacts ON raw_contacts.id = data.raw_contact_id
                 WHERE data.id = ?1;",
                params![data_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<ContactId>>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let (kind_text, contact_id, restricted_raw) = match target {
            Some(found) => found,
            None => return Err(RepoError::NotFound(data_id)),
        };
        let kind = RecordKind::parse(&kind_text);
        let is_restricted = int_to_bool(restricted_raw, "raw_contacts.is_restricted")?;

        self.conn.execute(
            "UPDATE data SET is_super_primary = (id = ?1)
             WHERE kind = (SELECT kind FROM data WHERE id = ?1)
               AND raw_contact_id IN (
                   SELECT id FROM raw_contacts WHERE contact_id = (
                       SELECT contact_id FROM raw_contacts WHERE id = (
                           SELECT raw_contact_id FROM data WHERE id = ?1)));",
            params![data_id],
        )?;

        let contact_id = match contact_id {
            Some(id) => id,
            // No parent aggregate; nothing to cache.
            None => return Ok(()),
        };
        let pointer_kind = match PrimaryKind::from_record_kind(&kind) {
            Some(pointer_kind) => pointer_kind,
            // No contact-level pointers for this kind.
            None => return Ok(()),
        };

        if is_restricted {
            self.conn.execute(
                &format!(
                    "UPDATE contacts SET {} = ?1, {} = 1 WHERE id = ?2;",
                    pointer_kind.optimal_id_column(),
                    pointer_kind.optimal_is_restricted_column(),
                ),
                params![data_id, contact_id],
            )?;
        } else {
            self.conn.execute(
                &format!(
                    "UPDATE contacts SET {} = ?1, {} = 0, {} = ?1 WHERE id = ?2;",
                    pointer_kind.optimal_id_column(),
                    pointer_kind.optimal_is_restricted_column(),
                    pointer_kind.fallback_id_column(),
                ),
                params![data_id, contact_id],
            )?;
        }
        Ok(())
    }

    /// Promotes the best remaining sibling after a primary was deleted:
    /// lowest type rank wins, ties broken by lowest id. No-op when no
    /// sibling of the kind remains.
    pub fn fix_primary_after_delete(
        &self,
        raw_contact_id: RawContactId,
        kind: &RecordKind,
    ) -> RepoResult<Option<DataId>> {
        let siblings = self.list_by_kind(raw_contact_id, kind)?;

        let mut best: Option<(u32, DataId)> = None;
        for sibling in &siblings {
            let rank = sibling.type_rank();
            // Ascending-id iteration keeps the lowest id on rank ties.
            if best.map_or(true, |(best_rank, _)| rank < best_rank) {
                best = Some((rank, sibling.id));
            }
        }

        match best {
            Some((_, new_primary)) => {
                self.set_primary(new_primary)?;
                Ok(Some(new_primary))
            }
            None => Ok(None),
        }
    }

    /// Collects everything delete fix-up needs before the row disappears.
    pub fn delete_plan(&self, data_id: DataId) -> RepoResult<Option<DeletePlan>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                data.id,
                data.raw_contact_id,
                data.kind,
                data.is_primary,
                data.slot1,
                raw_contacts.contact_id,
                contacts.optimal_phone_id,
                contacts.fallback_phone_id,
                contacts.optimal_email_id,
                contacts.fallback_email_id
             FROM data
             JOIN raw_contacts ON raw_contacts.id = data.raw_contact_id
             LEFT JOIN contacts ON contacts.id = raw_contacts.contact_id
             WHERE data.id = ?1;",
        )?;
        let mut rows = stmt.query(params![data_id])?;
        let row = match rows.next()? {
            Some(row) => row,
            None => return Ok(None),
        };

        let kind = RecordKind::parse(&row.get::<_, String>("kind")?);
        let pointer_kind = PrimaryKind::from_record_kind(&kind);
        let (fix_optimal, fix_fallback) = match pointer_kind {
            Some(PrimaryKind::Phone) => (
                row.get::<_, Option<DataId>>("optimal_phone_id")? == Some(data_id),
                row.get::<_, Option<DataId>>("fallback_phone_id")? == Some(data_id),
            ),
            Some(PrimaryKind::Email) => (
                row.get::<_, Option<DataId>>("optimal_email_id")? == Some(data_id),
                row.get::<_, Option<DataId>>("fallback_email_id")? == Some(data_id),
            ),
            None => (false, false),
        };

        Ok(Some(DeletePlan {
            data_id,
            raw_contact_id: row.get("raw_contact_id")?,
            kind,
            was_primary: int_to_bool(row.get::<_, i64>("is_primary")?, "data.is_primary")?,
            value: row.get("slot1")?,
            contact_id: row.get("contact_id")?,
            pointer_kind,
            fix_optimal,
            fix_fallback,
        }))
    }

    /// Recomputes the contact's optimal/fallback pointers after the row
    /// holding one of them was deleted.
    ///
    /// Remaining siblings are scored: 2 for a verbatim match with the
    /// deleted value (continuity across duplicate values), else the
    /// primary flag. The optimal pointer takes the top score regardless of
    /// restriction; the fallback pointer takes the top unrestricted score.
    /// Continuity deliberately outranks the type-rank policy.
    pub fn fix_contact_pointers_after_delete(
        &self,
        contact_id: ContactId,
        pointer_kind: PrimaryKind,
        kind: &RecordKind,
        deleted_value: Option<&str>,
        fix_optimal: bool,
        fix_fallback: bool,
    ) -> RepoResult<()> {
        if !fix_optimal && !fix_fallback {
            return Ok(());
        }

        let mut stmt = self.conn.prepare(
            "SELECT
                data.id,
                raw_contacts.is_restricted,
                (CASE WHEN data.slot1 = ?1 THEN 2 ELSE data.is_primary END) AS score
             FROM data
             JOIN raw_contacts ON raw_contacts.id = data.raw_contact_id
             WHERE raw_contacts.contact_id = ?2 AND data.kind = ?3
             ORDER BY score DESC, data.id;",
        )?;
        let mut rows = stmt.query(params![deleted_value, contact_id, kind.as_str()])?;

        let mut scored: Vec<(DataId, bool)> = Vec::new();
        while let Some(row) = rows.next()? {
            let id = row.get::<_, DataId>(0)?;
            let restricted = int_to_bool(row.get::<_, i64>(1)?, "raw_contacts.is_restricted")?;
            scored.push((id, restricted));
        }

        if fix_optimal {
            match scored.first() {
                Some(&(new_optimal, restricted)) => {
                    self.conn.execute(
                        &format!(
                            "UPDATE contacts SET {} = ?1, {} = ?2 WHERE id = ?3;",
                            pointer_kind.optimal_id_column(),
                            pointer_kind.optimal_is_restricted_column(),
                        ),
                        params![new_optimal, bool_to_int(restricted), contact_id],
                    )?;
                }
                None => {
                    self.conn.execute(
                        &format!(
                            "UPDATE contacts SET {} = NULL, {} = NULL WHERE id = ?1;",
                            pointer_kind.optimal_id_column(),
                            pointer_kind.optimal_is_restricted_column(),
                        ),
                        params![contact_id],
                    )?;
                }
            }
        }

        if fix_fallback {
            let new_fallback = scored
                .iter()
                .find(|(_, restricted)| !restricted)
                .map(|&(id, _)| id);
            self.conn.execute(
                &format!(
                    "UPDATE contacts SET {} = ?1 WHERE id = ?2;",
                    pointer_kind.fallback_id_column(),
                ),
                params![new_fallback, contact_id],
            )?;
        }

        Ok(())
    }

    /// Inserts the companion reverse-lookup row for a phone record.
    pub fn insert_phone_lookup(
        &self,
        data_id: DataId,
        raw_contact_id: RawContactId,
        normalized_number: &str,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO phone_lookup (data_id, raw_contact_id, normalized_number)
             VALUES (?1, ?2, ?3);",
            params![data_id, raw_contact_id, normalized_number],
        )?;
        Ok(())
    }

    /// Reverse lookup by normalized number, ascending by data id.
    pub fn lookup_phone(&self, normalized_number: &str) -> RepoResult<Vec<PhoneLookupHit>> {
        let mut stmt = self.conn.prepare(
            "SELECT data_id, raw_contact_id FROM phone_lookup
             WHERE normalized_number = ?1 ORDER BY data_id;",
        )?;
        let mut rows = stmt.query(params![normalized_number])?;
        let mut hits = Vec::new();
        while let Some(row) = rows.next()? {
            hits.push(PhoneLookupHit {
                data_id: row.get(0)?,
                raw_contact_id: row.get(1)?,
            });
        }
        Ok(hits)
    }

    /// Ids of every child row under a raw contact, ascending.
    pub fn list_ids_for_raw_contact(&self, raw_contact_id: RawContactId) -> RepoResult<Vec<DataId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM data WHERE raw_contact_id = ?1 ORDER BY id;")?;
        let mut rows = stmt.query(params![raw_contact_id])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get::<_, DataId>(0)?);
        }
        Ok(ids)
    }

    /// All child rows of a raw contact as display-name candidates,
    /// ascending by id for deterministic selection.
    pub fn list_display_candidates(
        &self,
        raw_contact_id: RawContactId,
    ) -> RepoResult<Vec<DisplayCandidate>> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, is_primary, slot1 FROM data WHERE raw_contact_id = ?1 ORDER BY id;",
        )?;
        let mut rows = stmt.query(params![raw_contact_id])?;
        let mut candidates = Vec::new();
        while let Some(row) = rows.next()? {
            candidates.push(DisplayCandidate {
                kind: RecordKind::parse(&row.get::<_, String>(0)?),
                is_primary: int_to_bool(row.get::<_, i64>(1)?, "data.is_primary")?,
                value: row.get(2)?,
            });
        }
        Ok(candidates)
    }
}

fn parse_child_row(row: &Row<'_>) -> RepoResult<ChildRecord> {
    let kind = RecordKind::parse(&row.get::<_, String>("kind")?);

    let subtype = match row.get::<_, Option<String>>("subtype")? {
        Some(text) => Some(Subtype::parse(&text).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid subtype `{text}` in data.subtype"))
        })?),
        None => None,
    };

    let mut slots = ValueSlots::default();
    for index in 0..SLOT_COUNT {
        let column = format!("slot{}", index + 1);
        if let Some(value) = row.get::<_, Option<String>>(column.as_str())? {
            slots.set(index, value);
        }
    }

    Ok(ChildRecord {
        id: row.get("id")?,
        raw_contact_id: row.get("raw_contact_id")?,
        kind,
        subtype,
        label: row.get("label")?,
        is_primary: int_to_bool(row.get::<_, i64>("is_primary")?, "data.is_primary")?,
        is_super_primary: int_to_bool(
            row.get::<_, i64>("is_super_primary")?,
            "data.is_super_primary",
        )?,
        slots,
    })
}
