//! Raw-contact and contact repository.
//!
//! # Responsibility
//! - Provide CRUD over `raw_contacts` and read access to `contacts`.
//! - Own the contact-assignment writes consumed by the external aggregator.
//!
//! # Invariants
//! - Soft delete tombstones the row and unlinks it from its contact.
//! - Cached display names are written here and derived elsewhere.

use crate::model::contact::{Contact, ContactId, NewRawContact, PrimaryPointers, RawContact, RawContactId};
use crate::repo::{bool_to_int, int_to_bool, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const RAW_CONTACT_SELECT_SQL: &str = "SELECT
    id,
    account_name,
    account_type,
    contact_id,
    display_name,
    is_restricted,
    deleted
FROM raw_contacts";

/// SQLite-backed repository for raw contacts and contacts.
pub struct RawContactRepo<'conn> {
    conn: &'conn Connection,
}

impl<'conn> RawContactRepo<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates a raw contact, unaggregated (`contact_id` NULL).
    pub fn create(&self, new: &NewRawContact) -> RepoResult<RawContactId> {
        self.conn.execute(
            "INSERT INTO raw_contacts (account_name, account_type, is_restricted)
             VALUES (?1, ?2, ?3);",
            params![
                new.account_name.as_deref(),
                new.account_type.as_deref(),
                bool_to_int(new.is_restricted),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, id: RawContactId) -> RepoResult<Option<RawContact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RAW_CONTACT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_raw_contact_row(row)?));
        }
        Ok(None)
    }

    /// Returns the contact a raw contact belongs to, `None` while
    /// unaggregated. Fails with `NotFound` when the raw contact is missing.
    pub fn contact_id_of(&self, id: RawContactId) -> RepoResult<Option<ContactId>> {
        self.conn
            .query_row(
                "SELECT contact_id FROM raw_contacts WHERE id = ?1;",
                params![id],
                |row| row.get::<_, Option<ContactId>>(0),
            )
            .optional()?
            .ok_or(RepoError::NotFound(id))
    }

    /// Writes the cached display name; an explicit NULL is permitted.
    pub fn set_display_name(
        &self,
        id: RawContactId,
        display_name: Option<&str>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE raw_contacts SET display_name = ?1 WHERE id = ?2;",
            params![display_name, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    pub fn display_name(&self, id: RawContactId) -> RepoResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT display_name FROM raw_contacts WHERE id = ?1;",
                params![id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .ok_or(RepoError::NotFound(id))
    }

    /// Tombstones a raw contact and unlinks it from its contact.
    pub fn soft_delete(&self, id: RawContactId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE raw_contacts SET deleted = 1, contact_id = NULL WHERE id = ?1;",
            params![id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    /// Hard-deletes a raw contact; child rows cascade.
    pub fn hard_delete(&self, id: RawContactId) -> RepoResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM raw_contacts WHERE id = ?1;", params![id])?;
        Ok(deleted)
    }

    /// Creates an empty contact row. Called on behalf of the external
    /// aggregator when the first raw contact joins a new aggregate.
    pub fn create_contact(&self) -> RepoResult<ContactId> {
        self.conn
            .execute("INSERT INTO contacts DEFAULT VALUES;", [])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// (Re)assigns a raw contact to a contact, or unlinks it with `None`.
    pub fn assign_to_contact(
        &self,
        id: RawContactId,
        contact_id: Option<ContactId>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE raw_contacts SET contact_id = ?1 WHERE id = ?2;",
            params![contact_id, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    pub fn get_contact(&self, contact_id: ContactId) -> RepoResult<Option<Contact>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                display_name,
                optimal_phone_id,
                optimal_phone_is_restricted,
                fallback_phone_id,
                optimal_email_id,
                optimal_email_is_restricted,
                fallback_email_id
             FROM contacts WHERE id = ?1;",
        )?;
        let mut rows = stmt.query(params![contact_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_contact_row(row)?));
        }
        Ok(None)
    }

    /// Member raw contacts of a contact, ascending by id.
    pub fn raw_contact_ids_for_contact(
        &self,
        contact_id: ContactId,
    ) -> RepoResult<Vec<RawContactId>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM raw_contacts WHERE contact_id = ?1 AND deleted = 0 ORDER BY id;",
        )?;
        let mut rows = stmt.query(params![contact_id])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get::<_, RawContactId>(0)?);
        }
        Ok(ids)
    }
}

fn parse_raw_contact_row(row: &Row<'_>) -> RepoResult<RawContact> {
    Ok(RawContact {
        id: row.get("id")?,
        account_name: row.get("account_name")?,
        account_type: row.get("account_type")?,
        contact_id: row.get("contact_id")?,
        display_name: row.get("display_name")?,
        is_restricted: int_to_bool(
            row.get::<_, i64>("is_restricted")?,
            "raw_contacts.is_restricted",
        )?,
        deleted: int_to_bool(row.get::<_, i64>("deleted")?, "raw_contacts.deleted")?,
    })
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let optimal_phone_is_restricted = row
        .get::<_, Option<i64>>("optimal_phone_is_restricted")?
        .map(|value| int_to_bool(value, "contacts.optimal_phone_is_restricted"))
        .transpose()?;
    let optimal_email_is_restricted = row
        .get::<_, Option<i64>>("optimal_email_is_restricted")?
        .map(|value| int_to_bool(value, "contacts.optimal_email_is_restricted"))
        .transpose()?;

    Ok(Contact {
        id: row.get("id")?,
        display_name: row.get("display_name")?,
        phone: PrimaryPointers {
            optimal_id: row.get("optimal_phone_id")?,
            optimal_is_restricted: optimal_phone_is_restricted,
            fallback_id: row.get("fallback_phone_id")?,
        },
        email: PrimaryPointers {
            optimal_id: row.get("optimal_email_id")?,
            optimal_is_restricted: optimal_email_is_restricted,
            fallback_id: row.get("fallback_email_id")?,
        },
    })
}
