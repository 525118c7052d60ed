//! Transaction-owning facade over the contact store.
//!
//! # Responsibility
//! - Expose the public mutation and read operations.
//! - Wrap every mutation (and every batch) in exactly one transaction.
//! - Fire aggregator triggers alongside the mutations that need them.
//!
//! # Invariants
//! - A mutation's cascading fix-ups commit with it or not at all.
//! - Batches are all-or-nothing; one failed operation rolls back the rest.
//! - Reads never open write transactions.

use crate::model::caller::CallerContext;
use crate::model::contact::{
    Contact, ContactId, ExceptionDecision, NewRawContact, PrimaryKind, RawContact, RawContactId,
    RawContactPair,
};
use crate::model::phone::normalized_reversed;
use crate::model::record::{ChildRecord, DataId, NewChildRecord, RecordKind};
use crate::repo::data_repo::{DataRepo, PhoneLookupHit};
use crate::repo::exception_repo::ExceptionRepo;
use crate::repo::raw_contact_repo::RawContactRepo;
use crate::repo::RepoError;
use crate::service::aggregator::{Aggregator, NoopAggregator};
use crate::service::name_split::{NameSplitter, SimpleNameSplitter};
use crate::service::{handlers, ServiceResult};
use log::info;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// One operation in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Operation {
    InsertChild {
        raw_contact_id: RawContactId,
        kind: RecordKind,
        payload: NewChildRecord,
    },
    DeleteChild {
        data_id: DataId,
    },
    SetPrimary {
        data_id: DataId,
    },
    SetSuperPrimary {
        data_id: DataId,
    },
    SyncAggregationException {
        raw_contact_id: RawContactId,
        target_raw_contact_id: RawContactId,
        decision: ExceptionDecision,
    },
}

/// Result of one batch operation, in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationOutcome {
    Inserted(DataId),
    Affected(usize),
    Done,
}

/// The public entry point for mutating and reading contact data.
///
/// Owns the connection mutably so each mutation can open its transaction.
pub struct ContactService<'conn, A: Aggregator, S: NameSplitter> {
    conn: &'conn mut Connection,
    aggregator: A,
    splitter: S,
}

impl<'conn> ContactService<'conn, NoopAggregator, SimpleNameSplitter> {
    /// Service with the no-op aggregator and the simple name splitter.
    pub fn with_defaults(conn: &'conn mut Connection) -> Self {
        Self::new(conn, NoopAggregator, SimpleNameSplitter)
    }
}

impl<'conn, A: Aggregator, S: NameSplitter> ContactService<'conn, A, S> {
    pub fn new(conn: &'conn mut Connection, aggregator: A, splitter: S) -> Self {
        Self {
            conn,
            aggregator,
            splitter,
        }
    }

    /// Creates an unaggregated raw contact.
    pub fn create_raw_contact(&mut self, new: &NewRawContact) -> ServiceResult<RawContactId> {
        let tx = self.conn.transaction()?;
        let id = RawContactRepo::new(&tx).create(new)?;
        tx.commit()?;
        info!("event=raw_contact_create module=contact_service status=ok raw_contact_id={id}");
        Ok(id)
    }

    pub fn get_raw_contact(&self, id: RawContactId) -> ServiceResult<Option<RawContact>> {
        Ok(RawContactRepo::new(self.conn).get(id)?)
    }

    /// Tombstones a raw contact and unlinks it from its contact.
    pub fn soft_delete_raw_contact(&mut self, id: RawContactId) -> ServiceResult<()> {
        let tx = self.conn.transaction()?;
        RawContactRepo::new(&tx).soft_delete(id)?;
        tx.commit()?;
        info!("event=raw_contact_soft_delete module=contact_service status=ok raw_contact_id={id}");
        Ok(())
    }

    /// Hard-deletes a raw contact; its child records and lookup rows cascade.
    pub fn hard_delete_raw_contact(&mut self, id: RawContactId) -> ServiceResult<usize> {
        let tx = self.conn.transaction()?;
        let deleted = RawContactRepo::new(&tx).hard_delete(id)?;
        tx.commit()?;
        info!(
            "event=raw_contact_hard_delete module=contact_service status=ok \
             raw_contact_id={id} deleted={deleted}"
        );
        Ok(deleted)
    }

    /// Creates an empty contact aggregate on behalf of the external
    /// aggregator.
    pub fn create_contact(&mut self) -> ServiceResult<ContactId> {
        let tx = self.conn.transaction()?;
        let id = RawContactRepo::new(&tx).create_contact()?;
        tx.commit()?;
        info!("event=contact_create module=contact_service status=ok contact_id={id}");
        Ok(id)
    }

    /// (Re)assigns a raw contact to a contact, then lets the aggregator
    /// refresh the affected aggregates.
    pub fn assign_raw_contact(
        &mut self,
        raw_contact_id: RawContactId,
        contact_id: Option<ContactId>,
    ) -> ServiceResult<()> {
        let tx = self.conn.transaction()?;
        let previous = RawContactRepo::new(&tx).contact_id_of(raw_contact_id)?;
        RawContactRepo::new(&tx).assign_to_contact(raw_contact_id, contact_id)?;
        if let Some(previous) = previous {
            self.aggregator.refresh_aggregate_data(&tx, previous)?;
        }
        if let Some(contact_id) = contact_id {
            self.aggregator.refresh_aggregate_data(&tx, contact_id)?;
        }
        tx.commit()?;
        info!(
            "event=raw_contact_assign module=contact_service status=ok \
             raw_contact_id={raw_contact_id} contact_id={contact_id:?}"
        );
        Ok(())
    }

    pub fn get_contact(&self, contact_id: ContactId) -> ServiceResult<Option<Contact>> {
        Ok(RawContactRepo::new(self.conn).get_contact(contact_id)?)
    }

    /// Inserts one child record with validation, kind fix-ups, primary
    /// promotion, and display-name derivation.
    pub fn insert_child(
        &mut self,
        raw_contact_id: RawContactId,
        kind: &RecordKind,
        payload: NewChildRecord,
    ) -> ServiceResult<DataId> {
        let tx = self.conn.transaction()?;
        let data_id = handlers::insert_child(&tx, &self.splitter, raw_contact_id, kind, payload)?;
        self.aggregator.mark_for_aggregation(&tx, raw_contact_id)?;
        tx.commit()?;
        info!(
            "event=child_insert module=contact_service status=ok \
             data_id={data_id} raw_contact_id={raw_contact_id} kind={kind}"
        );
        Ok(data_id)
    }

    pub fn get_child(&self, data_id: DataId) -> ServiceResult<Option<ChildRecord>> {
        Ok(DataRepo::new(self.conn).get(data_id)?)
    }

    /// Deletes one child record and repairs its caches. Returns the number
    /// of rows removed (0 for an unknown id).
    pub fn delete_child(&mut self, data_id: DataId) -> ServiceResult<usize> {
        let tx = self.conn.transaction()?;
        let deleted = handlers::delete_child(&tx, data_id)?;
        tx.commit()?;
        info!(
            "event=child_delete module=contact_service status=ok \
             data_id={data_id} deleted={deleted}"
        );
        Ok(deleted)
    }

    /// Deletes every child record of a raw contact, one fix-up cascade per
    /// row, in a single transaction.
    pub fn delete_children_of(&mut self, raw_contact_id: RawContactId) -> ServiceResult<usize> {
        let tx = self.conn.transaction()?;
        let ids = DataRepo::new(&tx).list_ids_for_raw_contact(raw_contact_id)?;
        let mut deleted = 0;
        for data_id in ids {
            deleted += handlers::delete_child(&tx, data_id)?;
        }
        tx.commit()?;
        info!(
            "event=children_delete module=contact_service status=ok \
             raw_contact_id={raw_contact_id} deleted={deleted}"
        );
        Ok(deleted)
    }

    /// Flags a record primary for its kind under its raw contact.
    pub fn set_primary(&mut self, data_id: DataId) -> ServiceResult<()> {
        let tx = self.conn.transaction()?;
        DataRepo::new(&tx).set_primary(data_id)?;
        tx.commit()?;
        info!("event=set_primary module=contact_service status=ok data_id={data_id}");
        Ok(())
    }

    /// Flags a record super-primary across its whole contact and refreshes
    /// the contact's cached pointers.
    pub fn set_super_primary(&mut self, data_id: DataId) -> ServiceResult<()> {
        let tx = self.conn.transaction()?;
        DataRepo::new(&tx).set_super_primary(data_id)?;
        tx.commit()?;
        info!("event=set_super_primary module=contact_service status=ok data_id={data_id}");
        Ok(())
    }

    /// Records a manual aggregation decision between `raw_contact_id`'s
    /// contact and `target_raw_contact_id`.
    ///
    /// The decision fans out to every member of the contact so it survives
    /// later re-aggregation. Succeeds even when nothing needed to change.
    pub fn sync_aggregation_exception(
        &mut self,
        raw_contact_id: RawContactId,
        target_raw_contact_id: RawContactId,
        decision: ExceptionDecision,
    ) -> ServiceResult<()> {
        let tx = self.conn.transaction()?;
        sync_exception_tx(
            &tx,
            &self.aggregator,
            raw_contact_id,
            target_raw_contact_id,
            decision,
        )?;
        tx.commit()?;
        info!(
            "event=exception_sync module=contact_service status=ok \
             raw_contact_id={raw_contact_id} target={target_raw_contact_id} \
             decision={decision:?}"
        );
        Ok(())
    }

    /// Resolves the best record of a pointer-backed kind for a caller:
    /// restricted callers read the optimal pointer, general callers the
    /// fallback pointer.
    pub fn read_optimal_or_fallback(
        &self,
        contact_id: ContactId,
        kind: PrimaryKind,
        caller: CallerContext,
    ) -> ServiceResult<Option<ChildRecord>> {
        let contact = RawContactRepo::new(self.conn)
            .get_contact(contact_id)?
            .ok_or(RepoError::NotFound(contact_id))?;
        let pointers = contact.pointers(kind);
        let pointer = if caller.restricted {
            pointers.optimal_id
        } else {
            pointers.fallback_id
        };
        match pointer {
            Some(data_id) => Ok(DataRepo::new(self.conn).get(data_id)?),
            None => Ok(None),
        }
    }

    pub fn display_name(&self, raw_contact_id: RawContactId) -> ServiceResult<Option<String>> {
        Ok(RawContactRepo::new(self.conn).display_name(raw_contact_id)?)
    }

    /// Children of one kind across a contact, filtered by the caller's
    /// restricted-data visibility.
    pub fn list_children(
        &self,
        contact_id: ContactId,
        kind: &RecordKind,
        caller: CallerContext,
    ) -> ServiceResult<Vec<ChildRecord>> {
        Ok(DataRepo::new(self.conn).list_for_contact(contact_id, kind, caller)?)
    }

    /// Reverse phone lookup. Un-normalizable input matches nothing.
    pub fn lookup_phone(&self, number: &str) -> ServiceResult<Vec<PhoneLookupHit>> {
        match normalized_reversed(number) {
            Some(normalized) => Ok(DataRepo::new(self.conn).lookup_phone(&normalized)?),
            None => Ok(Vec::new()),
        }
    }

    /// Applies a batch of operations in one transaction; any failure rolls
    /// back the whole batch.
    pub fn apply(&mut self, operations: Vec<Operation>) -> ServiceResult<Vec<OperationOutcome>> {
        let count = operations.len();
        let tx = self.conn.transaction()?;
        let mut outcomes = Vec::with_capacity(count);
        for operation in operations {
            let outcome = match operation {
                Operation::InsertChild {
                    raw_contact_id,
                    kind,
                    payload,
                } => {
                    let data_id =
                        handlers::insert_child(&tx, &self.splitter, raw_contact_id, &kind, payload)?;
                    self.aggregator.mark_for_aggregation(&tx, raw_contact_id)?;
                    OperationOutcome::Inserted(data_id)
                }
                Operation::DeleteChild { data_id } => {
                    OperationOutcome::Affected(handlers::delete_child(&tx, data_id)?)
                }
                Operation::SetPrimary { data_id } => {
                    DataRepo::new(&tx).set_primary(data_id)?;
                    OperationOutcome::Done
                }
                Operation::SetSuperPrimary { data_id } => {
                    DataRepo::new(&tx).set_super_primary(data_id)?;
                    OperationOutcome::Done
                }
                Operation::SyncAggregationException {
                    raw_contact_id,
                    target_raw_contact_id,
                    decision,
                } => {
                    sync_exception_tx(
                        &tx,
                        &self.aggregator,
                        raw_contact_id,
                        target_raw_contact_id,
                        decision,
                    )?;
                    OperationOutcome::Done
                }
            };
            outcomes.push(outcome);
        }
        tx.commit()?;
        info!("event=batch_apply module=contact_service status=ok operations={count}");
        Ok(outcomes)
    }
}

/// Fans an exception decision out to every (member, target) pair of the
/// source raw contact's contact.
///
/// An unaggregated source has no member list to fan out to; it still
/// contributes the single (source, target) pair so a decision recorded
/// before first aggregation is not lost.
fn sync_exception_tx<A: Aggregator>(
    conn: &Connection,
    aggregator: &A,
    raw_contact_id: RawContactId,
    target_raw_contact_id: RawContactId,
    decision: ExceptionDecision,
) -> ServiceResult<()> {
    let raw_repo = RawContactRepo::new(conn);
    let contact_id = raw_repo.contact_id_of(raw_contact_id)?;

    let members = match contact_id {
        Some(contact_id) => raw_repo.raw_contact_ids_for_contact(contact_id)?,
        None => vec![raw_contact_id],
    };

    let exception_repo = ExceptionRepo::new(conn);
    for member in members {
        if member == target_raw_contact_id {
            continue;
        }
        exception_repo.apply(RawContactPair::new(member, target_raw_contact_id), decision)?;
    }

    aggregator.mark_for_aggregation(conn, target_raw_contact_id)?;
    if let (Some(contact_id), ExceptionDecision::KeepIn | ExceptionDecision::KeepOut) =
        (contact_id, decision)
    {
        aggregator.refresh_aggregate_data(conn, contact_id)?;
    }
    Ok(())
}
