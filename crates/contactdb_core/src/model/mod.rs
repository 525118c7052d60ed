//! Domain model for the contact store.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep record-kind policy (ranking, validation) next to the types.
//!
//! # Invariants
//! - Every domain object is identified by a stable store-assigned id.
//! - Raw-contact deletion is represented by soft-delete tombstones.

pub mod caller;
pub mod contact;
pub mod phone;
pub mod record;
