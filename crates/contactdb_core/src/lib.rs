//! Core domain logic for the contact store.
//! This crate is the single source of truth for denormalized-value
//! consistency: primary flags, super-primary flags, contact pointer
//! caches, display names, phone lookup rows, and aggregation exceptions.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::caller::CallerContext;
pub use model::contact::{
    Contact, ContactId, ExceptionDecision, NewRawContact, PrimaryKind, RawContact, RawContactId,
    RawContactPair,
};
pub use model::record::{
    ChildRecord, DataId, NewChildRecord, RecordKind, Subtype, ValidationError, ValueSlots,
};
pub use repo::{RepoError, RepoResult};
pub use service::contact_service::{ContactService, Operation, OperationOutcome};
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
