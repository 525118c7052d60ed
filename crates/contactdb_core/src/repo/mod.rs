//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access over the contact schema.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repositories borrow a connection, so they compose transparently with
//!   transactions opened by the service layer.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod data_repo;
pub mod exception_repo;
pub mod raw_contact_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for contact persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Operation required a row that does not exist.
    NotFound(i64),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "row not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
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

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, context: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {context}"
        ))),
    }
}
