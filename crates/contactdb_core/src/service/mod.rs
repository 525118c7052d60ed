//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into transaction-safe operations.
//! - Keep callers decoupled from storage details.
//!
//! # Invariants
//! - Every mutation commits all of its cascading fix-ups or none of them.
//! - Service APIs never bypass payload validation.

use crate::db::DbError;
use crate::model::record::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod aggregator;
pub mod contact_service;
pub mod display_name;
pub mod handlers;
pub mod name_split;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from contact service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Caller-supplied payload violates a kind's contract; rejected before
    /// any write.
    Validation(ValidationError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::Db(DbError::Sqlite(value)))
    }
}
