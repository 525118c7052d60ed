//! Raw-contact and aggregated-contact domain model.
//!
//! # Responsibility
//! - Define raw contacts (per-account source records) and contacts
//!   (aggregates) with their cached denormalized pointers.
//! - Define aggregation-exception pairs and decisions.
//!
//! # Invariants
//! - A raw contact belongs to at most one contact at a time.
//! - Exception pairs are normalized so the lower id always comes first.
//! - An `Automatic` decision is represented by row absence, never stored.

use crate::model::record::DataId;
use serde::{Deserialize, Serialize};

/// Stable identifier for a raw contact.
pub type RawContactId = i64;

/// Stable identifier for an aggregated contact.
pub type ContactId = i64;

/// Caller-supplied fields for creating a raw contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRawContact {
    pub account_name: Option<String>,
    pub account_type: Option<String>,
    /// Marks every child record of this raw contact as restricted data.
    pub is_restricted: bool,
}

/// One source-of-truth record from one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawContact {
    pub id: RawContactId,
    pub account_name: Option<String>,
    pub account_type: Option<String>,
    /// `None` while unaggregated; assigned by the external aggregator.
    pub contact_id: Option<ContactId>,
    /// Cached display name derived from child records.
    pub display_name: Option<String>,
    pub is_restricted: bool,
    /// Soft-delete tombstone.
    pub deleted: bool,
}

/// Cached pointer pair for one record kind on a contact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryPointers {
    /// Best record regardless of restriction.
    pub optimal_id: Option<DataId>,
    /// Whether the optimal record's raw contact is restricted.
    pub optimal_is_restricted: Option<bool>,
    /// Best unrestricted record; never references restricted data.
    pub fallback_id: Option<DataId>,
}

/// The aggregate visible to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub display_name: Option<String>,
    pub phone: PrimaryPointers,
    pub email: PrimaryPointers,
}

impl Contact {
    pub fn pointers(&self, kind: PrimaryKind) -> &PrimaryPointers {
        match kind {
            PrimaryKind::Phone => &self.phone,
            PrimaryKind::Email => &self.email,
        }
    }
}

/// Record kinds that keep contact-level optimal/fallback pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryKind {
    Phone,
    Email,
}

impl PrimaryKind {
    pub fn from_record_kind(kind: &crate::model::record::RecordKind) -> Option<Self> {
        match kind {
            crate::model::record::RecordKind::Phone => Some(Self::Phone),
            crate::model::record::RecordKind::Email => Some(Self::Email),
            _ => None,
        }
    }

    pub fn optimal_id_column(self) -> &'static str {
        match self {
            Self::Phone => "optimal_phone_id",
            Self::Email => "optimal_email_id",
        }
    }

    pub fn optimal_is_restricted_column(self) -> &'static str {
        match self {
            Self::Phone => "optimal_phone_is_restricted",
            Self::Email => "optimal_email_is_restricted",
        }
    }

    pub fn fallback_id_column(self) -> &'static str {
        match self {
            Self::Phone => "fallback_phone_id",
            Self::Email => "fallback_email_id",
        }
    }
}

/// Manual override decision for a raw contact pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionDecision {
    /// No override; represented by row absence.
    Automatic,
    KeepIn,
    KeepOut,
}

impl ExceptionDecision {
    /// Stable string id used for storage. `Automatic` is never persisted.
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Self::Automatic => None,
            Self::KeepIn => Some("keep_in"),
            Self::KeepOut => Some("keep_out"),
        }
    }

    /// Parses a stored decision string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "keep_in" => Some(Self::KeepIn),
            "keep_out" => Some(Self::KeepOut),
            _ => None,
        }
    }
}

/// Ordered raw contact pair with the lower id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawContactPair {
    pub lower: RawContactId,
    pub higher: RawContactId,
}

impl RawContactPair {
    /// Normalizes so `lower < higher` regardless of argument order.
    pub fn new(a: RawContactId, b: RawContactId) -> Self {
        if a < b {
            Self { lower: a, higher: b }
        } else {
            Self {
                lower: b,
                higher: a,
            }
        }
    }
}
