//! Child-record domain model and type-rank policy.
//!
//! # Responsibility
//! - Define the typed fact (`ChildRecord`) owned by a raw contact.
//! - Define the closed set of record kinds plus a custom fallback.
//! - Provide the per-kind subtype ranking used to pick primaries.
//!
//! # Invariants
//! - At most one child record of a given kind per raw contact is primary.
//! - At most one child record of a given kind per contact is super-primary.
//! - Slot meaning is kind-specific; indexes may overlap across kinds.

use crate::model::contact::RawContactId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier for a child record (data row).
pub type DataId = i64;

/// Rank assigned to subtypes no kind ranking recognizes.
///
/// Ranks worse than every named subtype so unknown values never win a
/// primary promotion over known ones.
pub const UNRANKED: u32 = 1000;

/// Number of positional value slots per child record.
pub const SLOT_COUNT: usize = 15;

/// Slot indexes with kind-specific meaning.
///
/// Indexes overlap across kinds by design; only `VALUE` is shared.
pub mod slot {
    /// Canonical value: phone number, email address, company, full name.
    pub const VALUE: usize = 0;

    // Structured name components.
    pub const GIVEN_NAME: usize = 1;
    pub const FAMILY_NAME: usize = 2;
    pub const PREFIX: usize = 3;
    pub const MIDDLE_NAME: usize = 4;
    pub const SUFFIX: usize = 5;

    /// Phone only: reversed, stripped number for reverse lookup.
    pub const NORMALIZED_NUMBER: usize = 3;
}

/// Closed set of known record kinds with a custom fallback.
///
/// Unknown kinds are carried as `Custom` and handled generically instead
/// of through open-ended runtime registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Name,
    Phone,
    Email,
    Organization,
    Im,
    Nickname,
    Postal,
    Custom(String),
}

impl RecordKind {
    /// Stable string id used for storage.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Organization => "organization",
            Self::Im => "im",
            Self::Nickname => "nickname",
            Self::Postal => "postal",
            Self::Custom(kind) => kind.as_str(),
        }
    }

    /// Parses a stored kind string; unknown values become `Custom`.
    pub fn parse(value: &str) -> Self {
        match value {
            "name" => Self::Name,
            "phone" => Self::Phone,
            "email" => Self::Email,
            "organization" => Self::Organization,
            "im" => Self::Im,
            "nickname" => Self::Nickname,
            "postal" => Self::Postal,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Whether this kind carries a subtype/label pair subject to the
    /// custom-label contract.
    pub fn has_subtype(&self) -> bool {
        matches!(
            self,
            Self::Phone | Self::Email | Self::Organization | Self::Im | Self::Nickname | Self::Postal
        )
    }

    /// Whether contact-level optimal/fallback pointers are kept for this kind.
    pub fn has_contact_pointers(&self) -> bool {
        matches!(self, Self::Phone | Self::Email)
    }

    /// Display-name priority; higher wins. `None` means the kind never
    /// contributes to a display name.
    pub fn display_name_priority(&self) -> Option<u32> {
        match self {
            Self::Name => Some(4),
            Self::Organization => Some(3),
            Self::Phone => Some(2),
            Self::Email => Some(1),
            _ => None,
        }
    }

    /// Returns the rank of a subtype for this kind; lower wins when picking
    /// a replacement primary. Kinds without a declared ranking return a
    /// constant, making every record tie.
    pub fn type_rank(&self, subtype: Option<Subtype>) -> u32 {
        match self {
            Self::Phone => match subtype {
                Some(Subtype::Mobile) => 0,
                Some(Subtype::Work) => 1,
                Some(Subtype::Home) => 2,
                Some(Subtype::Pager) => 3,
                Some(Subtype::Custom) => 4,
                Some(Subtype::Other) => 5,
                Some(Subtype::FaxWork) => 6,
                Some(Subtype::FaxHome) => 7,
                _ => UNRANKED,
            },
            Self::Email => match subtype {
                Some(Subtype::Home) => 0,
                Some(Subtype::Work) => 1,
                Some(Subtype::Custom) => 2,
                Some(Subtype::Other) => 3,
                _ => UNRANKED,
            },
            Self::Organization => match subtype {
                Some(Subtype::Work) => 0,
                Some(Subtype::Custom) => 1,
                Some(Subtype::Other) => 2,
                _ => UNRANKED,
            },
            _ => 0,
        }
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subtype of a child record within its kind.
///
/// One shared set; each kind ranks the subset it recognizes and treats the
/// rest as unranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subtype {
    Mobile,
    Work,
    Home,
    Pager,
    Custom,
    Other,
    FaxWork,
    FaxHome,
}

impl Subtype {
    /// Stable string id used for storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Work => "work",
            Self::Home => "home",
            Self::Pager => "pager",
            Self::Custom => "custom",
            Self::Other => "other",
            Self::FaxWork => "fax_work",
            Self::FaxHome => "fax_home",
        }
    }

    /// Parses a stored subtype string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mobile" => Some(Self::Mobile),
            "work" => Some(Self::Work),
            "home" => Some(Self::Home),
            "pager" => Some(Self::Pager),
            "custom" => Some(Self::Custom),
            "other" => Some(Self::Other),
            "fax_work" => Some(Self::FaxWork),
            "fax_home" => Some(Self::FaxHome),
            _ => None,
        }
    }
}

/// Validation failures for caller-supplied child-record payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A custom subtype was given (or defaulted) without an explicit label.
    CustomSubtypeRequiresLabel { kind: String },
    /// A label was given together with a non-custom subtype.
    LabelRequiresCustomSubtype { kind: String },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CustomSubtypeRequiresLabel { kind } => write!(
                f,
                "kind `{kind}`: a label must be specified when subtype is custom"
            ),
            Self::LabelRequiresCustomSubtype { kind } => write!(
                f,
                "kind `{kind}`: a label can only be specified with subtype custom"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Positional value slots of one child record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSlots([Option<String>; SLOT_COUNT]);

impl ValueSlots {
    /// Returns the slot value at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|value| value.as_deref())
    }

    /// Sets the slot value at `index`; out-of-range indexes are ignored.
    pub fn set(&mut self, index: usize, value: impl Into<String>) {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = Some(value.into());
        }
    }

    /// Clears the slot value at `index`.
    pub fn clear(&mut self, index: usize) {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = None;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.0.iter().map(|value| value.as_deref())
    }
}

/// Caller-supplied payload for inserting one child record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChildRecord {
    pub subtype: Option<Subtype>,
    pub label: Option<String>,
    /// Request promotion to the raw contact's primary for this kind.
    pub primary: bool,
    pub slots: ValueSlots,
}

impl NewChildRecord {
    /// Creates a payload carrying only the canonical value slot.
    pub fn with_value(value: impl Into<String>) -> Self {
        let mut payload = Self::default();
        payload.slots.set(slot::VALUE, value);
        payload
    }

    pub fn subtype(mut self, subtype: Subtype) -> Self {
        self.subtype = Some(subtype);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Checks the subtype/label contract for subtype-bearing kinds.
    ///
    /// An absent subtype counts as custom for validation purposes, so a
    /// bare payload on a subtype-bearing kind must carry a label.
    pub fn validate_for(&self, kind: &RecordKind) -> Result<(), ValidationError> {
        if !kind.has_subtype() {
            return Ok(());
        }

        let effective = self.subtype.unwrap_or(Subtype::Custom);
        if effective == Subtype::Custom && self.label.is_none() {
            return Err(ValidationError::CustomSubtypeRequiresLabel {
                kind: kind.as_str().to_string(),
            });
        }
        if effective != Subtype::Custom && self.label.is_some() {
            return Err(ValidationError::LabelRequiresCustomSubtype {
                kind: kind.as_str().to_string(),
            });
        }
        Ok(())
    }
}

/// One persisted typed fact belonging to a raw contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRecord {
    pub id: DataId,
    pub raw_contact_id: RawContactId,
    pub kind: RecordKind,
    pub subtype: Option<Subtype>,
    pub label: Option<String>,
    pub is_primary: bool,
    pub is_super_primary: bool,
    pub slots: ValueSlots,
}

impl ChildRecord {
    /// The record's canonical value, when present.
    pub fn value(&self) -> Option<&str> {
        self.slots.get(slot::VALUE)
    }

    /// Rank of this record under the type-rank policy of its kind.
    pub fn type_rank(&self) -> u32 {
        self.kind.type_rank(self.subtype)
    }
}

#[cfg(test)]
mod tests {
    use super::{NewChildRecord, RecordKind, Subtype, ValidationError, UNRANKED};

    #[test]
    fn phone_rank_orders_mobile_before_work_before_home() {
        let phone = RecordKind::Phone;
        assert!(phone.type_rank(Some(Subtype::Mobile)) < phone.type_rank(Some(Subtype::Work)));
        assert!(phone.type_rank(Some(Subtype::Work)) < phone.type_rank(Some(Subtype::Home)));
        assert!(phone.type_rank(Some(Subtype::Custom)) < phone.type_rank(Some(Subtype::FaxHome)));
        assert_eq!(phone.type_rank(None), UNRANKED);
    }

    #[test]
    fn unranked_kinds_tie_at_constant_rank() {
        assert_eq!(RecordKind::Name.type_rank(None), 0);
        assert_eq!(RecordKind::Name.type_rank(Some(Subtype::Work)), 0);
        assert_eq!(
            RecordKind::Custom("favorite_color".to_string()).type_rank(Some(Subtype::Home)),
            0
        );
    }

    #[test]
    fn kind_round_trips_through_storage_string() {
        for kind in [
            RecordKind::Name,
            RecordKind::Phone,
            RecordKind::Email,
            RecordKind::Organization,
            RecordKind::Custom("x-relation".to_string()),
        ] {
            assert_eq!(RecordKind::parse(kind.as_str()), kind);
        }
    }

    #[test]
    fn custom_subtype_requires_label() {
        let payload = NewChildRecord::with_value("555-1234").subtype(Subtype::Custom);
        let err = payload.validate_for(&RecordKind::Phone).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::CustomSubtypeRequiresLabel { .. }
        ));

        let labeled = NewChildRecord::with_value("555-1234")
            .subtype(Subtype::Custom)
            .label("direct line");
        assert!(labeled.validate_for(&RecordKind::Phone).is_ok());
    }

    #[test]
    fn absent_subtype_defaults_to_custom_for_validation() {
        let bare = NewChildRecord::with_value("555-1234");
        assert!(bare.validate_for(&RecordKind::Phone).is_err());
        // Kinds without subtypes skip the contract entirely.
        assert!(bare.validate_for(&RecordKind::Name).is_ok());
    }

    #[test]
    fn label_with_named_subtype_is_rejected() {
        let payload = NewChildRecord::with_value("a@b.example")
            .subtype(Subtype::Work)
            .label("work-ish");
        let err = payload.validate_for(&RecordKind::Email).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::LabelRequiresCustomSubtype { .. }
        ));
    }
}
