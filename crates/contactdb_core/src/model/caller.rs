//! Caller access context for restricted data.
//!
//! # Responsibility
//! - Resolve caller identity into a restricted/general access decision.
//! - Select which cached pointer set (optimal vs fallback) a caller reads.
//!
//! # Invariants
//! - Access is decided once per call and passed explicitly; core never
//!   consults process-global caller state.
//! - General callers never observe restricted rows or pointers.

use serde::{Deserialize, Serialize};

/// Per-call access context derived from caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    /// Whether the caller may read restricted data.
    pub restricted: bool,
}

impl CallerContext {
    /// A caller holding the restricted-data grant.
    pub fn restricted() -> Self {
        Self { restricted: true }
    }

    /// A caller without the restricted-data grant.
    pub fn general() -> Self {
        Self { restricted: false }
    }

    /// Resolves a caller's package identities against an allow-list.
    ///
    /// The package set comes from the external caller-identity resolver;
    /// any overlap with the allow-list grants restricted access.
    pub fn resolve(caller_packages: &[&str], allow_list: &[&str]) -> Self {
        let restricted = caller_packages
            .iter()
            .any(|package| allow_list.contains(package));
        Self { restricted }
    }

    /// SQL predicate limiting raw-contact visibility for this caller.
    ///
    /// Restricted callers see everything (always-true filter); general
    /// callers only see unrestricted raw contacts.
    pub fn raw_contact_visibility_clause(&self) -> &'static str {
        if self.restricted {
            "1"
        } else {
            "raw_contacts.is_restricted = 0"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CallerContext;

    #[test]
    fn resolve_grants_restricted_access_on_allow_list_match() {
        let allow = ["com.example.contacts", "com.example.social"];
        let granted = CallerContext::resolve(&["com.example.social"], &allow);
        assert!(granted.restricted);

        let denied = CallerContext::resolve(&["com.example.flashlight"], &allow);
        assert!(!denied.restricted);

        let empty = CallerContext::resolve(&[], &allow);
        assert!(!empty.restricted);
    }

    #[test]
    fn visibility_clause_matches_access_level() {
        assert_eq!(CallerContext::restricted().raw_contact_visibility_clause(), "1");
        assert_eq!(
            CallerContext::general().raw_contact_visibility_clause(),
            "raw_contacts.is_restricted = 0"
        );
    }
}
