//! Phone number normalization for reverse lookup.
//!
//! # Responsibility
//! - Produce the stored, reversed form of a dialable number so suffix
//!   lookups become prefix lookups on an indexed column.
//!
//! # Invariants
//! - Normalization is pure and deterministic.
//! - Formatting characters never influence the normalized form.

/// Returns the reversed, stripped form of `number`, or `None` when the
/// input contains no dialable characters.
///
/// Keeps digits and `+`, drops separators and everything after a pause or
/// wait control character, then reverses the result.
pub fn normalized_reversed(number: &str) -> Option<String> {
    let mut stripped = String::with_capacity(number.len());
    for ch in number.chars() {
        match ch {
            '0'..='9' | '+' | '*' | '#' => stripped.push(ch),
            // Post-dial pause/wait: the network portion ends here.
            ',' | ';' => break,
            _ => {}
        }
    }

    if stripped.is_empty() {
        return None;
    }
    Some(stripped.chars().rev().collect())
}

#[cfg(test)]
mod tests {
    use super::normalized_reversed;

    #[test]
    fn strips_separators_and_reverses() {
        assert_eq!(
            normalized_reversed("(650) 555-1234").as_deref(),
            Some("4321555056")
        );
        assert_eq!(
            normalized_reversed("+1-650-555-1234").as_deref(),
            Some("43215550561+")
        );
    }

    #[test]
    fn stops_at_pause_and_wait_characters() {
        assert_eq!(normalized_reversed("555-1234,890").as_deref(), Some("4321555"));
        assert_eq!(normalized_reversed("555-1234;890").as_deref(), Some("4321555"));
    }

    #[test]
    fn returns_none_without_dialable_characters() {
        assert_eq!(normalized_reversed(""), None);
        assert_eq!(normalized_reversed("call me"), None);
    }

    #[test]
    fn same_number_in_different_formats_normalizes_identically() {
        assert_eq!(
            normalized_reversed("650 555 1234"),
            normalized_reversed("(650)555-1234")
        );
    }
}
