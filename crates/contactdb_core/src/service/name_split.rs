//! Structured-name splitting seam.
//!
//! # Responsibility
//! - Define the splitter contract consumed by the name-kind handler.
//! - Provide a basic whitespace/prefix/suffix implementation.
//!
//! # Invariants
//! - Splitting is pure; locale-aware splitters can be plugged in at the
//!   trait seam without touching handler code.

use once_cell::sync::Lazy;
use regex::Regex;

/// Components of a split full name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredNameParts {
    pub prefix: Option<String>,
    pub given: Option<String>,
    pub middle: Option<String>,
    pub family: Option<String>,
    pub suffix: Option<String>,
}

/// Splits a full display name into structured components.
pub trait NameSplitter {
    fn split(&self, full_name: &str) -> StructuredNameParts;
}

static TRAILING_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.,]+$").expect("trailing punctuation pattern is valid"));

const NAME_PREFIXES: &[&str] = &["mr", "mrs", "ms", "miss", "dr", "prof", "sir"];
const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "phd", "md", "esq"];

/// Whitespace tokenizer with common English prefix/suffix recognition.
///
/// Good enough as a default; callers with locale requirements supply their
/// own [`NameSplitter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleNameSplitter;

impl NameSplitter for SimpleNameSplitter {
    fn split(&self, full_name: &str) -> StructuredNameParts {
        let mut tokens: Vec<&str> = full_name.split_whitespace().collect();
        let mut parts = StructuredNameParts::default();

        if tokens.len() > 1 && is_name_prefix(tokens[0]) {
            parts.prefix = Some(tokens.remove(0).to_string());
        }
        if tokens.len() > 1 && is_name_suffix(tokens[tokens.len() - 1]) {
            let suffix = tokens.remove(tokens.len() - 1);
            parts.suffix = Some(suffix.to_string());
        }

        match tokens.len() {
            0 => {}
            1 => parts.given = Some(tokens[0].to_string()),
            _ => {
                parts.given = Some(tokens[0].to_string());
                parts.family = Some(tokens[tokens.len() - 1].to_string());
                if tokens.len() > 2 {
                    parts.middle = Some(tokens[1..tokens.len() - 1].join(" "));
                }
            }
        }

        parts
    }
}

fn normalize_token(token: &str) -> String {
    TRAILING_PUNCTUATION
        .replace(token, "")
        .to_ascii_lowercase()
}

fn is_name_prefix(token: &str) -> bool {
    NAME_PREFIXES.contains(&normalize_token(token).as_str())
}

fn is_name_suffix(token: &str) -> bool {
    NAME_SUFFIXES.contains(&normalize_token(token).as_str())
}
