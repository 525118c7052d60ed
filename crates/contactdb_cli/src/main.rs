//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `contactdb_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("contactdb_core ping={}", contactdb_core::ping());
    println!("contactdb_core version={}", contactdb_core::core_version());
}
