//! Player identity normalization.
//!
//! Player identity is case-insensitive everywhere: `"Ana"`, `"ana"` and
//! `"ANA"` are the same player. The original call sites each lower-cased on
//! their own and drifted; every store-boundary crossing now goes through
//! this one function instead.

/// Canonical form of a player username: trimmed and lower-cased.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}
