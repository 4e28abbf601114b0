//! Login user list and credential verification.
//!
//! Users live in a JSON file next to the service. New entries carry a
//! bcrypt `password_hash`; some legacy entries still have a plain
//! `password` and are verified by comparison until they are migrated.

use quiniela_rust_core::utils::normalize_username;
use serde::Deserialize;
use std::fs;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_hash: Option<String>,
}

/// Load the user list. A missing or malformed file disables login rather
/// than failing startup; the read endpoints still work.
pub fn load_users(path: &str) -> Vec<UserRecord> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Could not read users file {}: {}. Login disabled", path, e);
            return Vec::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(users) => users,
        Err(e) => {
            warn!("Could not parse users file {}: {}. Login disabled", path, e);
            Vec::new()
        }
    }
}

/// Verify a login attempt. Returns the stored username (original casing)
/// on success.
pub fn verify_login(users: &[UserRecord], username: &str, password: &str) -> Option<String> {
    let wanted = normalize_username(username);
    let user = users
        .iter()
        .find(|u| normalize_username(&u.username) == wanted)?;

    let valid = if let Some(hash) = &user.password_hash {
        bcrypt::verify(password, hash).unwrap_or(false)
    } else if let Some(plain) = &user.password {
        plain == password
    } else {
        false
    };

    valid.then(|| user.username.clone())
}
