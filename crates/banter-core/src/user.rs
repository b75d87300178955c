//! User account records.

use serde::{Deserialize, Serialize};

/// A registered local account.
///
/// Credentials are stored and compared in plaintext; this is a
/// single-machine convenience login, not a security boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,
    pub password: String,
    pub created_at: i64,
}

/// The remember-me record written to local preferences on login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRecord {
    pub username: String,
    pub logged_in: bool,
}
