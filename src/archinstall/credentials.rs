//! Credentials document (`--creds`)

use crate::config::UserInput;
use crate::utils::error::Result;
use serde::Serialize;

/// Plaintext passwords for root and the single user account.
///
/// The `!` prefix marks keys archinstall treats as secrets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialsDocument {
    #[serde(rename = "!root-password")]
    pub root_password: String,
    #[serde(rename = "!users")]
    pub users: Vec<UserCredentials>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserCredentials {
    pub username: String,
    #[serde(rename = "!password")]
    pub password: String,
    pub sudo: bool,
}

impl CredentialsDocument {
    pub fn from_input(input: &UserInput) -> Self {
        Self {
            root_password: input.root_password.clone(),
            users: vec![UserCredentials {
                username: input.username.clone(),
                password: input.user_password.clone(),
                sudo: input.sudo,
            }],
        }
    }

    /// Pretty-printed JSON, two-space indented
    pub fn render(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
