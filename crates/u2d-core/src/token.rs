//! Bearer token loading from an authorized-user JSON file.
//!
//! The vendor auth SDK saves credentials as JSON with the access token under
//! `token`; raw OAuth token responses use `access_token`. Only the access
//! token is read. Obtaining or refreshing it happens elsewhere.

use serde::Deserialize;
use std::path::Path;

use crate::error::RelayError;

#[derive(Debug, Deserialize)]
struct AuthorizedUser {
    #[serde(default, alias = "access_token")]
    token: Option<String>,
}

/// Reads the access token from `path`.
pub fn load_access_token(path: &Path) -> Result<String, RelayError> {
    let data = std::fs::read_to_string(path).map_err(|e| RelayError::io(path, e))?;
    parse_access_token(&data).map_err(|reason| RelayError::Token {
        path: path.to_path_buf(),
        reason,
    })
}

fn parse_access_token(data: &str) -> Result<String, String> {
    let user: AuthorizedUser = serde_json::from_str(data).map_err(|e| e.to_string())?;
    match user.token.map(|t| t.trim().to_string()) {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err("no access token in file".to_string()),
    }
}
