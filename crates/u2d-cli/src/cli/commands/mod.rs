//! CLI command handlers, one per file.

mod completions;
mod fetch;
mod man;
mod relay;
mod upload;

pub use completions::run_completions;
pub use fetch::run_fetch;
pub use man::run_man;
pub use relay::run_relay;
pub use upload::run_upload;

use anyhow::{bail, Result};
use u2d_core::config::U2dConfig;
use u2d_core::token;

/// Token from `--token`/`U2D_TOKEN`, else from the configured token file.
pub(crate) fn resolve_token(flag: Option<String>, cfg: &U2dConfig) -> Result<String> {
    if let Some(t) = flag.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        return Ok(t);
    }
    if let Some(path) = &cfg.token_file {
        tracing::debug!("reading access token from {}", path.display());
        return Ok(token::load_access_token(path)?);
    }
    bail!("no access token: pass --token, set U2D_TOKEN, or set token_file in the config")
}
