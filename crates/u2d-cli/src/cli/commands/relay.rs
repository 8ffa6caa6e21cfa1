//! `u2d relay <url>` – fetch then upload.

use anyhow::{Context, Result};
use u2d_core::config::U2dConfig;
use u2d_core::fetch::discard;
use u2d_core::relay::{fetch_with, upload_fetched};
use u2d_core::retry::{run_with_retry, RetryPolicy};
use u2d_core::RelayOutcome;

use super::resolve_token;

pub async fn run_relay(cfg: &U2dConfig, url: &str, token: Option<String>, keep: bool) -> Result<()> {
    let token = resolve_token(token, cfg)?;
    let keep = keep || cfg.keep_local;
    let opts = cfg.relay_options();
    let policy = RetryPolicy::from(&cfg.retry_config());

    let outcome = tokio::task::spawn_blocking({
        let url = url.to_string();
        move || -> Result<RelayOutcome> {
            let fetch = run_with_retry(&policy, |_| fetch_with(&url, &opts))?;
            let upload = run_with_retry(&policy, |_| upload_fetched(&fetch, &token, &opts));
            if !keep {
                discard(&fetch.local_path);
            }
            Ok(RelayOutcome {
                upload: upload?,
                fetch,
            })
        }
    })
    .await
    .context("relay task join")??;

    let name = &outcome.upload.remote_name;
    match &outcome.upload.file {
        Some(file) => println!("Uploaded {name} as Drive file {}", file.id),
        None => println!("Uploaded {name}"),
    }
    println!(
        "  {} bytes, sha256 {}",
        outcome.fetch.bytes, outcome.fetch.sha256
    );
    if keep {
        println!("  local copy: {}", outcome.fetch.local_path.display());
    }
    Ok(())
}
