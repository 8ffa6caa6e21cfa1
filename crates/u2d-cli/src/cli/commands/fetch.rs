//! `u2d fetch <url>` – download only.

use anyhow::{Context, Result};
use std::path::PathBuf;
use u2d_core::config::U2dConfig;
use u2d_core::relay::fetch_with;
use u2d_core::retry::{run_with_retry, RetryPolicy};

pub async fn run_fetch(cfg: &U2dConfig, url: &str, dir: Option<PathBuf>) -> Result<()> {
    let mut opts = cfg.relay_options();
    if dir.is_some() {
        opts.download_dir = dir;
    }
    let policy = RetryPolicy::from(&cfg.retry_config());

    let res = tokio::task::spawn_blocking({
        let url = url.to_string();
        move || run_with_retry(&policy, |_| fetch_with(&url, &opts))
    })
    .await
    .context("fetch task join")??;

    println!("{}", res.local_path.display());
    println!("  remote name: {}", res.remote_basename);
    println!("  {} bytes, sha256 {}", res.bytes, res.sha256);
    Ok(())
}
