//! `u2d upload <path>` – upload an existing local file.

use anyhow::{Context, Result};
use std::path::Path;
use u2d_core::config::U2dConfig;
use u2d_core::retry::{run_with_retry, RetryPolicy};
use u2d_core::UploadDriver;

use super::resolve_token;

pub async fn run_upload(
    cfg: &U2dConfig,
    path: &Path,
    name: Option<String>,
    token: Option<String>,
) -> Result<()> {
    let token = resolve_token(token, cfg)?;
    let opts = cfg.relay_options();
    let policy = RetryPolicy::from(&cfg.retry_config());

    let outcome = tokio::task::spawn_blocking({
        let path = path.to_path_buf();
        move || {
            run_with_retry(&policy, |_| {
                let mut driver = UploadDriver::new(opts.api.clone())
                    .chunk_size(opts.chunk_size)
                    .http_options(opts.http);
                match &name {
                    Some(n) => driver.upload_as(&path, n, &token),
                    None => driver.upload(&path, &token),
                }
            })
        }
    })
    .await
    .context("upload task join")??;

    match &outcome.file {
        Some(file) => println!("Uploaded {} as Drive file {}", outcome.remote_name, file.id),
        None => println!("Uploaded {}", outcome.remote_name),
    }
    println!(
        "  {} bytes in {} request(s)",
        outcome.total_size, outcome.requests
    );
    Ok(())
}
