//! Loading the raw export: from a file or over HTTP, then decoded to text.

use anyhow::{anyhow, bail, Context};
use encoding_rs::Encoding;
use log::{info, warn};
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;

/// Maximum number of attempts for the HTTP fetch
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Sleep before the first retry, doubled after each failure
const INITIAL_RETRY_DELAY_MS: u64 = 1000;

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Exports are published in the legacy Korean code page.
pub const DEFAULT_ENCODING: &str = "euc-kr";

pub fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    info!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Fetch `url`, retrying with exponential backoff.
pub async fn fetch_url(url: &str) -> anyhow::Result<Vec<u8>> {
    let client = Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?;
    let mut sleep_millis = INITIAL_RETRY_DELAY_MS;

    for attempt in 1..=MAX_RETRY_ATTEMPTS {
        match client.get(url).send().await {
            Ok(response) => {
                if response.status() != StatusCode::OK {
                    warn!(
                        "Attempt {}/{}: Bad response status for {}: {}",
                        attempt,
                        MAX_RETRY_ATTEMPTS,
                        url,
                        response.status()
                    );
                } else {
                    match response.bytes().await {
                        Ok(body) if body.is_empty() => {
                            warn!("Attempt {}/{}: Empty response for {}", attempt, MAX_RETRY_ATTEMPTS, url);
                        }
                        Ok(body) => {
                            info!("Fetched {} bytes from {}", body.len(), url);
                            return Ok(body.to_vec());
                        }
                        Err(e) => {
                            warn!(
                                "Attempt {}/{}: Failed to read response body for {}: {}",
                                attempt, MAX_RETRY_ATTEMPTS, url, e
                            );
                        }
                    }
                }
            }
            Err(e) => {
                warn!("Attempt {}/{}: Request failed for {}: {}", attempt, MAX_RETRY_ATTEMPTS, url, e);
            }
        }

        if attempt < MAX_RETRY_ATTEMPTS {
            info!("Sleeping for {} milliseconds before retry for {}", sleep_millis, url);
            tokio::time::sleep(Duration::from_millis(sleep_millis)).await;
            sleep_millis *= 2;
        }
    }

    bail!("all {} attempts to fetch {} failed", MAX_RETRY_ATTEMPTS, url)
}

/// Decode `bytes` using the WHATWG encoding `label`. A byte-order mark
/// overrides the label. Malformed sequences become U+FFFD and are logged.
pub fn decode(bytes: &[u8], label: &str) -> anyhow::Result<String> {
    let encoding =
        Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| anyhow!("unknown encoding '{}'", label))?;
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!("Input contained byte sequences invalid in {}; replaced", used.name());
    }
    Ok(text.into_owned())
}
