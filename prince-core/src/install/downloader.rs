//! Streaming download of PrinceXML distributions with progress reporting.

use anyhow::{Context, Result};
use futures::StreamExt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use super::proxy;

// ============================================================================
// URL Validation
// ============================================================================

/// Domains distributions may be downloaded from.
const ALLOWED_DOMAINS: &[&str] = &["princexml.com"];

const USER_AGENT: &str = concat!("prince-core/", env!("CARGO_PKG_VERSION"));

/// Requires HTTPS and a host in [`ALLOWED_DOMAINS`] (subdomains included).
pub fn validate_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str).with_context(|| format!("Invalid URL: {}", url_str))?;

    if url.scheme() != "https" {
        anyhow::bail!("URL must use HTTPS: {}", url_str);
    }

    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("URL must have a host: {}", url_str))?;

    let is_allowed = ALLOWED_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)));

    if !is_allowed {
        anyhow::bail!(
            "Download domain not allowed: {}. Allowed: {:?}",
            host,
            ALLOWED_DOMAINS
        );
    }

    Ok(url)
}

// ============================================================================
// Download Progress
// ============================================================================

/// Progress information during a download.
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    pub bytes_downloaded: u64,
    /// From the Content-Length header, when sent.
    pub total_bytes: Option<u64>,
    /// 0.0 to 100.0, or None if the total is unknown.
    pub percent: Option<f32>,
}

impl DownloadProgress {
    fn new(bytes_downloaded: u64, total_bytes: Option<u64>) -> Self {
        let percent = total_bytes.map(|total| {
            if total > 0 {
                (bytes_downloaded as f32 / total as f32) * 100.0
            } else {
                0.0
            }
        });

        Self {
            bytes_downloaded,
            total_bytes,
            percent,
        }
    }
}

// ============================================================================
// Download
// ============================================================================

fn build_client() -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);

    if let Some(proxy_url) = proxy::configured_proxy() {
        debug!("Using HTTP proxy {}", proxy_url);
        let proxy = reqwest::Proxy::all(&proxy_url)
            .with_context(|| format!("Invalid proxy URL: {}", proxy_url))?;
        builder = builder.proxy(proxy);
    }

    builder.build().context("Failed to build HTTP client")
}

/// Downloads `url` into `dest`, truncating it, and returns the byte count.
///
/// `progress_cb` is called once before the first chunk and after every
/// chunk written.
pub async fn download_file<F>(url: &str, dest: &Path, progress_cb: F) -> Result<u64>
where
    F: Fn(DownloadProgress),
{
    info!("Downloading {} to {}", url, dest.display());

    let url = validate_url(url)?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let client = build_client()?;
    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Failed to start download from {}", url))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!(
            "Download failed with status {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown error")
        );
    }

    let total_bytes = response.content_length();
    debug!("Content-Length: {:?}", total_bytes);

    let mut file = File::create(dest)
        .await
        .with_context(|| format!("Failed to create file: {}", dest.display()))?;

    let mut stream = response.bytes_stream();
    let mut bytes_downloaded: u64 = 0;

    progress_cb(DownloadProgress::new(0, total_bytes));

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.context("Failed to read chunk from response stream")?;

        file.write_all(&chunk)
            .await
            .context("Failed to write chunk to file")?;

        bytes_downloaded += chunk.len() as u64;
        progress_cb(DownloadProgress::new(bytes_downloaded, total_bytes));
    }

    file.flush().await.context("Failed to flush file")?;

    info!(
        "Download complete: {} bytes written to {}",
        bytes_downloaded,
        dest.display()
    );

    Ok(bytes_downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_progress_calculation() {
        let progress = DownloadProgress::new(50, Some(100));
        assert_eq!(progress.bytes_downloaded, 50);
        assert_eq!(progress.percent, Some(50.0));

        assert_eq!(DownloadProgress::new(50, None).percent, None);
        assert_eq!(DownloadProgress::new(0, Some(0)).percent, Some(0.0));
        assert_eq!(DownloadProgress::new(100, Some(100)).percent, Some(100.0));
    }

    #[test]
    fn test_validate_url_https_required() {
        assert!(validate_url("http://www.princexml.com/download/prince.zip").is_err());
        assert!(validate_url("https://www.princexml.com/download/prince.zip").is_ok());
    }

    #[test]
    fn test_validate_url_allowed_domains() {
        assert!(validate_url("https://princexml.com/download/prince-15.4.1-macos.zip").is_ok());
        assert!(validate_url("https://evil.com/prince.zip").is_err());
        assert!(validate_url("https://princexml.com.evil.org/prince.zip").is_err());
        assert!(validate_url("https://notprincexml.com/prince.zip").is_err());
    }

    #[test]
    fn test_validate_url_invalid() {
        assert!(validate_url("not-a-url").is_err());
        assert!(validate_url("").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
    }

    #[tokio::test]
    async fn test_download_rejects_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested/archive.zip");

        let result = download_file("https://example.com/a.zip", &dest, |_| {}).await;
        assert!(result.is_err());
        assert!(!dest.parent().unwrap().exists());
    }
}
