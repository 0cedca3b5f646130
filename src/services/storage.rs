//! Thin client for an S3-style object store: one PUT per upload, no
//! orchestration beyond the vendor call. Unconfigured environments simply
//! have no storage client.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;

use crate::config::{self, StorageConfig};

pub struct StorageClient {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    api_key: Option<String>,
}

impl StorageClient {
    pub fn from_config(cfg: &StorageConfig) -> Option<Self> {
        let endpoint = cfg.endpoint.clone()?;
        let bucket = cfg.bucket.clone()?;
        Some(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket,
            api_key: cfg.api_key.clone(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }

    /// Upload one object and return its URL.
    pub async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        let url = self.object_url(key);
        let mut request = self
            .client
            .put(&url)
            .header("content-type", content_type)
            .body(bytes);
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = request.send().await.context("storage upload failed")?;
        if !response.status().is_success() {
            bail!("storage returned status {}", response.status());
        }
        Ok(url)
    }
}

pub static STORAGE: Lazy<Option<StorageClient>> =
    Lazy::new(|| StorageClient::from_config(&config::config().storage));

/// Object keys keep a recognizable filename but nothing shell- or
/// URL-hostile.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('-');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("budget 2026.xlsx"), "budget-2026.xlsx");
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc-passwd");
        assert_eq!(sanitize_filename("???"), "file");
        assert_eq!(sanitize_filename("report_final-v2.pdf"), "report_final-v2.pdf");
    }

    #[test]
    fn unconfigured_storage_builds_no_client() {
        let cfg = StorageConfig {
            endpoint: None,
            bucket: Some("uploads".to_string()),
            api_key: None,
            max_upload_bytes: 1024,
        };
        assert!(StorageClient::from_config(&cfg).is_none());
    }

    #[test]
    fn object_urls_join_cleanly() {
        let cfg = StorageConfig {
            endpoint: Some("https://files.churchflow.app/".to_string()),
            bucket: Some("uploads".to_string()),
            api_key: None,
            max_upload_bytes: 1024,
        };
        let client = StorageClient::from_config(&cfg).unwrap();
        assert_eq!(
            client.object_url("abc/report.pdf"),
            "https://files.churchflow.app/uploads/abc/report.pdf"
        );
    }
}
