//! HTTP client for the Cloudinary upload API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const UPLOAD_TIMEOUT_SEC: u64 = 60;

/// A remote host that stores uploaded images and serves them by URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload an image buffer and return its delivery URL. The buffer is
    /// held fully in memory; nothing is streamed.
    async fn upload_image(&self, bytes: Vec<u8>) -> Result<UploadedImage>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    pub secure_url: String,
}

/// Credentials and target folder for a Cloudinary cloud.
#[derive(Debug, Clone)]
pub struct CloudinarySettings {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
}

pub struct CloudinaryClient {
    client: reqwest::Client,
    settings: CloudinarySettings,
}

impl CloudinaryClient {
    pub fn new(settings: CloudinarySettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SEC))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, settings }
    }

    fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.settings.cloud_name
        )
    }

    /// Hex SHA-256 digest of the signed parameters (alphabetical order)
    /// concatenated with the API secret, per the Cloudinary signing
    /// convention.
    fn sign(&self, folder: &str, timestamp: u64) -> String {
        let to_sign = format!(
            "folder={}&timestamp={}{}",
            folder, timestamp, self.settings.api_secret
        );
        hex::encode(Sha256::digest(to_sign.as_bytes()))
    }
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn upload_image(&self, bytes: Vec<u8>) -> Result<UploadedImage> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("System clock is before the unix epoch")?
            .as_secs();
        let signature = self.sign(&self.settings.folder, timestamp);

        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes))
            .text("api_key", self.settings.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", self.settings.folder.clone())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .context("Failed to reach the image host")?;

        if !response.status().is_success() {
            anyhow::bail!("Image upload failed with status: {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse upload response")
    }
}
