//! Test doubles and seed data helpers.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use cardlist_server::cloudinary::{ImageHost, UploadedImage};

/// Image host double: records uploads and hands back Cloudinary-shaped
/// delivery URLs without touching the network.
#[derive(Default)]
pub struct MockImageHost {
    uploads: AtomicUsize,
}

impl MockImageHost {
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageHost for MockImageHost {
    async fn upload_image(&self, _bytes: Vec<u8>) -> Result<UploadedImage> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(UploadedImage {
            secure_url: format!(
                "https://res.cloudinary.com/test-cloud/image/upload/v1/cardlist/upload-{}.jpg",
                n
            ),
        })
    }
}

/// A tiny JPEG-looking payload for multipart uploads.
pub fn fake_jpeg() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0xFF, 0xD9]
}
