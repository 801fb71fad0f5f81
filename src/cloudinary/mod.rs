mod client;
mod transform;

pub use client::{CloudinaryClient, CloudinarySettings, ImageHost, UploadedImage};
pub use transform::{normalize_delivery_url, thumb_delivery_url, NormalizeOptions};
