mod file_config;

pub use file_config::{CloudinaryConfig, FileConfig};

use crate::cloudinary::CloudinarySettings;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

const DEFAULT_UPLOAD_FOLDER: &str = "cardlist";

/// CLI arguments that participate in config resolution. Mirrors the
/// flags that a TOML config file can override.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub static_dir_path: Option<String>,
    pub password: Option<String>,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    pub cloudinary_folder: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub static_dir_path: Option<String>,
    /// The shared owner-mode secret. An empty string is a valid state in
    /// which no password can ever authenticate.
    pub owner_password: String,
    pub cloudinary: CloudinarySettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let static_dir_path = file
            .static_dir_path
            .or_else(|| cli.static_dir_path.clone());

        if let Some(static_dir) = &static_dir_path {
            if !PathBuf::from(static_dir).is_dir() {
                bail!("Static directory does not exist: {:?}", static_dir);
            }
        }

        let owner_password = file
            .password
            .or_else(|| cli.password.clone())
            .unwrap_or_default();

        let cloudinary_file = file.cloudinary.unwrap_or_default();
        let cloud_name = cloudinary_file
            .cloud_name
            .or_else(|| cli.cloudinary_cloud_name.clone());
        let api_key = cloudinary_file
            .api_key
            .or_else(|| cli.cloudinary_api_key.clone());
        let api_secret = cloudinary_file
            .api_secret
            .or_else(|| cli.cloudinary_api_secret.clone());
        let folder = cloudinary_file
            .folder
            .or_else(|| cli.cloudinary_folder.clone())
            .unwrap_or_else(|| DEFAULT_UPLOAD_FOLDER.to_string());

        let cloudinary = match (cloud_name, api_key, api_secret) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => CloudinarySettings {
                cloud_name,
                api_key,
                api_secret,
                folder,
            },
            _ => bail!(
                "Cloudinary credentials are incomplete: cloud_name, api_key and api_secret \
                 must all be provided via CLI or the [cloudinary] config section"
            ),
        };

        Ok(Self {
            db_path,
            port,
            logging_level,
            static_dir_path,
            owner_password,
            cloudinary,
        })
    }
}

/// Parses a logging level string using clap's ValueEnum trait.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
