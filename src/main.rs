use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardlist_server::cloudinary::CloudinaryClient;
use cardlist_server::collection_store::SqliteCollectionStore;
use cardlist_server::config::{AppConfig, CliConfig, FileConfig};
use cardlist_server::server::{run_server, RequestsLoggingLevel, ServerConfig};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite collection database file. Created on first run.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Path to a TOML config file. File values override CLI flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3000)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to a directory of static assets served under /static.
    #[clap(long)]
    pub static_dir_path: Option<String>,

    /// The owner-mode password. Leave unset to keep the app read-only.
    #[clap(long)]
    pub password: Option<String>,

    /// Cloudinary cloud name for image uploads.
    #[clap(long)]
    pub cloudinary_cloud_name: Option<String>,

    /// Cloudinary API key.
    #[clap(long)]
    pub cloudinary_api_key: Option<String>,

    /// Cloudinary API secret.
    #[clap(long)]
    pub cloudinary_api_secret: Option<String>,

    /// Cloudinary folder receiving the uploads.
    #[clap(long)]
    pub cloudinary_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    let cli_config = CliConfig {
        db_path: cli_args.db_path,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        static_dir_path: cli_args.static_dir_path,
        password: cli_args.password,
        cloudinary_cloud_name: cli_args.cloudinary_cloud_name,
        cloudinary_api_key: cli_args.cloudinary_api_key,
        cloudinary_api_secret: cli_args.cloudinary_api_secret,
        cloudinary_folder: cli_args.cloudinary_folder,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    if config.owner_password.is_empty() {
        info!("No owner password configured; login is disabled");
    }

    info!("Opening collection database at {:?}...", config.db_path);
    let store = Arc::new(SqliteCollectionStore::new(&config.db_path)?);

    let image_host = Arc::new(CloudinaryClient::new(config.cloudinary.clone()));

    let server_config = ServerConfig {
        port: config.port,
        owner_password: config.owner_password.clone(),
        requests_logging_level: config.logging_level.clone(),
        static_dir_path: config.static_dir_path.clone(),
    };

    info!(
        "cardlist-server {} ready to serve at port {}!",
        env!("GIT_HASH"),
        config.port
    );
    run_server(server_config, store, image_host).await
}
