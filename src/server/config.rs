use super::RequestsLoggingLevel;

/// Runtime settings for the HTTP server. The owner password is the
/// single shared secret granting write access; an empty string means
/// login can never succeed.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub port: u16,
    pub owner_password: String,
    pub requests_logging_level: RequestsLoggingLevel,
    pub static_dir_path: Option<String>,
}
