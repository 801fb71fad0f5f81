pub const OWNER_PASSWORD: &str = "test-owner-password";
pub const WRONG_PASSWORD: &str = "not-the-password";

pub const SERVER_READY_TIMEOUT_MS: u64 = 5_000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
pub const REQUEST_TIMEOUT_SECS: u64 = 5;
