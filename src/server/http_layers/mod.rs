mod method_override;
mod requests_logging;

pub use method_override::override_method;
pub use requests_logging::{log_requests, RequestsLoggingLevel};
