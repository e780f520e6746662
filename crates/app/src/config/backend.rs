//! Backend Config

use clap::Args;

/// Backend connection settings.
#[derive(Debug, Clone, Args)]
pub struct BackendConfig {
    /// Base URL of the POS backend
    #[arg(
        long,
        env = "TILL_BACKEND_URL",
        default_value = "http://localhost:3000",
        global = true
    )]
    pub backend_url: String,

    /// Request timeout in seconds; requests wait indefinitely when unset
    #[arg(long, env = "TILL_REQUEST_TIMEOUT_SECS", global = true)]
    pub request_timeout_secs: Option<u64>,
}
