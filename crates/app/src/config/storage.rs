//! Storage Config

use std::path::PathBuf;

use clap::Args;

/// Local state and receipt locations.
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// Directory holding the local store (session, catalog cache, outbox)
    #[arg(long, env = "TILL_DATA_DIR", default_value = ".till", global = true)]
    pub data_dir: PathBuf,

    /// Directory receipts are written to
    #[arg(long, env = "TILL_RECEIPTS_DIR", default_value = "receipts", global = true)]
    pub receipts_dir: PathBuf,
}
