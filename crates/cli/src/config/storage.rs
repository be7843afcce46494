//! Storage Config

use std::path::PathBuf;

use clap::Args;

/// Where the cart, orders and catalog come from.
#[derive(Debug, Args)]
pub struct StorageConfig {
    /// Directory holding the persisted cart and orders
    #[arg(long, global = true, env = "SMARTHVAC_DATA_DIR", default_value = ".smarthvac")]
    pub data_dir: PathBuf,

    /// Catalog fixture to use instead of the bundled one
    #[arg(long, global = true, env = "SMARTHVAC_CATALOG")]
    pub catalog: Option<PathBuf>,
}
