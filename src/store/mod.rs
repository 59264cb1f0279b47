pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::rates::RateStore;
use anyhow::{Context, Result};
use disk::DiskRateStore;
use std::sync::Arc;

/// Opens the persistent rate store under the configured data directory.
pub fn open_rate_store(config: &AppConfig) -> Result<Arc<dyn RateStore>> {
    let path = config.default_data_path()?.join("rates");
    let store = DiskRateStore::open(&path)
        .with_context(|| format!("Failed to open rate store at {}", path.display()))?;
    Ok(Arc::new(store))
}
