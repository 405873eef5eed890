pub mod backup;
pub mod config;

use std::path::Path;

use anyhow::Result;
use gpt_backup_core::HarvestConfig;

/// Config file, then environment overrides.
pub fn load_config(path: &Path) -> Result<HarvestConfig> {
    let mut config = HarvestConfig::load(path)?;
    config.apply_env()?;
    Ok(config)
}
