use std::path::Path;

use anyhow::Result;

use crate::ui;

pub fn run(config_path: &Path) -> Result<()> {
    let config = super::load_config(config_path)?;

    if config_path.exists() {
        ui::info(&format!("Config file: {}", config_path.display()));
    } else {
        ui::info(&format!("Config file: {} (not found, using defaults)", config_path.display()));
    }
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
