//! Subcommand implementations

pub mod analyze;
pub mod calibrate;

use anyhow::Result;
use stop_calibrator::Config;

/// Print the effective configuration as pretty JSON
pub fn show_config(config_path: Option<String>) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;
    config.validate()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
