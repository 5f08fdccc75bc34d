pub mod attest;
pub mod deploy;
pub mod digest;
pub mod list;
pub mod verify;

use std::path::Path;

use pairgate_core::ConfigurationValue;

/// Reads and validates a configuration JSON file.
pub fn read_config(path: &Path) -> Result<ConfigurationValue, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let config = ConfigurationValue::from_json(&text)
        .map_err(|e| format!("Invalid configuration {}: {}", path.display(), e))?;
    Ok(config)
}
