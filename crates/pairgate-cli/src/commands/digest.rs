//! Digest command implementation.

use std::path::Path;

use pairgate_core::{config_digest, ConfigEncoding};

use super::read_config;

pub fn run(config: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = read_config(config)?;
    let digest = config_digest(&config, ConfigEncoding::V1)?;
    if json {
        println!("{}", serde_json::to_string(&digest)?);
    } else {
        println!("{}", digest);
    }
    Ok(())
}
