//! Attest command implementation.

use std::path::Path;

use ed25519_dalek::SigningKey;
use pairgate_core::{config_digest, sign_attestation, ConfigEncoding};

use super::read_config;

pub fn run(config: &Path, key: &Path, issuer: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = read_config(config)?;
    let signing_key = read_signing_key(key)?;
    let digest = config_digest(&config, ConfigEncoding::V1)?;
    let attestation = sign_attestation(&signing_key, issuer, digest);
    println!("{}", serde_json::to_string_pretty(&attestation)?);
    Ok(())
}

fn read_signing_key(path: &Path) -> Result<SigningKey, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read key {}: {}", path.display(), e))?;
    let bytes = hex::decode(text.trim())?;
    let secret: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| format!("Signing key must be 32 bytes, got {}", bytes.len()))?;
    Ok(SigningKey::from_bytes(&secret))
}
