//! Deploy command implementation.
//!
//! Each run builds a fresh arena. When a journal is in use, the pairs it
//! already records are rebuilt first so new handles continue its numbering.

use std::path::{Path, PathBuf};

use pairgate_canonical::PrincipalId;
use pairgate_core::{
    config_digest, Attestation, AuditSink, AuthorizationContext, ConfigEncoding,
    ConfigurationValue, Factory, FactorySettings, MemoryAuditLog, PricingCurveProvisioner,
    ProvisionedPair, ResourceArena, TokenProvisioner,
};
use pairgate_journal::{replay_pairs, AllEvents, JournalAuditSink, ReadMode, WriteOptions};
use serde_json::json;

use super::read_config;

pub struct DeployArgs {
    pub config: PathBuf,
    pub settings: PathBuf,
    pub caller: String,
    pub attestation: Option<PathBuf>,
    pub journal: Option<PathBuf>,
    pub json: bool,
}

pub fn run(args: DeployArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = FactorySettings::load(&args.settings)?;
    let caller = PrincipalId::parse(&args.caller)
        .map_err(|e| format!("Invalid caller: {}", e))?;
    let config = read_config(&args.config)?;

    let mut ctx = AuthorizationContext::new(caller);
    if let Some(path) = &args.attestation {
        ctx = ctx.with_attestation(read_attestation(path)?);
    }

    let arena = ResourceArena::with_limits(settings.arena);
    let journal = args.journal.clone().or_else(|| settings.journal.clone());
    let pair = match &journal {
        Some(path) => {
            // Opening first drops any torn trailing frame before replay.
            let sink = JournalAuditSink::open(path, WriteOptions { sync: true, create: true })?;
            restore_arena(path, &arena)?;
            deploy_once(&settings, arena, sink, &ctx, &config)?
        }
        None => deploy_once(&settings, arena, MemoryAuditLog::new(), &ctx, &config)?,
    };

    let digest = config_digest(&pair.config, ConfigEncoding::V1)?;
    if args.json {
        let out = json!({
            "token": pair.token,
            "curve": pair.curve,
            "config_digest": digest,
            "journal": journal,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("token:         {}", pair.token);
        println!("curve:         {}", pair.curve);
        println!("config digest: {}", digest);
        if let Some(path) = journal {
            println!("journal:       {}", path.display());
        }
    }
    Ok(())
}

fn deploy_once<A: AuditSink>(
    settings: &FactorySettings,
    arena: ResourceArena,
    audit: A,
    ctx: &AuthorizationContext,
    config: &ConfigurationValue,
) -> Result<ProvisionedPair, Box<dyn std::error::Error>> {
    let mut factory = Factory::new(settings.owner.clone(), arena.clone(), arena, audit)
        .with_policy(settings.authorization_policy()?);
    Ok(factory.deploy_pair(ctx, config)?)
}

fn read_attestation(path: &Path) -> Result<Attestation, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read attestation {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&text)?)
}

fn restore_arena(journal: &Path, arena: &ResourceArena) -> Result<(), Box<dyn std::error::Error>> {
    if !journal.exists() {
        return Ok(());
    }
    let events = replay_pairs(journal, ReadMode::Strict, AllEvents)?;
    let mut curves = arena.clone();
    let mut tokens = arena.clone();
    for event in &events {
        let curve = PricingCurveProvisioner::construct(&mut curves, &event.config.curve_params())?;
        let token = TokenProvisioner::construct(&mut tokens, &event.config.token_params(), curve)?;
        if (curve, token) != (event.curve, event.token) {
            return Err(format!(
                "Journal {} records {} / {} where {} / {} was expected",
                journal.display(),
                event.token,
                event.curve,
                token,
                curve
            )
            .into());
        }
    }
    tracing::debug!(pairs = events.len(), "arena restored from journal");
    Ok(())
}
