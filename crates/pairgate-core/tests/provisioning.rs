//! End-to-end provisioning tests over the reference arena.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use ed25519_dalek::SigningKey;
use pairgate_canonical::{AssetId, Canonicalizer, PrincipalId, ProfileId};
use pairgate_core::{
    config_digest, sign_attestation, Attestation, AttestationVerifier, AuditError, AuditSink,
    AuthorizationContext, AuthorizationPolicy, ConfigEncoding, ConfigurationValue, CurveParams,
    Ed25519AttestationVerifier, Factory, FactoryError, MemoryAuditLog, PairProvisionedEvent,
    PricingCurveProvisioner, ProvisionError, ProvisionStage, ResourceArena, SharedFactory,
    TokenHandle, VerifierReport,
};

fn principal(s: &str) -> PrincipalId {
    PrincipalId::parse(s).unwrap()
}

fn owner() -> PrincipalId {
    principal("org:launchpad")
}

fn alice_config() -> ConfigurationValue {
    ConfigurationValue::builder()
        .name("Alice")
        .symbol("ALC")
        .resource_uri("ipfs://alice")
        .creator(principal("human:alice"))
        .creator_fee_bips(100u16)
        .creator_royalty_bips(500u16)
        .admin(owner())
        .admin_fee_bips(50u16)
        .referrer(principal("human:bob"))
        .payment_asset(AssetId::parse("usdc").unwrap())
        .base_price(100u128)
        .linear_slope(5u128)
        .inflection_price(500u128)
        .inflection_point(1000)
        .build()
        .unwrap()
}

fn factory() -> (
    Factory<ResourceArena, ResourceArena, MemoryAuditLog>,
    ResourceArena,
) {
    let arena = ResourceArena::new();
    let factory = Factory::new(owner(), arena.clone(), arena.clone(), MemoryAuditLog::new());
    (factory, arena)
}

struct FailingSink;

impl AuditSink for FailingSink {
    fn emit(&mut self, _event: &PairProvisionedEvent) -> Result<(), AuditError> {
        Err(AuditError::Backend("disk full".to_string()))
    }
}

struct CountingVerifier {
    calls: Arc<AtomicUsize>,
    valid: bool,
}

impl AttestationVerifier for CountingVerifier {
    fn verify(&self, attestation: &Attestation) -> VerifierReport {
        self.calls.fetch_add(1, Ordering::SeqCst);
        VerifierReport {
            valid: self.valid,
            attested_digest: attestation.attested_digest.clone(),
        }
    }
}

struct CountingCurves {
    constructed: usize,
}

impl PricingCurveProvisioner for CountingCurves {
    fn construct(
        &mut self,
        _params: &CurveParams,
    ) -> Result<pairgate_core::CurveHandle, ProvisionError> {
        self.constructed += 1;
        Ok(pairgate_core::CurveHandle::new(self.constructed as u64))
    }

    fn revoke(&mut self, _handle: pairgate_core::CurveHandle) -> Result<(), ProvisionError> {
        Err(ProvisionError::Unavailable("revocation unsupported".to_string()))
    }
}

#[test]
fn owner_deploy_provisions_one_bound_pair() {
    let (mut factory, arena) = factory();
    let config = alice_config();

    let pair = factory
        .deploy_pair(&AuthorizationContext::new(owner()), &config)
        .unwrap();

    assert_eq!(arena.live_curves(), 1);
    assert_eq!(arena.live_tokens(), 1);
    let token = arena.token(pair.token).unwrap();
    assert_eq!(token.curve, pair.curve);
    assert_eq!(arena.curve(pair.curve).unwrap().params, config.curve_params());
    assert_eq!(token.params, config.token_params());
    assert_eq!(
        arena.check_consistency().unwrap(),
        vec![(pair.curve, pair.token)]
    );
}

#[test]
fn owner_deploy_emits_exactly_one_event() {
    let (mut factory, arena) = factory();
    let config = alice_config();

    let pair = factory
        .deploy_pair(&AuthorizationContext::new(owner()), &config)
        .unwrap();

    let events = factory.audit().events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.token, pair.token);
    assert_eq!(event.curve, pair.curve);
    assert_eq!(arena.token(event.token).unwrap().curve, event.curve);
    assert!(arena.is_token_provisioned(event.token));
    assert!(arena.is_curve_provisioned(event.curve));
    assert_eq!(event.config, config);
    assert_eq!(event.principal_id, owner());
    assert_eq!(event.event_type, "pair_provisioned");
    assert_eq!(
        event.config_digest,
        config_digest(&config, ConfigEncoding::V1).unwrap()
    );
    let canonicalizer = Canonicalizer::new(ProfileId::v1());
    assert!(event.verify_event_id(&canonicalizer).unwrap());
    assert!(event.verify_config_digest().unwrap());
}

#[test]
fn non_owner_deploy_has_no_side_effects() {
    let (mut factory, arena) = factory();
    let stranger = principal("human:mallory");

    let err = factory
        .deploy(&AuthorizationContext::new(stranger.clone()), &alice_config())
        .unwrap_err();

    assert!(matches!(err, FactoryError::Unauthorized { caller } if caller == stranger));
    assert_eq!(arena.curves_constructed(), 0);
    assert!(factory.audit().is_empty());
}

#[test]
fn token_rejection_leaves_no_provisioned_curve() {
    let (mut factory, arena) = factory();
    let config = ConfigurationValue::builder()
        .name("Alice")
        .symbol("ALC")
        .resource_uri("ipfs://alice")
        .creator(principal("human:alice"))
        .creator_fee_bips(10_001u16)
        .creator_royalty_bips(500u16)
        .admin(owner())
        .admin_fee_bips(0u16)
        .referrer(principal("human:bob"))
        .payment_asset(AssetId::parse("usdc").unwrap())
        .base_price(100u128)
        .linear_slope(5u128)
        .inflection_price(500u128)
        .inflection_point(1000)
        .build()
        .unwrap();

    let err = factory
        .deploy(&AuthorizationContext::new(owner()), &config)
        .unwrap_err();

    match err {
        FactoryError::ProvisionerRejected { stage, source } => {
            assert_eq!(stage, ProvisionStage::Token);
            assert!(matches!(source, ProvisionError::Rejected(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(arena.curves_constructed(), 1);
    assert_eq!(arena.live_curves(), 0);
    assert!(!arena.is_curve_provisioned(pairgate_core::CurveHandle::new(0)));
    assert_eq!(arena.live_tokens(), 0);
    assert!(factory.audit().is_empty());
    assert!(arena.check_consistency().unwrap().is_empty());
}

#[test]
fn curve_rejection_is_reported_at_curve_stage() {
    let (mut factory, arena) = factory();
    let config = ConfigurationValue::builder()
        .name("Alice")
        .symbol("ALC")
        .resource_uri("ipfs://alice")
        .creator(principal("human:alice"))
        .creator_fee_bips(100u16)
        .creator_royalty_bips(500u16)
        .admin(owner())
        .admin_fee_bips(50u16)
        .referrer(principal("human:bob"))
        .payment_asset(AssetId::parse("usdc").unwrap())
        .base_price(100u128)
        .linear_slope(5u128)
        .inflection_price(500u128)
        .inflection_point(0)
        .build()
        .unwrap();

    let err = factory
        .deploy(&AuthorizationContext::new(owner()), &config)
        .unwrap_err();

    assert!(matches!(
        err,
        FactoryError::ProvisionerRejected {
            stage: ProvisionStage::Curve,
            ..
        }
    ));
    assert_eq!(arena.curves_constructed(), 0);
    assert!(factory.audit().is_empty());
}

#[test]
fn audit_failure_rolls_back_both_resources() {
    let arena = ResourceArena::new();
    let mut factory = Factory::new(owner(), arena.clone(), arena.clone(), FailingSink);

    let err = factory
        .deploy(&AuthorizationContext::new(owner()), &alice_config())
        .unwrap_err();

    assert!(matches!(err, FactoryError::Audit(AuditError::Backend(_))));
    assert_eq!(arena.live_curves(), 0);
    assert_eq!(arena.live_tokens(), 0);
    assert!(arena.token(TokenHandle::new(0)).is_some());
    assert!(!arena.is_token_provisioned(TokenHandle::new(0)));
    assert!(!arena.is_curve_provisioned(pairgate_core::CurveHandle::new(0)));
    assert!(arena.check_consistency().unwrap().is_empty());
}

#[test]
fn failed_revoke_does_not_mask_the_original_error() {
    let arena = ResourceArena::new();
    let mut factory = Factory::new(
        owner(),
        CountingCurves { constructed: 0 },
        arena,
        MemoryAuditLog::new(),
    );

    // The arena never saw this curve, so token construction fails.
    let err = factory
        .deploy(&AuthorizationContext::new(owner()), &alice_config())
        .unwrap_err();

    assert!(matches!(
        err,
        FactoryError::ProvisionerRejected {
            stage: ProvisionStage::Token,
            source: ProvisionError::UnknownHandle(_),
        }
    ));
    assert_eq!(factory.curves().constructed, 1);
    assert!(factory.audit().is_empty());
}

#[test]
fn ownership_transfer_moves_authority() {
    let (mut factory, arena) = factory();
    let carol = principal("human:carol");

    let transferred = factory
        .transfer_ownership(&AuthorizationContext::new(owner()), carol.clone())
        .unwrap();
    assert_eq!(transferred.previous_owner, owner());
    assert_eq!(transferred.new_owner, carol);
    assert_eq!(factory.owner(), &carol);

    let err = factory
        .deploy(&AuthorizationContext::new(owner()), &alice_config())
        .unwrap_err();
    assert!(matches!(err, FactoryError::Unauthorized { .. }));
    assert_eq!(arena.curves_constructed(), 0);

    factory
        .deploy(&AuthorizationContext::new(carol), &alice_config())
        .unwrap();
    assert_eq!(factory.audit().len(), 1);
}

#[test]
fn non_owner_cannot_transfer_ownership() {
    let (mut factory, _arena) = factory();
    let mallory = principal("human:mallory");

    let err = factory
        .transfer_ownership(&AuthorizationContext::new(mallory.clone()), mallory)
        .unwrap_err();

    assert!(matches!(err, FactoryError::Unauthorized { .. }));
    assert_eq!(factory.owner(), &owner());
}

#[test]
fn transfer_to_self_keeps_owner() {
    let (mut factory, _arena) = factory();
    factory
        .transfer_ownership(&AuthorizationContext::new(owner()), owner())
        .unwrap();
    assert_eq!(factory.owner(), &owner());
}

fn attested_factory(
    key: &SigningKey,
) -> (
    Factory<ResourceArena, ResourceArena, MemoryAuditLog>,
    ResourceArena,
) {
    let verifier = Ed25519AttestationVerifier::new().trust("auditor-1", key.verifying_key());
    let (factory, arena) = factory();
    (
        factory.with_policy(AuthorizationPolicy::with_verifier(verifier)),
        arena,
    )
}

#[test]
fn valid_attestation_allows_deploy() {
    let key = SigningKey::from_bytes(&[3u8; 32]);
    let (mut factory, arena) = attested_factory(&key);
    let config = alice_config();
    let digest = config_digest(&config, ConfigEncoding::V1).unwrap();
    let ctx =
        AuthorizationContext::new(owner()).with_attestation(sign_attestation(&key, "auditor-1", digest));

    factory.deploy(&ctx, &config).unwrap();

    assert_eq!(arena.live_tokens(), 1);
    assert_eq!(factory.audit().len(), 1);
}

#[test]
fn attestation_for_other_config_is_invalid() {
    let key = SigningKey::from_bytes(&[3u8; 32]);
    let (mut factory, arena) = attested_factory(&key);
    let config = alice_config();
    let other = ConfigurationValue::builder()
        .name("Bob")
        .symbol("BOB")
        .resource_uri("ipfs://bob")
        .creator(principal("human:bob"))
        .creator_fee_bips(100u16)
        .creator_royalty_bips(500u16)
        .admin(owner())
        .admin_fee_bips(50u16)
        .referrer(principal("human:alice"))
        .payment_asset(AssetId::parse("usdc").unwrap())
        .base_price(100u128)
        .linear_slope(5u128)
        .inflection_price(500u128)
        .inflection_point(1000)
        .build()
        .unwrap();
    let digest = config_digest(&other, ConfigEncoding::V1).unwrap();
    let ctx =
        AuthorizationContext::new(owner()).with_attestation(sign_attestation(&key, "auditor-1", digest));

    let err = factory.deploy(&ctx, &config).unwrap_err();

    assert!(matches!(err, FactoryError::InvalidAttestation { .. }));
    assert_eq!(arena.curves_constructed(), 0);
    assert!(factory.audit().is_empty());
}

#[test]
fn missing_or_untrusted_attestation_is_not_verified() {
    let key = SigningKey::from_bytes(&[3u8; 32]);
    let rogue = SigningKey::from_bytes(&[4u8; 32]);
    let (mut factory, arena) = attested_factory(&key);
    let config = alice_config();
    let digest = config_digest(&config, ConfigEncoding::V1).unwrap();

    let err = factory
        .deploy(&AuthorizationContext::new(owner()), &config)
        .unwrap_err();
    assert!(matches!(err, FactoryError::DeploymentNotVerified(_)));

    let forged = AuthorizationContext::new(owner())
        .with_attestation(sign_attestation(&rogue, "auditor-1", digest.clone()));
    let err = factory.deploy(&forged, &config).unwrap_err();
    assert!(matches!(err, FactoryError::DeploymentNotVerified(_)));

    let unknown = AuthorizationContext::new(owner())
        .with_attestation(sign_attestation(&rogue, "auditor-9", digest));
    let err = factory.deploy(&unknown, &config).unwrap_err();
    assert!(matches!(err, FactoryError::DeploymentNotVerified(_)));

    assert_eq!(arena.curves_constructed(), 0);
}

#[test]
fn owner_check_precedes_attestation_and_verifier_runs_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let verifier = CountingVerifier {
        calls: Arc::clone(&calls),
        valid: true,
    };
    let (factory, _arena) = factory();
    let mut factory = factory.with_policy(AuthorizationPolicy::with_verifier(verifier));
    let config = alice_config();
    let digest = config_digest(&config, ConfigEncoding::V1).unwrap();
    let attestation = sign_attestation(&SigningKey::from_bytes(&[5u8; 32]), "any", digest);

    let err = factory
        .deploy(
            &AuthorizationContext::new(principal("human:mallory"))
                .with_attestation(attestation.clone()),
            &config,
        )
        .unwrap_err();
    assert!(matches!(err, FactoryError::Unauthorized { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    factory
        .deploy(
            &AuthorizationContext::new(owner()).with_attestation(attestation),
            &config,
        )
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn rejected_report_is_not_verified() {
    let calls = Arc::new(AtomicUsize::new(0));
    let verifier = CountingVerifier {
        calls: Arc::clone(&calls),
        valid: false,
    };
    let (factory, arena) = factory();
    let mut factory = factory.with_policy(AuthorizationPolicy::with_verifier(verifier));
    let config = alice_config();
    let digest = config_digest(&config, ConfigEncoding::V1).unwrap();
    let ctx = AuthorizationContext::new(owner())
        .with_attestation(sign_attestation(&SigningKey::from_bytes(&[5u8; 32]), "any", digest));

    let err = factory.deploy(&ctx, &config).unwrap_err();

    assert!(matches!(err, FactoryError::DeploymentNotVerified(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(arena.curves_constructed(), 0);
}

#[test]
fn shared_factory_serializes_concurrent_deploys() {
    let arena = ResourceArena::new();
    let shared = SharedFactory::new(Factory::new(
        owner(),
        arena.clone(),
        arena.clone(),
        MemoryAuditLog::new(),
    ));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                shared
                    .deploy_pair(&AuthorizationContext::new(owner()), &alice_config())
                    .unwrap()
            })
        })
        .collect();
    let mut pairs: Vec<_> = workers
        .into_iter()
        .map(|worker| worker.join().unwrap())
        .map(|pair| (pair.curve, pair.token))
        .collect();
    pairs.sort();

    let mut bound = arena.check_consistency().unwrap();
    bound.sort();
    assert_eq!(bound, pairs);
    assert_eq!(pairs.len(), 8);
    let events = shared.with_factory(|factory| factory.audit().len()).unwrap();
    assert_eq!(events, 8);
}

#[test]
fn shared_factory_transfer_applies_to_later_deploys() {
    let (factory, _arena) = factory();
    let shared = SharedFactory::new(factory);
    let carol = principal("human:carol");

    shared
        .transfer_ownership(&AuthorizationContext::new(owner()), carol.clone())
        .unwrap();

    assert!(matches!(
        shared.deploy(&AuthorizationContext::new(owner()), &alice_config()),
        Err(FactoryError::Unauthorized { .. })
    ));
    shared
        .deploy(&AuthorizationContext::new(carol), &alice_config())
        .unwrap();
}
