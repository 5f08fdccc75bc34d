use pairgate_canonical::{AssetId, PrincipalId};
use pairgate_core::{
    AuthorizationContext, ConfigurationValue, Factory, PairProvisionedEvent, ResourceArena,
};
use pairgate_journal::{
    replay_pairs, AllEvents, AndFilter, CurveFilter, EventTypeFilter, JournalAuditSink,
    JournalReader, JournalWriter, ReadMode, TokenFilter, WriteOptions,
};
use tempfile::TempDir;

fn principal(s: &str) -> PrincipalId {
    PrincipalId::parse(s).unwrap()
}

fn config(name: &str, symbol: &str) -> ConfigurationValue {
    ConfigurationValue::builder()
        .name(name)
        .symbol(symbol)
        .resource_uri(format!("ipfs://{}", name.to_lowercase()))
        .creator(principal("human:alice"))
        .creator_fee_bips(100u16)
        .creator_royalty_bips(500u16)
        .admin(principal("org:launchpad"))
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

fn deploy_all(path: &std::path::Path, configs: &[ConfigurationValue]) {
    let owner = principal("org:launchpad");
    let arena = ResourceArena::new();
    let sink = JournalAuditSink::open(path, WriteOptions::default()).unwrap();
    let mut factory = Factory::new(owner.clone(), arena.clone(), arena, sink);
    for config in configs {
        factory
            .deploy(&AuthorizationContext::new(owner.clone()), config)
            .unwrap();
    }
    assert_eq!(factory.audit().appended(), configs.len());
}

fn read_all(path: &std::path::Path) -> Vec<PairProvisionedEvent> {
    let mut reader = JournalReader::open(path, ReadMode::Strict).unwrap();
    let mut events = Vec::new();
    while let Some(event) = reader.read_event().unwrap() {
        events.push(event);
    }
    events
}

#[test]
fn factory_events_round_trip_through_journal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pairs.pgj");
    let configs = [config("Alice", "ALC"), config("Bob", "BOB")];

    deploy_all(&path, &configs);

    let events = read_all(&path);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].config, configs[0]);
    assert_eq!(events[1].config, configs[1]);
    assert_ne!(events[0].token, events[1].token);
    assert_ne!(events[0].curve, events[1].curve);
}

#[test]
fn new_journal_starts_with_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.pgj");
    JournalWriter::open(&path, WriteOptions::default())
        .unwrap()
        .finish()
        .unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 16);
    assert_eq!(&bytes[..4], b"PGJ1");
    assert!(read_all(&path).is_empty());
}

#[test]
fn reopening_appends_after_existing_records() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pairs.pgj");

    deploy_all(&path, &[config("Alice", "ALC")]);
    let events = read_all(&path);
    {
        let mut writer = JournalWriter::open(&path, WriteOptions::default()).unwrap();
        writer.append_event(&events[0]).unwrap();
        writer.finish().unwrap();
    }

    let reread = read_all(&path);
    assert_eq!(reread.len(), 2);
    assert_eq!(reread[0], reread[1]);
}

#[test]
fn replay_filters_by_handle_and_type() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pairs.pgj");
    deploy_all(
        &path,
        &[config("Alice", "ALC"), config("Bob", "BOB"), config("Carol", "CRL")],
    );
    let events = read_all(&path);

    let all = replay_pairs(&path, ReadMode::Strict, AllEvents).unwrap();
    assert_eq!(all, events);

    let by_token = replay_pairs(&path, ReadMode::Strict, TokenFilter(events[1].token)).unwrap();
    assert_eq!(by_token.len(), 1);
    assert_eq!(by_token[0].config.symbol(), "BOB");

    let by_curve = replay_pairs(&path, ReadMode::Strict, CurveFilter(events[2].curve)).unwrap();
    assert_eq!(by_curve.len(), 1);
    assert_eq!(by_curve[0].token, events[2].token);

    let by_type = EventTypeFilter {
        event_type: "pair_provisioned".to_string(),
    };
    assert_eq!(replay_pairs(&path, ReadMode::Strict, &by_type).unwrap().len(), 3);

    let nothing = AndFilter {
        filters: vec![
            Box::new(TokenFilter(events[0].token)),
            Box::new(CurveFilter(events[1].curve)),
        ],
    };
    assert!(replay_pairs(&path, ReadMode::Strict, nothing).unwrap().is_empty());
}
