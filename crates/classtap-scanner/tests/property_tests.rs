//! Property-based tests for identifier resolution and deduplication.
//!
//! The exchange runs against the mock reader on a current-thread runtime built
//! per case, since proptest bodies are synchronous.

mod common;

use std::future::Future;
use std::time::{Duration, Instant};

use classtap_core::{DeviceClass, RawIdentifier, to_hex_upper};
use classtap_hardware::mock::{MockReply, MockTarget};
use classtap_scanner::{ScanDeduplicator, perform_custom_identifier_exchange, resolve};
use common::reader_with_target;
use proptest::prelude::*;

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

/// Strategy for hardware UIDs (4 to 10 bytes).
fn raw_identifier() -> impl Strategy<Value = RawIdentifier> {
    prop::collection::vec(any::<u8>(), 4..=10).prop_map(|bytes| RawIdentifier::new(bytes).unwrap())
}

/// Strategy for one scripted reply: a transport error or arbitrary bytes.
fn mock_reply() -> impl Strategy<Value = MockReply> {
    prop_oneof![
        Just(MockReply::TransportError),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(MockReply::Response),
        Just(MockReply::Response(vec![0x00, 0x90, 0x00])),
    ]
}

fn envelope(payload: &[u8]) -> Vec<u8> {
    let mut raw = vec![0x00];
    raw.extend_from_slice(payload);
    raw.extend_from_slice(&[0x90, 0x00]);
    raw
}

/// Run one exchange and return (identifier, class, releases).
fn exchange(raw: &RawIdentifier, target: MockTarget) -> (String, DeviceClass, usize) {
    block_on(async {
        let (mut reader, handle) = reader_with_target(target).await;
        let outcome = perform_custom_identifier_exchange(&mut reader, raw).await;
        let resolution = resolve(raw, outcome.custom_identifier());
        (resolution.identifier, resolution.device_class, handle.release_count())
    })
}

proptest! {
    #[test]
    fn select_transport_error_resolves_to_hardware_id(raw in raw_identifier()) {
        let (identifier, class, releases) =
            exchange(&raw, MockTarget::physical_tag(raw.clone()));

        prop_assert_eq!(identifier, to_hex_upper(raw.as_bytes()));
        prop_assert_eq!(class, DeviceClass::PhysicalTag);
        prop_assert_eq!(releases, 1);
    }

    #[test]
    fn valid_read_resolves_to_custom_identifier(
        raw in raw_identifier(),
        payload in prop::array::uniform7(any::<u8>()),
    ) {
        let target = MockTarget::scripted(raw.clone())
            .reply([0x00, 0x90, 0x00])
            .reply(envelope(&payload));

        let (identifier, class, releases) = exchange(&raw, target);

        prop_assert_eq!(identifier, to_hex_upper(&payload));
        prop_assert_eq!(class, DeviceClass::CustomBroadcast);
        prop_assert_eq!(releases, 1);
    }

    #[test]
    fn wrong_payload_length_resolves_to_hardware_id(
        raw in raw_identifier(),
        payload in prop::collection::vec(any::<u8>(), 0..32)
            .prop_filter("not 7 bytes", |p| p.len() != 7),
    ) {
        let target = MockTarget::scripted(raw.clone())
            .reply([0x00, 0x90, 0x00])
            .reply(envelope(&payload));

        let (identifier, class, _) = exchange(&raw, target);

        prop_assert_eq!(identifier, raw.to_hex());
        prop_assert_eq!(class, DeviceClass::PhysicalTag);
    }

    #[test]
    fn any_reply_script_releases_exactly_once(
        raw in raw_identifier(),
        replies in prop::collection::vec(mock_reply(), 0..3),
    ) {
        let target = replies.into_iter().fold(MockTarget::scripted(raw.clone()), |t, r| match r {
            MockReply::Response(bytes) => t.reply(bytes),
            MockReply::TransportError => t.transport_error(),
        });

        let (identifier, class, releases) = exchange(&raw, target);

        prop_assert_eq!(releases, 1);
        if class == DeviceClass::PhysicalTag {
            prop_assert_eq!(identifier, raw.to_hex());
        } else {
            prop_assert_eq!(identifier.len(), 14);
        }
    }

    #[test]
    fn dedup_suppresses_only_within_cooldown(
        raw in raw_identifier(),
        gap_ms in 0u64..10_000,
    ) {
        let t0 = Instant::now();
        let mut dedup = ScanDeduplicator::new(Duration::from_secs(3));
        dedup.record(&raw.to_hex(), t0);

        let accepted = dedup.should_accept(&raw.to_hex(), t0 + Duration::from_millis(gap_ms));

        prop_assert_eq!(accepted, gap_ms >= 3000);
    }

    #[test]
    fn dedup_never_suppresses_other_identifiers(
        first in raw_identifier(),
        second in raw_identifier(),
        gap_ms in 0u64..3000,
    ) {
        prop_assume!(first != second);
        let t0 = Instant::now();
        let mut dedup = ScanDeduplicator::default();
        dedup.record(&first.to_hex(), t0);

        prop_assert!(dedup.should_accept(&second.to_hex(), t0 + Duration::from_millis(gap_ms)));
    }
}
