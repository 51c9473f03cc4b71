//! Integration tests for the custom-identifier exchange.
//!
//! Each case scripts how a target answers SELECT and READ and checks the
//! resolved identifier, the device class, the commands sent and that the
//! target was released exactly once.

mod common;

use std::time::Duration;

use classtap_core::DeviceClass;
use classtap_hardware::PresenceDetector;
use classtap_hardware::mock::{MockReply, MockTarget};
use classtap_protocol::{ApduCommand, ApduError, StatusWord};
use classtap_scanner::{ExchangeStage, Fallback, perform_custom_identifier_exchange, resolve};
use common::{LogCapture, reader_with_target, test_data, uid};
use rstest::rstest;

const SELECT_OK: &[u8] = &[0x00, 0x90, 0x00];
const READ_OK: &[u8] = &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x90, 0x00];

fn reply(bytes: &[u8]) -> MockReply {
    MockReply::Response(bytes.to_vec())
}

fn scripted(replies: Vec<MockReply>) -> MockTarget {
    replies
        .into_iter()
        .fold(MockTarget::scripted(uid()), |target, r| match r {
            MockReply::Response(bytes) => target.reply(bytes),
            MockReply::TransportError => target.transport_error(),
        })
}

#[rstest]
#[case::select_transport_error(vec![MockReply::TransportError], false, 1, DeviceClass::PhysicalTag)]
#[case::select_too_short(vec![reply(&[0x90, 0x00])], false, 1, DeviceClass::PhysicalTag)]
#[case::select_transport_status(vec![reply(&[0x01, 0x90, 0x00])], false, 1, DeviceClass::PhysicalTag)]
#[case::select_not_found(vec![reply(&[0x00, 0x6A, 0x82])], false, 1, DeviceClass::PhysicalTag)]
#[case::read_transport_error(vec![reply(SELECT_OK), MockReply::TransportError], false, 2, DeviceClass::PhysicalTag)]
#[case::read_wrong_length_status(vec![reply(SELECT_OK), reply(&[0x00, 0x67, 0x00])], false, 2, DeviceClass::PhysicalTag)]
#[case::read_short_payload(vec![reply(SELECT_OK), reply(&[0x00, 1, 2, 3, 4, 5, 6, 0x90, 0x00])], false, 2, DeviceClass::PhysicalTag)]
#[case::read_long_payload(vec![reply(SELECT_OK), reply(&[0x00, 1, 2, 3, 4, 5, 6, 7, 8, 0x90, 0x00])], false, 2, DeviceClass::PhysicalTag)]
#[case::custom_identifier(vec![reply(SELECT_OK), reply(READ_OK)], false, 2, DeviceClass::CustomBroadcast)]
#[case::custom_identifier_release_fails(vec![reply(SELECT_OK), reply(READ_OK)], true, 2, DeviceClass::CustomBroadcast)]
#[case::select_error_release_fails(vec![MockReply::TransportError], true, 1, DeviceClass::PhysicalTag)]
#[tokio::test]
async fn test_release_once_per_exchange(
    #[case] replies: Vec<MockReply>,
    #[case] release_fails: bool,
    #[case] commands_sent: usize,
    #[case] expected_class: DeviceClass,
) {
    let (mut reader, handle) = reader_with_target(scripted(replies)).await;
    handle.set_release_failure(release_fails);

    let outcome = perform_custom_identifier_exchange(&mut reader, &uid()).await;
    let resolution = resolve(&uid(), outcome.custom_identifier());

    assert_eq!(handle.release_count(), 1);
    assert_eq!(handle.sent_commands().len(), commands_sent);
    assert_eq!(resolution.device_class, expected_class);
    match expected_class {
        DeviceClass::CustomBroadcast => assert_eq!(resolution.identifier, test_data::CUSTOM_HEX),
        DeviceClass::PhysicalTag => assert_eq!(resolution.identifier, test_data::UID),
    }
}

#[tokio::test]
async fn test_plain_tag_falls_back_to_hardware_id() {
    let (mut reader, handle) = reader_with_target(MockTarget::physical_tag(uid())).await;

    let outcome = perform_custom_identifier_exchange(&mut reader, &uid()).await;
    let resolution = resolve(&uid(), outcome.custom_identifier());

    assert_eq!(resolution.identifier, "04A1B2C3");
    assert_eq!(resolution.device_class, DeviceClass::PhysicalTag);
    assert!(matches!(
        outcome.fallback(),
        Some(Fallback::Unsupported {
            stage: ExchangeStage::Select,
            ..
        })
    ));
    assert_eq!(handle.release_count(), 1);
}

#[tokio::test]
async fn test_phone_broadcasts_custom_identifier() {
    let (mut reader, handle) =
        reader_with_target(scripted(vec![reply(SELECT_OK), reply(READ_OK)])).await;

    let outcome = perform_custom_identifier_exchange(&mut reader, &uid()).await;
    let resolution = resolve(&uid(), outcome.custom_identifier());

    assert_eq!(resolution.identifier, "11223344556677");
    assert_eq!(resolution.device_class, DeviceClass::CustomBroadcast);
    assert_eq!(
        handle.sent_commands(),
        vec![
            ApduCommand::select_room_entry().to_vec(),
            ApduCommand::read_custom_identifier().to_vec()
        ]
    );
    assert_eq!(handle.release_count(), 1);
}

#[tokio::test]
async fn test_unknown_application_is_protocol_anomaly() {
    let (mut reader, handle) =
        reader_with_target(scripted(vec![reply(&[0x00, 0x6A, 0x82])])).await;

    let outcome = perform_custom_identifier_exchange(&mut reader, &uid()).await;
    let resolution = resolve(&uid(), outcome.custom_identifier());

    assert_eq!(resolution.identifier, "04A1B2C3");
    assert_eq!(resolution.device_class, DeviceClass::PhysicalTag);
    assert!(outcome.is_anomaly());
    match outcome.fallback() {
        Some(Fallback::Anomaly {
            stage: ExchangeStage::Select,
            error: ApduError::StatusWord { status, raw },
        }) => {
            assert_eq!(*status, StatusWord::FILE_NOT_FOUND);
            assert_eq!(raw, "006A82");
        }
        other => panic!("unexpected fallback: {other:?}"),
    }
    assert_eq!(handle.release_count(), 1);
}

#[tokio::test]
async fn test_plain_tag_fallback_logs_at_debug_only() {
    let logs = LogCapture::default();
    let _guard = logs.install();
    let (mut reader, _handle) = reader_with_target(MockTarget::physical_tag(uid())).await;

    perform_custom_identifier_exchange(&mut reader, &uid()).await;

    assert!(logs.lines_at("WARN").is_empty());
    assert!(logs.lines_at("ERROR").is_empty());
    assert!(
        logs.lines_at("DEBUG")
            .iter()
            .any(|line| line.contains("04A1B2C3 does not support SELECT"))
    );
}

#[tokio::test]
async fn test_protocol_anomaly_logs_warning_with_raw_bytes() {
    let logs = LogCapture::default();
    let _guard = logs.install();
    let (mut reader, _handle) =
        reader_with_target(scripted(vec![reply(&[0x00, 0x6A, 0x82])])).await;

    perform_custom_identifier_exchange(&mut reader, &uid()).await;

    let warnings = logs.lines_at("WARN");
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].contains("SELECT"));
    assert!(warnings[0].contains("006A82"));
    assert!(
        !logs
            .lines_at("DEBUG")
            .iter()
            .any(|line| line.contains("does not support"))
    );
}

#[tokio::test]
async fn test_phone_service_with_other_aid_is_rejected() {
    let (mut reader, handle) = reader_with_target(MockTarget::hce_service(
        uid(),
        &[0xA0, 0x00, 0x00, 0x00, 0x03],
        &test_data::CUSTOM,
    ))
    .await;

    let outcome = perform_custom_identifier_exchange(&mut reader, &uid()).await;

    assert!(outcome.custom_identifier().is_none());
    assert!(outcome.is_anomaly());
    assert_eq!(handle.sent_commands().len(), 1);
    assert_eq!(handle.release_count(), 1);
}

#[tokio::test]
async fn test_each_exchange_releases_once() {
    let (mut reader, handle) =
        reader_with_target(MockTarget::hce_phone(uid(), common::custom())).await;

    perform_custom_identifier_exchange(&mut reader, &uid()).await;
    assert_eq!(handle.release_count(), 1);

    // Target came back into the field
    handle
        .present(MockTarget::hce_phone(uid(), common::custom()))
        .await
        .unwrap();
    reader.poll_target(Duration::from_millis(10)).await.unwrap();
    perform_custom_identifier_exchange(&mut reader, &uid()).await;

    assert_eq!(handle.release_count(), 2);
}
