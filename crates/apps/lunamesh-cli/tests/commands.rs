use std::time::Duration;

use lunamesh_cli::commands::{self, CommandError, Simulate};
use lunamesh_delivery::{
    DeliveryState, DeliveryTracker, Destination, FailureCause, PigeonMailForm, SubmitError,
    ValidationError,
};
use lunamesh_geo::Coordinate;
use lunamesh_pigeon::{ArmorError, EnvelopeError, NodeId};

fn hi_form() -> PigeonMailForm {
    PigeonMailForm {
        latitude: Some(32.88),
        longitude: Some(13.19),
        text: "hi".into(),
        ..PigeonMailForm::default()
    }
}

#[test]
fn encode_reports_hex_and_wrapped_text() {
    let report = commands::encode(&hi_form(), None).expect("encode");
    assert_eq!(report.bytes, 27);
    assert_eq!(report.hex, "aa433d78a8402a6147ae147ae107404070a3d70a3d71071e026869");
    assert_eq!(report.wrapped, "!BIN!qkM9eKhAKmFHrhR64QdAQHCj1wo9cQceAmhp");

    let json = serde_json::to_value(&report).expect("json");
    assert_eq!(json["admissibility"]["status"], "indeterminate");
    assert_eq!(json["message"]["drone"], "!433d7cd8");
}

#[test]
fn encode_surfaces_validation_errors() {
    let form = PigeonMailForm { altitude: 150.0, ..hi_form() };
    assert!(matches!(
        commands::encode(&form, None),
        Err(CommandError::Submit(SubmitError::Validation(_)))
    ));
}

#[test]
fn decode_accepts_wrapped_and_hex() {
    let from_wrapped =
        commands::decode("!BIN!qkM9eKhAKmFHrhR64QdAQHCj1wo9cQceAmhp\n").expect("wrapped");
    let from_hex =
        commands::decode("aa 433d78a8 402a6147ae147ae1 07 404070a3d70a3d71 07 1e 02 6869")
            .expect("hex");
    assert_eq!(from_wrapped, from_hex);
    assert_eq!(from_hex.text, "hi");
    assert_eq!(from_hex.recipient, NodeId(0x433d_78a8));
}

#[test]
fn decode_errors() {
    assert!(matches!(commands::decode("not hex"), Err(CommandError::Hex(_))));
    assert!(matches!(
        commands::decode("!BIN!@@@"),
        Err(CommandError::Armor(ArmorError::InvalidEncoding(_)))
    ));
    assert!(matches!(
        commands::decode("ab01"),
        Err(CommandError::Envelope(EnvelopeError::TooShort(2)))
    ));
}

#[tokio::test]
async fn send_acknowledged() {
    let reference = Some(Coordinate::new(32.8872, 13.1913));
    let report =
        commands::send_pigeon_mail(Simulate::Ack, DeliveryTracker::new(), &hi_form(), reference)
            .await
            .expect("send");
    assert_eq!(report.record.state, DeliveryState::Acknowledged);
    assert_eq!(report.record.message_id, Some(1));
    assert_eq!(report.frames.len(), 1);
    assert_eq!(report.frames[0].text, report.submission.text);
}

#[tokio::test]
async fn send_rejected_with_partial_id() {
    let report =
        commands::send_pigeon_mail(Simulate::RejectWithId, DeliveryTracker::new(), &hi_form(), None)
            .await
            .expect("send");
    assert_eq!(report.record.state, DeliveryState::Failed);
    assert_eq!(report.record.message_id, Some(1));
}

#[tokio::test(start_paused = true)]
async fn send_stalled_times_out() {
    let tracker = DeliveryTracker::with_settle_timeout(Duration::from_secs(5));
    let report = commands::send_pigeon_mail(Simulate::Stall, tracker, &hi_form(), None)
        .await
        .expect("send");
    assert_eq!(report.record.failure, Some(FailureCause::Timeout));
}

#[tokio::test]
async fn chat_goes_to_broadcast() {
    let report = commands::send_chat(
        Simulate::NoId,
        DeliveryTracker::new(),
        Destination::Broadcast,
        4,
        200,
        " ping ",
    )
    .await
    .expect("send");
    assert_eq!(report.frames[0].text, "ping");
    assert_eq!(report.frames[0].destination, Destination::Broadcast);
    assert_eq!(report.record.failure, Some(FailureCause::MissingMessageId));
}

#[tokio::test]
async fn chat_rejects_channels_off_the_mesh() {
    let tracker = DeliveryTracker::new();
    let result =
        commands::send_chat(Simulate::Ack, tracker, Destination::Broadcast, 9, 200, "hi").await;
    assert!(matches!(
        result,
        Err(CommandError::Submit(SubmitError::Validation(ValidationError::OutOfRange {
            field: "channel",
            ..
        })))
    ));
}

#[test]
fn distance_verdict() {
    let report = commands::distance(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.1));
    assert!((report.distance_km - 11.12).abs() < 0.01);
    assert!(report.admissibility.permits_submission());
}
