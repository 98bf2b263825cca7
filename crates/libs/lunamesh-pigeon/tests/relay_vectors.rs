use lunamesh_pigeon::{armor, DeliveryEnvelope, EnvelopeError, InboundText, NodeId};

const HI_HEX: &str = "aa433d78a8402a6147ae147ae107404070a3d70a3d71071e026869";
const HI_WRAPPED: &str = "!BIN!qkM9eKhAKmFHrhR64QdAQHCj1wo9cQceAmhp";

fn hi() -> DeliveryEnvelope {
    DeliveryEnvelope {
        recipient: "!433d78a8".parse::<NodeId>().expect("node id"),
        longitude: 13.19,
        latitude: 32.88,
        altitude: 30,
        text: "hi".into(),
    }
}

#[test]
fn encodes_reference_vector() {
    let bytes = hi().encode().expect("encode");
    assert_eq!(hex::encode(&bytes), HI_HEX);
    assert_eq!(armor::wrap(&bytes), HI_WRAPPED);
}

#[test]
fn decodes_reference_vector() {
    let bytes = armor::unwrap(HI_WRAPPED).expect("unwrap");
    assert_eq!(DeliveryEnvelope::decode(&bytes).expect("decode"), hi());
    assert_eq!(InboundText::classify(HI_WRAPPED).expect("classify"), InboundText::Envelope(hi()));
}

#[test]
fn every_truncation_is_malformed() {
    let bytes = hi().encode().expect("encode");
    for len in 0..bytes.len() {
        let err = DeliveryEnvelope::decode(&bytes[..len]).expect_err("truncated envelope decoded");
        assert!(err.is_malformed_payload(), "len {len}: {err}");
    }
}

#[test]
fn extreme_coordinates_survive_bit_exact() {
    for (lon, lat) in [(-180.0, -90.0), (180.0, 90.0), (0.0, -0.0), (13.191_300_1, 32.887_200_9)] {
        let envelope = DeliveryEnvelope { longitude: lon, latitude: lat, ..hi() };
        let decoded =
            DeliveryEnvelope::decode(&envelope.encode().expect("encode")).expect("decode");
        assert_eq!(decoded.longitude.to_bits(), f64::to_bits(lon));
        assert_eq!(decoded.latitude.to_bits(), f64::to_bits(lat));
    }
}

#[test]
fn envelope_serializes_node_ids_in_text_form() {
    let json = serde_json::to_value(hi()).expect("serialize");
    assert_eq!(json["recipient"], "!433d78a8");
    assert_eq!(json["altitude"], 30);
    assert_eq!(
        serde_json::from_value::<DeliveryEnvelope>(json).expect("deserialize"),
        hi()
    );
}

#[test]
fn text_over_budget_is_not_a_decode_error() {
    let envelope = DeliveryEnvelope { text: "é".repeat(51), ..hi() };
    assert_eq!(envelope.encode(), Err(EnvelopeError::TextTooLong(102)));
}
