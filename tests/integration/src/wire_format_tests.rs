//! Collector wire contract and crypto determinism tests.

use crate::test_utils::test_location;
use echogrid_core::{EntryKind, QueueEntry};
use echogrid_crypto::{decrypt_channel_message, derive_material, encrypt_channel_message};

#[test]
fn material_derivation_is_stable_across_calls() {
    let first = derive_material("#CoverageNet").unwrap();
    let second = derive_material("#coveragenet").unwrap();

    assert_eq!(hex::encode(first.key), hex::encode(second.key));
    assert_eq!(first.header_tag, second.header_tag);
    assert_eq!(first.name, "#coveragenet");
}

#[test]
fn channel_message_round_trip() {
    let material = derive_material("#coverage").unwrap();
    let text = "@[MapperBot] 45.42153, -75.69719";

    let payload = encrypt_channel_message(&material, 1_700_000_000, 0, text);
    let message = decrypt_channel_message(&payload, &material.key).unwrap();

    assert_eq!(message.timestamp, 1_700_000_000);
    assert_eq!(message.text, text);
}

#[test]
fn batch_serializes_as_json_array_with_wire_fields() {
    let entries = vec![
        QueueEntry::new(
            EntryKind::Tx,
            test_location(),
            "4e(11.5),b7(9.75)".to_string(),
            1_700_000_000_000,
        ),
        QueueEntry::new(EntryKind::Rx, test_location(), "None".to_string(), 1_700_000_001_000)
            .with_debug("hops=2,rssi=-92"),
    ];

    let json = serde_json::to_value(&entries).unwrap();
    let array = json.as_array().unwrap();
    assert_eq!(array.len(), 2);

    assert_eq!(array[0]["kind"], "tx");
    assert_eq!(array[0]["heard"], "4e(11.5),b7(9.75)");
    assert_eq!(array[0]["lat"], 45.42153);
    assert_eq!(array[0]["lon"], -75.69719);
    assert_eq!(array[0]["timestamp_ms"], 1_700_000_000_000u64);
    assert!(array[0].get("debug").is_none());

    assert_eq!(array[1]["kind"], "rx");
    assert_eq!(array[1]["heard"], "None");
    assert_eq!(array[1]["debug"], "hops=2,rssi=-92");
}

#[test]
fn entries_deserialize_back_from_wire_json() {
    let json = r#"[{"kind":"rx","lat":45.0,"lon":-75.0,"heard":"b7(9.75)","timestamp_ms":1000}]"#;
    let entries: Vec<QueueEntry> = serde_json::from_str(json).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EntryKind::Rx);
    assert_eq!(entries[0].heard, "b7(9.75)");
    assert!(entries[0].debug.is_none());
}
