//! Common fixtures and assertion helpers for ticket integration tests.
//!
//! The device used throughout is the one the firmware test rig ships with:
//! its address yields serial `8A1054AAC0A0D77CEB6883EF0FC1C515`.
//!
//! Helpers come in two kinds:
//!
//! 1. **Fixtures** (`test_*`) - keys, attributes and defaults with known values
//! 2. **Assertions** (`assert_*`) - check a whole wire ticket in one call

#![allow(dead_code)]

use cuco_core::{CucoTimestamp, DeviceKeys, TicketType};
use cuco_ticket::{Authenticator, Defaults, DeviceAttributes, parse_ticket};

pub const ADDRESS: &str = "0x73a99b188a1054aac0a0d77ceb6883ef0fc1c515";
pub const SERIAL: &str = "8A1054AAC0A0D77CEB6883EF0FC1C515";
pub const AK: &str = "4E8ADD61E02DCD2FDAD9457D9738E370";
pub const UK: &str = "2A6BCC61D12DCD2FDAD9457D9738E421";

/// AK of the published end-to-end ticket example.
pub const REFERENCE_AK: &str = "D53470ED1DE204EAAB9ED03AA8BAEE86";

/// 2025-09-19T21:45:01Z as custom-epoch seconds (`CT=1D9093DD`).
pub const ISSUED_EPOCH_SECONDS: i64 = 0x1D9093DD;

pub fn issued_at() -> CucoTimestamp {
    CucoTimestamp::from_epoch_seconds(ISSUED_EPOCH_SECONDS)
}

pub fn test_keys() -> DeviceKeys {
    DeviceKeys::new(ADDRESS, AK, UK)
}

pub fn reference_keys() -> DeviceKeys {
    DeviceKeys::new(ADDRESS, REFERENCE_AK, UK)
}

/// Attributes with every optional field set.
pub fn test_attributes() -> DeviceAttributes {
    DeviceAttributes::from_json_str(
        r#"{
            "data": [
                ["IT", "TestITValue"],
                ["BT", "TestBTValue"],
                ["BW", "TestBWValue"],
                ["ticketlifetime", 3600],
                ["TW", "TestTWValue"],
                ["MaxUC", "10"]
            ]
        }"#,
    )
    .expect("Test helper: fixture attributes must parse")
}

/// Defaults covering every optional field with distinct values.
pub fn test_defaults() -> Defaults {
    [
        ("IT", "DefaultITValue"),
        ("BT", "DefaultBTValue"),
        ("BW", "DefaultBWValue"),
        ("ticketlifetime", "7200"),
        ("TW", "DefaultTWValue"),
        ("MaxUC", "5"),
    ]
    .into_iter()
    .collect()
}

/// Attributes of the published normal-ticket example.
pub fn reference_attributes() -> DeviceAttributes {
    DeviceAttributes::from_json_str(
        r#"{
            "BT": "Your computer is locked by CUCo Firmware security\\nPlease contact your seller or the CUCo Firmware Support Team at support@cuco-firmware.com or try to unlock at \\nbeta.cuco-firmware.com/ucode/",
            "BW": "This is a test warning message :GNV: :FI:86400",
            "ticketlifetime": 86400,
            "TW": "02A300",
            "MaxUC": "64"
        }"#,
    )
    .expect("Test helper: reference attributes must parse")
}

/// Split a wire ticket into its lines.
pub fn lines(wire: &str) -> Vec<&str> {
    wire.split('\n').collect()
}

/// Field keys of a wire ticket, in order, without the authenticator.
pub fn field_keys(wire: &str) -> Vec<String> {
    parse_ticket(wire)
        .expect("Test helper: ticket must parse")
        .fields()
        .keys()
        .map(str::to_string)
        .collect()
}

/// Assert a wire ticket is well formed, of the given type, and verifies
/// under `keys`.
///
/// # Panics
///
/// Panics if the base fields are wrong, the layout is off, or the signature
/// does not verify.
pub fn assert_ticket_complete(wire: &str, keys: &DeviceKeys, ticket_type: TicketType) {
    let signed = parse_ticket(wire).expect("ticket must parse");
    let fields = signed.fields();

    let keys_in_order: Vec<&str> = fields.keys().take(4).collect();
    assert_eq!(keys_in_order, vec!["V", "TT", "SN", "CT"], "base field order");
    assert_eq!(fields.get("V"), Some("1"));
    assert_eq!(fields.get("TT"), Some(ticket_type.code()));
    assert_eq!(fields.get("SN"), Some(SERIAL));
    assert_eq!(signed.ticket_type().expect("TT must decode"), ticket_type);

    assert!(!wire.ends_with('\n'), "no terminator after authenticator");
    assert!(
        lines(wire)
            .last()
            .is_some_and(|l| l.starts_with("Authenticator=HMAC-SHA256 ")),
        "authenticator must be the last line"
    );

    let authenticator = Authenticator::for_device(keys).expect("AK must be valid");
    assert!(
        authenticator.verify(wire).expect("verify must not fail"),
        "signature must verify"
    );
}

/// Assert the last line carries exactly `signature_hex`.
pub fn assert_authenticator(wire: &str, signature_hex: &str) {
    assert_eq!(
        lines(wire).last().copied(),
        Some(format!("Authenticator=HMAC-SHA256 {signature_hex}").as_str())
    );
}
