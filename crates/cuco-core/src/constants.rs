//! Core constants for the CUCo ticket protocol.
//!
//! A ticket is a list of `KEY=VALUE` lines closed by an authenticator line:
//!
//! ```text
//! V=1
//! TT=N
//! SN=8A1054AAC0A0D77CEB6883EF0FC1C515
//! CT=1D9093DD
//! LD=1D91E55D
//! TW=02A300
//! MaxUC=64
//! Authenticator=HMAC-SHA256 <64 hex chars>
//! ```
//!
//! Field order is part of the signed payload and is fixed per ticket type.
//! Modifying any value in this module breaks compatibility with deployed
//! firmware.

// ============================================================================
// Custom Epoch
// ============================================================================

/// Unix time of 2010-01-01T00:00:00Z in whole seconds.
///
/// CT and LD count seconds from this instant, which keeps the hex
/// timestamps eight characters long for the foreseeable future.
///
/// # Examples
///
/// ```
/// use cuco_core::constants::CUSTOM_EPOCH;
///
/// assert_eq!(CUSTOM_EPOCH, 1_262_304_000);
/// ```
pub const CUSTOM_EPOCH: i64 = 1_262_304_000;

// ============================================================================
// Wire Format
// ============================================================================

/// Protocol version emitted in every `V` field.
pub const PROTOCOL_VERSION: &str = "1";

/// Separator between a field key and its value.
pub const KEY_VALUE_SEPARATOR: char = '=';

/// Terminator written after every field line, including the last one.
pub const LINE_TERMINATOR: char = '\n';

/// Key of the trailing signature line.
///
/// Reserved: it can never appear inside a field record.
pub const AUTHENTICATOR_KEY: &str = "Authenticator";

/// Algorithm tag written before the signature hex.
///
/// # Examples
///
/// ```
/// use cuco_core::constants::{AUTHENTICATOR_KEY, AUTHENTICATOR_SCHEME};
///
/// let line = format!("{AUTHENTICATOR_KEY}={AUTHENTICATOR_SCHEME} {}", "ab".repeat(32));
/// assert!(line.starts_with("Authenticator=HMAC-SHA256 "));
/// ```
pub const AUTHENTICATOR_SCHEME: &str = "HMAC-SHA256";

/// Length in hex characters of an HMAC-SHA256 signature.
pub const SIGNATURE_HEX_LENGTH: usize = 64;

// ============================================================================
// Field Keys
// ============================================================================

/// Protocol version.
pub const FIELD_VERSION: &str = "V";
/// Ticket type (F, N, B, S).
pub const FIELD_TICKET_TYPE: &str = "TT";
/// Device serial number.
pub const FIELD_SERIAL: &str = "SN";
/// Creation time, custom-epoch hex.
pub const FIELD_CREATED: &str = "CT";
/// Lifetime deadline, custom-epoch hex.
pub const FIELD_DEADLINE: &str = "LD";
/// Info text.
pub const FIELD_INFO_TEXT: &str = "IT";
/// Blocked text.
pub const FIELD_BLOCKED_TEXT: &str = "BT";
/// Blocked warning text.
pub const FIELD_BLOCKED_WARNING: &str = "BW";
/// Time window.
pub const FIELD_TIME_WINDOW: &str = "TW";
/// Maximum unlock-code count.
pub const FIELD_MAX_UNLOCK_CODES: &str = "MaxUC";
/// Authentication key type.
pub const FIELD_KEY_TYPE: &str = "AKT";
/// Authentication key.
pub const FIELD_AUTH_KEY: &str = "AK";
/// Unlock key.
pub const FIELD_UNLOCK_KEY: &str = "UK";

/// Attribute holding the ticket lifetime in seconds.
///
/// Never emitted itself; it only feeds the `LD` field.
pub const ATTR_TICKET_LIFETIME: &str = "ticketlifetime";

/// Value of `AKT` on start tickets.
pub const KEY_TYPE_START: &str = "S";

// ============================================================================
// Device Identification
// ============================================================================

/// Number of leading address characters dropped to form the serial number.
///
/// The on-chain address `0x73a99b188a1054aac0a0d77ceb6883ef0fc1c515` yields
/// the serial `8A1054AAC0A0D77CEB6883EF0FC1C515`.
///
/// # Examples
///
/// ```
/// use cuco_core::constants::SERIAL_PREFIX_LENGTH;
///
/// let address = "0x73a99b188a1054aac0a0d77ceb6883ef0fc1c515";
/// assert_eq!(&address[SERIAL_PREFIX_LENGTH..], "8a1054aac0a0d77ceb6883ef0fc1c515");
/// ```
pub const SERIAL_PREFIX_LENGTH: usize = 10;

/// Request parameter value that forces a start ticket.
pub const CHECK_SENTINEL: &str = "checkme";

// ============================================================================
// Unlock Codes
// ============================================================================

/// Size in bytes of the keyed digest fed to the unlock window extractor.
pub const UNLOCK_DIGEST_LENGTH: usize = 32;

/// Number of digest bytes copied into an unlock code.
pub const UNLOCK_WINDOW_LENGTH: usize = 5;

/// Mask applied to the XOR-folded digest to pick the window offset.
pub const UNLOCK_OFFSET_MASK: u8 = 0x0F;
