//! Hex and byte utilities.
//!
//! The firmware stores keys and digests in the opposite byte order from the
//! host, so both the HMAC key and the finished signature pass through
//! [`flip_hex_bytes`]. The flip works on the hex text: `"AABBCC"` becomes
//! `"CCBBAA"`, the numeric value is never involved.

use crate::{
    Error, Result,
    constants::{UNLOCK_DIGEST_LENGTH, UNLOCK_OFFSET_MASK, UNLOCK_WINDOW_LENGTH},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decode a hex string into bytes.
///
/// Odd-length input is left-padded with a single `0`, so `"ABC"` decodes to
/// `[0x0A, 0xBC]`.
///
/// # Errors
/// Returns `Error::InvalidHex` if the string contains non-hex characters.
///
/// # Examples
///
/// ```
/// use cuco_core::bytes::hex_to_bytes;
///
/// assert_eq!(hex_to_bytes("0aff").unwrap(), vec![0x0A, 0xFF]);
/// assert_eq!(hex_to_bytes("ABC").unwrap(), vec![0x0A, 0xBC]);
/// assert!(hex_to_bytes("zz").is_err());
/// ```
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>> {
    if hex.len() % 2 == 1 {
        return Ok(hex::decode(format!("0{hex}"))?);
    }
    Ok(hex::decode(hex)?)
}

/// Encode bytes as lowercase hex, two characters per byte.
///
/// # Examples
///
/// ```
/// use cuco_core::bytes::bytes_to_hex;
///
/// assert_eq!(bytes_to_hex(&[0x0A, 0xFF]), "0aff");
/// ```
#[must_use]
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Reverse the order of the two-character byte groups of a hex string.
///
/// Case is preserved and the characters are not validated as hex digits
/// beyond being ASCII; decoding is the caller's concern.
///
/// # Errors
/// - `Error::OddLengthHex` if the string has an odd number of characters
/// - `Error::InvalidHex` if the string is not ASCII
///
/// # Examples
///
/// ```
/// use cuco_core::bytes::flip_hex_bytes;
///
/// assert_eq!(flip_hex_bytes("AABBCC").unwrap(), "CCBBAA");
/// assert_eq!(flip_hex_bytes("").unwrap(), "");
/// assert!(flip_hex_bytes("ABC").is_err());
/// ```
pub fn flip_hex_bytes(hex: &str) -> Result<String> {
    if hex.len() % 2 != 0 {
        return Err(Error::OddLengthHex { length: hex.len() });
    }
    if !hex.is_ascii() {
        return Err(Error::InvalidHex {
            message: "hex string must be ASCII".to_string(),
        });
    }

    let mut flipped = String::with_capacity(hex.len());
    for pair in hex.as_bytes().chunks_exact(2).rev() {
        flipped.push(char::from(pair[0]));
        flipped.push(char::from(pair[1]));
    }
    Ok(flipped)
}

/// Short unlock-code material cut from a keyed digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockWindow {
    offset: u8,
    code: String,
}

impl UnlockWindow {
    /// Offset into the digest the window was taken from (0-15).
    #[must_use]
    pub fn offset(&self) -> u8 {
        self.offset
    }

    /// The five window bytes as ten uppercase hex characters.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for UnlockWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Extract the unlock window from a 32-byte digest.
///
/// The offset is the XOR of every digest byte masked to its low nibble, so
/// the window `digest[offset..offset + 5]` always ends at or before byte 20.
///
/// # Examples
///
/// ```
/// use cuco_core::bytes::extract_unlock_window;
///
/// let digest: [u8; 32] = core::array::from_fn(|i| i as u8);
/// let window = extract_unlock_window(&digest);
/// assert_eq!(window.offset(), 0);
/// assert_eq!(window.code(), "0001020304");
/// ```
#[must_use]
pub fn extract_unlock_window(digest: &[u8; UNLOCK_DIGEST_LENGTH]) -> UnlockWindow {
    let folded = digest.iter().fold(0u8, |acc, byte| acc ^ byte);
    let offset = folded & UNLOCK_OFFSET_MASK;
    let start = usize::from(offset);
    let window = &digest[start..start + UNLOCK_WINDOW_LENGTH];

    UnlockWindow {
        offset,
        code: hex::encode_upper(window),
    }
}

/// Extract the unlock window from a 64-character hex digest.
///
/// # Errors
/// - `Error::InvalidHex` if the input is not exactly 64 hex characters
///
/// # Examples
///
/// ```
/// use cuco_core::bytes::unlock_window_from_hex;
///
/// let window = unlock_window_from_hex(&"ff".repeat(32)).unwrap();
/// assert_eq!(window.offset(), 0);
/// assert_eq!(window.code(), "FFFFFFFFFF");
///
/// assert!(unlock_window_from_hex("abcd").is_err());
/// ```
pub fn unlock_window_from_hex(digest_hex: &str) -> Result<UnlockWindow> {
    let bytes = hex::decode(digest_hex)?;
    let digest: [u8; UNLOCK_DIGEST_LENGTH] =
        bytes.try_into().map_err(|bytes: Vec<u8>| Error::InvalidHex {
            message: format!(
                "unlock digest must be {UNLOCK_DIGEST_LENGTH} bytes, got {}",
                bytes.len()
            ),
        })?;
    Ok(extract_unlock_window(&digest))
}
