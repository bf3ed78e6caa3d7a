//! HMAC-SHA256 ticket authentication.
//!
//! Device firmware stores keys and reads digests in the opposite byte order
//! from this side, so both the key and the finished digest are byte-flipped:
//!
//! ```text
//! key    = hex_decode(flip(AK))
//! digest = HMAC-SHA256(key, canonical_text)
//! line   = "Authenticator=HMAC-SHA256 " + flip(hex(digest))
//! ```

use crate::{
    field::FieldRecord,
    serializer::{canonical_text, parse_ticket},
};
use cuco_core::{
    DeviceKeys, Error, Result,
    bytes::{bytes_to_hex, flip_hex_bytes, hex_to_bytes},
    constants::{AUTHENTICATOR_KEY, AUTHENTICATOR_SCHEME, UNLOCK_DIGEST_LENGTH},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;
use tracing::trace;

type HmacSha256 = Hmac<Sha256>;

/// Keyed signer for one device.
///
/// # Example
///
/// ```
/// use cuco_ticket::{Authenticator, FieldRecord};
///
/// let auth = Authenticator::from_hex_key("D53470ED1DE204EAAB9ED03AA8BAEE86").unwrap();
///
/// let mut fields = FieldRecord::new();
/// fields.insert("V", "1").unwrap();
/// fields.insert("TT", "F").unwrap();
///
/// let line = auth.sign(&fields).unwrap();
/// assert!(line.starts_with("Authenticator=HMAC-SHA256 "));
/// assert_eq!(line.len(), "Authenticator=HMAC-SHA256 ".len() + 64);
/// ```
#[derive(Clone)]
pub struct Authenticator {
    mac: HmacSha256,
}

impl Authenticator {
    /// Build a signer from a hex key as stored on the device.
    ///
    /// # Errors
    /// - `Error::OddLengthHex` if the key has an odd number of hex digits
    /// - `Error::InvalidHex` if the key is empty or not hex
    pub fn from_hex_key(key_hex: &str) -> Result<Self> {
        if key_hex.is_empty() {
            return Err(Error::InvalidHex {
                message: "HMAC key must not be empty".to_string(),
            });
        }
        let key = hex_to_bytes(&flip_hex_bytes(key_hex)?)?;
        let mac = HmacSha256::new_from_slice(&key).map_err(|e| Error::InvalidHex {
            message: format!("unusable HMAC key: {e}"),
        })?;
        Ok(Authenticator { mac })
    }

    /// Ticket signer keyed with the device's AK.
    ///
    /// # Errors
    /// Same as [`Authenticator::from_hex_key`].
    pub fn for_device(keys: &DeviceKeys) -> Result<Self> {
        Self::from_hex_key(keys.ak())
    }

    /// Unlock-code signer keyed with the device's UK.
    ///
    /// # Errors
    /// Same as [`Authenticator::from_hex_key`].
    pub fn for_unlock(keys: &DeviceKeys) -> Result<Self> {
        Self::from_hex_key(keys.uk())
    }

    /// Raw HMAC-SHA256 digest of `message`, before any byte flip.
    #[must_use]
    pub fn digest(&self, message: &[u8]) -> [u8; UNLOCK_DIGEST_LENGTH] {
        let mut mac = self.mac.clone();
        mac.update(message);
        let mut digest = [0u8; UNLOCK_DIGEST_LENGTH];
        digest.copy_from_slice(&mac.finalize().into_bytes());
        digest
    }

    /// Flipped lowercase hex signature over an already rendered canonical text.
    ///
    /// # Errors
    /// Propagates `Error::OddLengthHex` from the byte flip.
    pub fn signature_for_text(&self, canonical: &str) -> Result<String> {
        let digest_hex = bytes_to_hex(&self.digest(canonical.as_bytes()));
        let signature = flip_hex_bytes(&digest_hex)?;
        trace!(bytes = canonical.len(), "signature computed");
        Ok(signature)
    }

    /// Flipped lowercase hex signature over the record's canonical text.
    ///
    /// # Errors
    /// Same as [`Authenticator::signature_for_text`].
    pub fn signature_hex(&self, fields: &FieldRecord) -> Result<String> {
        self.signature_for_text(&canonical_text(fields))
    }

    /// The complete `Authenticator=HMAC-SHA256 <hex>` line.
    ///
    /// # Errors
    /// Same as [`Authenticator::signature_for_text`].
    pub fn sign(&self, fields: &FieldRecord) -> Result<String> {
        Ok(authenticator_line(&self.signature_hex(fields)?))
    }

    /// Check a serialized ticket against this key.
    ///
    /// Returns `Ok(false)` for a well-formed ticket whose signature does not
    /// match. Hex case of the received signature is ignored.
    ///
    /// # Errors
    /// Returns `Error::MalformedTicket` (or a field error) if `wire` cannot
    /// be parsed.
    pub fn verify(&self, wire: &str) -> Result<bool> {
        let signed = parse_ticket(wire)?;
        let expected = self.signature_hex(signed.fields())?;
        let received = signed.authenticator_hex().to_ascii_lowercase();
        Ok(expected.as_bytes().ct_eq(received.as_bytes()).into())
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator").finish_non_exhaustive()
    }
}

pub(crate) fn authenticator_line(signature_hex: &str) -> String {
    format!("{AUTHENTICATOR_KEY}={AUTHENTICATOR_SCHEME} {signature_hex}")
}
