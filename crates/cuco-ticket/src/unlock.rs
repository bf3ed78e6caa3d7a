//! Unlock-code derivation.
//!
//! The unlock code is a short window cut from an HMAC-SHA256 digest keyed
//! with the device's UK (byte-flipped like the AK). How the device encodes
//! its challenge is left to implementors of [`UnlockChallenge`].

use crate::auth::Authenticator;
use cuco_core::{
    DeviceKeys, Result,
    bytes::{UnlockWindow, extract_unlock_window},
};
use tracing::debug;

/// Message bytes an unlock code is derived from.
pub trait UnlockChallenge {
    /// Bytes fed to HMAC-SHA256 under the device's UK.
    fn challenge_bytes(&self) -> Vec<u8>;
}

impl UnlockChallenge for [u8] {
    fn challenge_bytes(&self) -> Vec<u8> {
        self.to_vec()
    }
}

impl UnlockChallenge for str {
    fn challenge_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

/// Derive the unlock window for a challenge.
///
/// # Errors
/// Propagates key errors (`Error::OddLengthHex`, `Error::InvalidHex`) for a
/// malformed UK.
///
/// # Example
///
/// ```
/// use cuco_core::DeviceKeys;
/// use cuco_ticket::derive_unlock_code;
///
/// let keys = DeviceKeys::new(
///     "0x73a99b188a1054aac0a0d77ceb6883ef0fc1c515",
///     "4E8ADD61E02DCD2FDAD9457D9738E370",
///     "2A6BCC61D12DCD2FDAD9457D9738E421",
/// );
/// let window = derive_unlock_code(&keys, "unlock-challenge").unwrap();
/// assert_eq!(window.offset(), 5);
/// assert_eq!(window.code(), "40DAD0CE14");
/// ```
pub fn derive_unlock_code<C>(keys: &DeviceKeys, challenge: &C) -> Result<UnlockWindow>
where
    C: UnlockChallenge + ?Sized,
{
    let authenticator = Authenticator::for_unlock(keys)?;
    let digest = authenticator.digest(&challenge.challenge_bytes());
    let window = extract_unlock_window(&digest);
    debug!(offset = window.offset(), "unlock window derived");
    Ok(window)
}
