//! Custom-epoch timestamp codec.
//!
//! CT and LD are whole seconds since 2010-01-01T00:00:00Z rendered as
//! uppercase hex with no padding and no `0x` prefix:
//!
//! ```
//! use cuco_core::timestamp::CucoTimestamp;
//!
//! let ct = CucoTimestamp::from_unix_seconds(1_758_318_301);
//! assert_eq!(ct.encode(), "1D9093DD");
//! assert_eq!(ct.to_iso8601().unwrap(), "2025-09-19T21:45:01.000Z");
//! ```
//!
//! Instants before the epoch encode as a `-` followed by the hex magnitude
//! (`-1F`), and [`CucoTimestamp::parse`] accepts the same form back.

use crate::{Error, Result, constants::CUSTOM_EPOCH};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds since the custom epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CucoTimestamp(i64);

impl CucoTimestamp {
    /// Timestamp for the current wall-clock second.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Timestamp for a UTC instant, truncated to whole seconds.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self::from_unix_seconds(dt.timestamp())
    }

    /// Timestamp for a Unix time in seconds.
    #[must_use]
    pub fn from_unix_seconds(unix_seconds: i64) -> Self {
        CucoTimestamp(unix_seconds.saturating_sub(CUSTOM_EPOCH))
    }

    /// Timestamp from a raw custom-epoch second count.
    #[must_use]
    pub fn from_epoch_seconds(epoch_seconds: i64) -> Self {
        CucoTimestamp(epoch_seconds)
    }

    /// Seconds since the custom epoch.
    #[must_use]
    pub fn epoch_seconds(&self) -> i64 {
        self.0
    }

    /// Seconds since the Unix epoch.
    #[must_use]
    pub fn unix_seconds(&self) -> i64 {
        self.0.saturating_add(CUSTOM_EPOCH)
    }

    /// Deadline `lifetime_seconds` after this timestamp.
    ///
    /// # Errors
    /// Returns `Error::InvalidLifetime` if the addition overflows.
    pub fn deadline(self, lifetime_seconds: i64) -> Result<Self> {
        self.0
            .checked_add(lifetime_seconds)
            .map(CucoTimestamp)
            .ok_or_else(|| {
                Error::InvalidLifetime(format!("{lifetime_seconds} seconds overflows the deadline"))
            })
    }

    /// Encode as uppercase hex.
    #[must_use]
    pub fn encode(&self) -> String {
        if self.0 < 0 {
            format!("-{:X}", self.0.unsigned_abs())
        } else {
            format!("{:X}", self.0)
        }
    }

    /// Parse a custom-epoch hex timestamp (either case, optional leading `-`).
    ///
    /// # Errors
    /// Returns `Error::InvalidTimestamp` if the string is empty, contains
    /// anything other than hex digits, or does not fit in 64 bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use cuco_core::timestamp::CucoTimestamp;
    ///
    /// assert_eq!(CucoTimestamp::parse("1d9093dd").unwrap().epoch_seconds(), 0x1D9093DD);
    /// assert_eq!(CucoTimestamp::parse("-10").unwrap().epoch_seconds(), -16);
    /// assert!(CucoTimestamp::parse("0x10").is_err());
    /// assert!(CucoTimestamp::parse("").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidTimestamp {
                message: format!("'{s}' is not a hex timestamp"),
            });
        }

        let magnitude = i64::from_str_radix(digits, 16).map_err(|e| Error::InvalidTimestamp {
            message: format!("'{s}': {e}"),
        })?;

        Ok(CucoTimestamp(if negative { -magnitude } else { magnitude }))
    }

    /// Convert to a UTC instant.
    ///
    /// # Errors
    /// Returns `Error::InvalidTimestamp` if the instant is outside the range
    /// chrono can represent.
    pub fn to_datetime(&self) -> Result<DateTime<Utc>> {
        let unix_seconds = self.0.checked_add(CUSTOM_EPOCH).ok_or_else(|| {
            Error::InvalidTimestamp {
                message: format!("{} is out of range", self.encode()),
            }
        })?;

        DateTime::from_timestamp(unix_seconds, 0).ok_or_else(|| Error::InvalidTimestamp {
            message: format!("{} is out of range", self.encode()),
        })
    }

    /// Render as an ISO 8601 UTC instant with millisecond precision.
    ///
    /// # Errors
    /// Same as [`CucoTimestamp::to_datetime`].
    pub fn to_iso8601(&self) -> Result<String> {
        Ok(self.to_datetime()?.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl fmt::Display for CucoTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl std::str::FromStr for CucoTimestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CucoTimestamp::parse(s)
    }
}

/// Encode the current time as a CT value.
#[must_use]
pub fn encode_current_time() -> String {
    CucoTimestamp::now().encode()
}

/// Encode `now + lifetime_seconds` as an LD value.
///
/// # Errors
/// Returns `Error::InvalidLifetime` if the deadline overflows.
pub fn encode_deadline(lifetime_seconds: i64) -> Result<String> {
    Ok(CucoTimestamp::now().deadline(lifetime_seconds)?.encode())
}

/// Decode a CT/LD value into an ISO 8601 UTC instant.
///
/// # Errors
/// Returns `Error::InvalidTimestamp` if the value is not valid hex or is out
/// of range.
///
/// # Examples
///
/// ```
/// use cuco_core::timestamp::decode;
///
/// assert_eq!(decode("0").unwrap(), "2010-01-01T00:00:00.000Z");
/// assert_eq!(decode("1db820dd").unwrap(), "2025-10-19T21:45:01.000Z");
/// ```
pub fn decode(hex: &str) -> Result<String> {
    CucoTimestamp::parse(hex)?.to_iso8601()
}
