use crate::{
    Error, Result,
    constants::{CHECK_SENTINEL, SERIAL_PREFIX_LENGTH},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Key material for one device, as held by the key store.
///
/// `ak` signs tickets; `uk` only feeds unlock-code derivation. Field names
/// follow the key store's JSON (`Address`, `AK`, `UK`).
///
/// # Security
/// `Debug` redacts both keys and equality is constant-time over the key
/// bytes.
#[derive(Clone, Eq, Serialize, Deserialize)]
pub struct DeviceKeys {
    #[serde(rename = "Address", default)]
    address: String,
    #[serde(rename = "AK")]
    ak: String,
    #[serde(rename = "UK")]
    uk: String,
}

impl DeviceKeys {
    /// Bundle an address with its authentication and unlock keys.
    #[must_use]
    pub fn new(address: impl Into<String>, ak: impl Into<String>, uk: impl Into<String>) -> Self {
        DeviceKeys {
            address: address.into(),
            ak: ak.into(),
            uk: uk.into(),
        }
    }

    /// On-chain device address (`0x`-prefixed hex).
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Authentication key as hex.
    #[must_use]
    pub fn ak(&self) -> &str {
        &self.ak
    }

    /// Unlock key as hex.
    #[must_use]
    pub fn uk(&self) -> &str {
        &self.uk
    }

    /// Serial number derived from the address.
    ///
    /// # Errors
    /// Returns `Error::InvalidAddress` if the address is too short.
    pub fn serial_number(&self) -> Result<SerialNumber> {
        SerialNumber::from_address(&self.address)
    }
}

impl fmt::Debug for DeviceKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceKeys")
            .field("address", &self.address)
            .field("ak", &"<redacted>")
            .field("uk", &"<redacted>")
            .finish()
    }
}

impl PartialEq for DeviceKeys {
    fn eq(&self, other: &Self) -> bool {
        let keys_eq = self.ak.as_bytes().ct_eq(other.ak.as_bytes())
            & self.uk.as_bytes().ct_eq(other.uk.as_bytes());
        self.address == other.address && bool::from(keys_eq)
    }
}

/// Device serial number: the address without its first ten characters,
/// upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerialNumber(String);

impl SerialNumber {
    /// Derive the serial number from an on-chain address.
    ///
    /// # Errors
    /// Returns `Error::InvalidAddress` if the address is not ASCII or has
    /// nothing left after the prefix.
    ///
    /// # Examples
    ///
    /// ```
    /// use cuco_core::SerialNumber;
    ///
    /// let sn = SerialNumber::from_address("0x73a99b188a1054aac0a0d77ceb6883ef0fc1c515").unwrap();
    /// assert_eq!(sn.as_str(), "8A1054AAC0A0D77CEB6883EF0FC1C515");
    ///
    /// assert!(SerialNumber::from_address("0x73a99b18").is_err());
    /// ```
    pub fn from_address(address: &str) -> Result<Self> {
        if !address.is_ascii() {
            return Err(Error::InvalidAddress {
                message: format!("'{address}' is not ASCII"),
            });
        }
        if address.len() <= SERIAL_PREFIX_LENGTH {
            return Err(Error::InvalidAddress {
                message: format!(
                    "'{address}' must be longer than {SERIAL_PREFIX_LENGTH} characters"
                ),
            });
        }
        Ok(SerialNumber(address[SERIAL_PREFIX_LENGTH..].to_ascii_uppercase()))
    }

    /// Wrap an already-derived serial number, normalizing it to uppercase.
    ///
    /// # Errors
    /// Returns `Error::InvalidAddress` if the serial is empty.
    pub fn new(serial: &str) -> Result<Self> {
        let serial = serial.trim();
        if serial.is_empty() {
            return Err(Error::InvalidAddress {
                message: "serial number is empty".to_string(),
            });
        }
        Ok(SerialNumber(serial.to_ascii_uppercase()))
    }

    /// Get the serial number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SerialNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SerialNumber::new(s)
    }
}

/// Lock state reported by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceState {
    /// `"0"` - the device runs unrestricted.
    Free,
    /// `"1"` - the device runs under an active lease.
    Normal,
    /// `"2"` - the device is locked.
    Blocked,
}

impl DeviceState {
    /// Parse the ledger's state code.
    ///
    /// # Errors
    /// Returns `Error::UnknownDeviceState` for anything other than `"0"`,
    /// `"1"` or `"2"`.
    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "0" => Ok(DeviceState::Free),
            "1" => Ok(DeviceState::Normal),
            "2" => Ok(DeviceState::Blocked),
            _ => Err(Error::UnknownDeviceState {
                code: code.to_string(),
            }),
        }
    }

    /// The ledger's state code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            DeviceState::Free => "0",
            DeviceState::Normal => "1",
            DeviceState::Blocked => "2",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeviceState::Free => write!(f, "Free"),
            DeviceState::Normal => write!(f, "Normal"),
            DeviceState::Blocked => write!(f, "Blocked"),
        }
    }
}

impl std::str::FromStr for DeviceState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DeviceState::from_code(s)
    }
}

/// Ticket type, emitted as the `TT` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketType {
    Free,
    Normal,
    Blocked,
    Start,
}

impl TicketType {
    /// Create a ticket type from its `TT` character.
    ///
    /// Valid codes: 'F' (Free), 'N' (Normal), 'B' (Blocked), 'S' (Start).
    ///
    /// # Errors
    /// Returns `Error::InvalidFieldFormat` for any other character.
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            'F' => Ok(TicketType::Free),
            'N' => Ok(TicketType::Normal),
            'B' => Ok(TicketType::Blocked),
            'S' => Ok(TicketType::Start),
            _ => Err(Error::InvalidFieldFormat {
                message: format!("Invalid ticket type: {c}"),
            }),
        }
    }

    /// Convert the ticket type to its `TT` character.
    #[must_use]
    pub fn to_char(self) -> char {
        match self {
            TicketType::Free => 'F',
            TicketType::Normal => 'N',
            TicketType::Blocked => 'B',
            TicketType::Start => 'S',
        }
    }

    /// The `TT` value as a string slice.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            TicketType::Free => "F",
            TicketType::Normal => "N",
            TicketType::Blocked => "B",
            TicketType::Start => "S",
        }
    }
}

impl From<DeviceState> for TicketType {
    fn from(state: DeviceState) -> Self {
        match state {
            DeviceState::Free => TicketType::Free,
            DeviceState::Normal => TicketType::Normal,
            DeviceState::Blocked => TicketType::Blocked,
        }
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// What the requester asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIntent {
    /// Explicit check/diagnostic request; always yields a start ticket.
    pub explicit_check: bool,
}

impl RequestIntent {
    /// A regular state request.
    #[must_use]
    pub fn normal() -> Self {
        RequestIntent {
            explicit_check: false,
        }
    }

    /// An explicit check request.
    #[must_use]
    pub fn check() -> Self {
        RequestIntent {
            explicit_check: true,
        }
    }

    /// Interpret the request's `t` parameter.
    ///
    /// # Examples
    ///
    /// ```
    /// use cuco_core::RequestIntent;
    ///
    /// assert!(RequestIntent::from_query(Some("checkme")).explicit_check);
    /// assert!(!RequestIntent::from_query(Some("normal")).explicit_check);
    /// assert!(!RequestIntent::from_query(None).explicit_check);
    /// ```
    #[must_use]
    pub fn from_query(t: Option<&str>) -> Self {
        RequestIntent {
            explicit_check: t == Some(CHECK_SENTINEL),
        }
    }
}
