use thiserror::Error;

/// Errors raised while building, signing or parsing tickets.
///
/// A missing device attribute is not represented here: absent
/// attributes fall through the attribute/default resolution and the field is
/// simply omitted from the ticket.
#[derive(Error, Debug)]
pub enum Error {
    // Ticket selection errors
    #[error("Unknown device state: {code}")]
    UnknownDeviceState { code: String },

    // Hex and key material errors
    #[error("Hex string must have even length, got {length} characters")]
    OddLengthHex { length: usize },

    #[error("Invalid hex: {message}")]
    InvalidHex { message: String },

    #[error("Invalid device address: {message}")]
    InvalidAddress { message: String },

    // Timestamp errors
    #[error("Invalid timestamp: {message}")]
    InvalidTimestamp { message: String },

    #[error("Invalid ticket lifetime: {0}")]
    InvalidLifetime(String),

    // Field record errors
    #[error("Invalid field format: {message}")]
    InvalidFieldFormat { message: String },

    #[error("Duplicate field: {0}")]
    DuplicateField(String),

    // Wire format errors
    #[error("Malformed ticket: {message}")]
    MalformedTicket { message: String },

    // Attribute document errors
    #[error("Invalid attribute document: {message}")]
    InvalidAttributes { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::InvalidHex {
            message: err.to_string(),
        }
    }
}
