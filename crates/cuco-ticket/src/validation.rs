//! Field validation for ticket line safety.
//!
//! Every field becomes one `KEY=VALUE` line of the signed payload. A line
//! terminator inside a value, or a `=` inside a key, would let one field
//! masquerade as several and change what the authenticator covers, so both
//! are rejected before a field reaches a record.
//!
//! # Examples
//!
//! ```
//! use cuco_ticket::validation::{validate_key, validate_value};
//!
//! assert!(validate_key("MaxUC").is_ok());
//! assert!(validate_key("Max=UC").is_err());
//! assert!(validate_key("Authenticator").is_err());
//!
//! // Literal backslash-n sequences are ordinary text
//! assert!(validate_value("locked\\ncontact support").is_ok());
//! assert!(validate_value("locked\ncontact support").is_err());
//! ```

use cuco_core::{
    Error, Result,
    constants::{AUTHENTICATOR_KEY, KEY_VALUE_SEPARATOR},
};

/// Validate a field key.
///
/// # Errors
///
/// Returns `Error::InvalidFieldFormat` if the key is empty, contains `=`,
/// `\n` or `\r`, or is the reserved `Authenticator` key.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidFieldFormat {
            message: "Field key must not be empty".to_string(),
        });
    }
    if key.contains(KEY_VALUE_SEPARATOR) || contains_line_break(key) {
        return Err(Error::InvalidFieldFormat {
            message: format!("Field key '{}' contains '=' or a line break", key.escape_debug()),
        });
    }
    if key == AUTHENTICATOR_KEY {
        return Err(Error::InvalidFieldFormat {
            message: format!("Field key '{AUTHENTICATOR_KEY}' is reserved"),
        });
    }
    Ok(())
}

/// Validate a field value.
///
/// Values may contain `=` (only the first `=` on a line separates key from
/// value) but never a line break.
///
/// # Errors
///
/// Returns `Error::InvalidFieldFormat` if the value contains `\n` or `\r`.
pub fn validate_value(value: &str) -> Result<()> {
    if contains_line_break(value) {
        return Err(Error::InvalidFieldFormat {
            message: format!("Field value '{}' contains a line break", value.escape_debug()),
        });
    }
    Ok(())
}

fn contains_line_break(s: &str) -> bool {
    s.contains(['\n', '\r'])
}
