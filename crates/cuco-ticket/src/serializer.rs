//! Wire format rendering and parsing.
//!
//! ```text
//! V=1\n
//! TT=N\n
//! SN=8A1054AAC0A0D77CEB6883EF0FC1C515\n
//! CT=1D9093DD\n
//! ...
//! MaxUC=64\n
//! Authenticator=HMAC-SHA256 <64 hex>
//! ```
//!
//! Every field line ends with `\n`, including the last one. The
//! authenticator line is computed over exactly those lines and appended
//! without a terminator.

use crate::{
    auth::{Authenticator, authenticator_line},
    field::FieldRecord,
    ticket::Ticket,
};
use cuco_core::{
    Error, Result, TicketType,
    constants::{
        AUTHENTICATOR_KEY, AUTHENTICATOR_SCHEME, FIELD_TICKET_TYPE, KEY_VALUE_SEPARATOR,
        LINE_TERMINATOR, SIGNATURE_HEX_LENGTH,
    },
};
use serde::Serialize;
use tracing::debug;

/// Render fields as `KEY=VALUE\n` lines in record order.
///
/// # Example
///
/// ```
/// use cuco_ticket::{FieldRecord, serializer::canonical_text};
///
/// let mut fields = FieldRecord::new();
/// fields.insert("V", "1").unwrap();
/// fields.insert("TT", "B").unwrap();
/// assert_eq!(canonical_text(&fields), "V=1\nTT=B\n");
/// ```
#[must_use]
pub fn canonical_text(fields: &FieldRecord) -> String {
    let mut text = String::new();
    for (key, value) in fields.iter() {
        text.push_str(key);
        text.push(KEY_VALUE_SEPARATOR);
        text.push_str(value);
        text.push(LINE_TERMINATOR);
    }
    text
}

/// Render and sign a ticket into its wire form.
///
/// # Errors
/// Propagates signing errors from [`Authenticator`].
pub fn serialize(ticket: &Ticket, authenticator: &Authenticator) -> Result<String> {
    let mut wire = canonical_text(ticket.fields());
    let signature = authenticator.signature_for_text(&wire)?;
    wire.push_str(&authenticator_line(&signature));

    debug!(
        ticket_type = %ticket.ticket_type(),
        fields = ticket.fields().len(),
        "ticket serialized"
    );
    Ok(wire)
}

/// A ticket read back from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedTicket {
    fields: FieldRecord,
    authenticator_hex: String,
}

impl SignedTicket {
    /// The signed fields in wire order.
    #[must_use]
    pub fn fields(&self) -> &FieldRecord {
        &self.fields
    }

    /// Signature hex as received.
    #[must_use]
    pub fn authenticator_hex(&self) -> &str {
        &self.authenticator_hex
    }

    /// The `TT` field as a ticket type.
    ///
    /// # Errors
    /// - `Error::MalformedTicket` if TT is missing or longer than one character
    /// - `Error::InvalidFieldFormat` if TT is not a known type character
    pub fn ticket_type(&self) -> Result<TicketType> {
        let code = self.fields.required(FIELD_TICKET_TYPE)?;
        let mut chars = code.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => TicketType::from_char(c),
            _ => Err(Error::MalformedTicket {
                message: format!("invalid ticket type '{code}'"),
            }),
        }
    }

    /// The text the signature covers.
    #[must_use]
    pub fn canonical_text(&self) -> String {
        canonical_text(&self.fields)
    }
}

/// Parse a serialized ticket.
///
/// Each field line is split on its first `=`. The final line must be the
/// authenticator and must not be followed by a terminator. The signature is
/// not checked here; see [`Authenticator::verify`].
///
/// # Errors
/// - `Error::MalformedTicket` for structural problems (missing or misplaced
///   authenticator, blank lines, lines without `=`)
/// - `Error::DuplicateField` or `Error::InvalidFieldFormat` for bad fields
///
/// # Example
///
/// ```
/// use cuco_ticket::serializer::parse_ticket;
///
/// let wire = format!("V=1\nTT=F\nAuthenticator=HMAC-SHA256 {}", "ab".repeat(32));
/// let signed = parse_ticket(&wire).unwrap();
/// assert_eq!(signed.fields().get("TT"), Some("F"));
/// assert_eq!(signed.authenticator_hex().len(), 64);
/// ```
pub fn parse_ticket(wire: &str) -> Result<SignedTicket> {
    let Some((body, last_line)) = wire.rsplit_once(LINE_TERMINATOR) else {
        return Err(malformed("ticket has no field lines"));
    };
    let authenticator_hex = parse_authenticator_line(last_line)?;

    let mut fields = FieldRecord::new();
    for line in body.split(LINE_TERMINATOR) {
        if line.is_empty() {
            return Err(malformed("blank line"));
        }
        let Some((key, value)) = line.split_once(KEY_VALUE_SEPARATOR) else {
            return Err(malformed(&format!(
                "line '{}' has no '{KEY_VALUE_SEPARATOR}'",
                line.escape_debug()
            )));
        };
        if key == AUTHENTICATOR_KEY {
            return Err(malformed("authenticator must be the last line"));
        }
        fields.insert(key, value)?;
    }

    Ok(SignedTicket {
        fields,
        authenticator_hex: authenticator_hex.to_string(),
    })
}

fn parse_authenticator_line(line: &str) -> Result<&str> {
    let signature = line
        .split_once(KEY_VALUE_SEPARATOR)
        .filter(|(key, _)| *key == AUTHENTICATOR_KEY)
        .and_then(|(_, value)| value.strip_prefix(AUTHENTICATOR_SCHEME))
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(|| malformed("last line is not an HMAC-SHA256 authenticator"))?;

    if signature.len() != SIGNATURE_HEX_LENGTH
        || !signature.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(malformed(&format!(
            "authenticator must be {SIGNATURE_HEX_LENGTH} hex characters"
        )));
    }
    Ok(signature)
}

fn malformed(message: &str) -> Error {
    Error::MalformedTicket {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const AK: &str = "D53470ED1DE204EAAB9ED03AA8BAEE86";

    fn record(pairs: &[(&str, &str)]) -> FieldRecord {
        let mut fields = FieldRecord::new();
        for (k, v) in pairs {
            fields.insert(*k, *v).unwrap();
        }
        fields
    }

    #[test]
    fn test_canonical_text_trailing_terminator() {
        let fields = record(&[("V", "1"), ("TT", "N"), ("MaxUC", "64")]);
        assert_eq!(canonical_text(&fields), "V=1\nTT=N\nMaxUC=64\n");
    }

    #[test]
    fn test_canonical_text_empty_record() {
        assert_eq!(canonical_text(&FieldRecord::new()), "");
    }

    #[test]
    fn test_serialize_layout() {
        let ticket = Ticket::Normal(record(&[
            ("V", "1"),
            ("TT", "N"),
            ("SN", "8A1054AAC0A0D77CEB6883EF0FC1C515"),
            ("CT", "1D9093DD"),
            ("LD", "1DB820DD"),
            ("TW", "02A300"),
            ("MaxUC", "64"),
        ]));
        let auth = Authenticator::from_hex_key(AK).unwrap();
        let wire = serialize(&ticket, &auth).unwrap();

        let lines: Vec<&str> = wire.split('\n').collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "V=1");
        assert_eq!(lines[1], "TT=N");
        assert_eq!(
            lines[7],
            "Authenticator=HMAC-SHA256 4edc93dd3d077f964be0bb9e255d3633a8aa6eccac61ecaa18f325eab2027c6a"
        );
        assert!(!wire.ends_with('\n'));
    }

    #[test]
    fn test_signature_excludes_own_line() {
        let fields = record(&[("V", "1"), ("TT", "F")]);
        let auth = Authenticator::from_hex_key(AK).unwrap();
        let wire = serialize(&Ticket::Free(fields.clone()), &auth).unwrap();
        let signature = auth.signature_for_text(&canonical_text(&fields)).unwrap();
        assert!(wire.ends_with(&signature));
    }

    #[test]
    fn test_parse_round_trip() {
        let fields = record(&[("V", "1"), ("TT", "B"), ("BT", "a=b")]);
        let auth = Authenticator::from_hex_key(AK).unwrap();
        let wire = serialize(&Ticket::Blocked(fields.clone()), &auth).unwrap();

        let signed = parse_ticket(&wire).unwrap();
        assert_eq!(signed.fields(), &fields);
        assert_eq!(signed.ticket_type().unwrap(), TicketType::Blocked);
        assert_eq!(signed.canonical_text(), canonical_text(&fields));
        assert!(auth.verify(&wire).unwrap());
    }

    #[test]
    fn test_verify_detects_tampering() {
        let fields = record(&[("V", "1"), ("TT", "N"), ("MaxUC", "64")]);
        let auth = Authenticator::from_hex_key(AK).unwrap();
        let wire = serialize(&Ticket::Normal(fields), &auth).unwrap();

        assert!(!auth.verify(&wire.replace("MaxUC=64", "MaxUC=99")).unwrap());
        let other = Authenticator::from_hex_key("4E8ADD61E02DCD2FDAD9457D9738E370").unwrap();
        assert!(!other.verify(&wire).unwrap());
    }

    #[test]
    fn test_verify_ignores_signature_case() {
        let fields = record(&[("V", "1"), ("TT", "F")]);
        let auth = Authenticator::from_hex_key(AK).unwrap();
        let wire = serialize(&Ticket::Free(fields), &auth).unwrap();
        let (body, signature) = wire.rsplit_once(' ').unwrap();
        let upper = format!("{body} {}", signature.to_ascii_uppercase());
        assert!(auth.verify(&upper).unwrap());
    }

    #[rstest]
    #[case("")]
    #[case("V=1")]
    #[case("V=1\nTT=F\n")]
    #[case("V=1\n\nAuthenticator=HMAC-SHA256 abab")]
    #[case("V=1\nTT=F\nAuthenticator=HMAC-MD5 0000")]
    #[case("V=1\nTT=F\nAuthenticator=HMAC-SHA256 xyz")]
    #[case("V=1\nnoseparator\nAuthenticator=HMAC-SHA256 0000000000000000000000000000000000000000000000000000000000000000")]
    #[case("Authenticator=HMAC-SHA256 0000000000000000000000000000000000000000000000000000000000000000\nAuthenticator=HMAC-SHA256 0000000000000000000000000000000000000000000000000000000000000000")]
    fn test_parse_rejects_malformed(#[case] wire: &str) {
        assert!(matches!(
            parse_ticket(wire),
            Err(Error::MalformedTicket { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_duplicate_fields() {
        let wire = format!("V=1\nV=2\nAuthenticator=HMAC-SHA256 {}", "0".repeat(64));
        assert!(matches!(
            parse_ticket(&wire),
            Err(Error::DuplicateField(key)) if key == "V"
        ));
    }

    #[rstest]
    #[case("X", true)]
    #[case("NN", true)]
    #[case("N", false)]
    fn test_ticket_type_from_wire(#[case] tt: &str, #[case] fails: bool) {
        let wire = format!("V=1\nTT={tt}\nAuthenticator=HMAC-SHA256 {}", "0".repeat(64));
        let signed = parse_ticket(&wire).unwrap();
        assert_eq!(signed.ticket_type().is_err(), fails);
    }
}
