//! Ticket model and per-type field layouts.
//!
//! Every ticket starts with the same four fields and then appends its
//! type-specific fields in a fixed order. The order is part of the signed
//! payload.
//!
//! | Type | TT | Fields after `V, TT, SN, CT` |
//! |---|---|---|
//! | Free | `F` | `IT` |
//! | Normal | `N` | `BT, BW, LD, TW, MaxUC` |
//! | Blocked | `B` | `BT` |
//! | Start | `S` | `IT, BT, BW, LD, TW, MaxUC, AKT, AK, UK` |
//!
//! `LD` is the issue instant plus the resolved `ticketlifetime`. `AKT`, `AK`
//! and `UK` come from the device keys; every other optional field goes
//! through [`FieldResolver`] and is omitted when it resolves to nothing.

use crate::{
    field::FieldRecord,
    resolve::{Defaults, DeviceAttributes, FieldResolver},
};
use cuco_core::{
    CucoTimestamp, DeviceKeys, Error, Result, SerialNumber, TicketType,
    constants::{
        ATTR_TICKET_LIFETIME, FIELD_AUTH_KEY, FIELD_BLOCKED_TEXT, FIELD_BLOCKED_WARNING,
        FIELD_CREATED, FIELD_DEADLINE, FIELD_INFO_TEXT, FIELD_KEY_TYPE, FIELD_MAX_UNLOCK_CODES,
        FIELD_SERIAL, FIELD_TICKET_TYPE, FIELD_TIME_WINDOW, FIELD_UNLOCK_KEY, FIELD_VERSION,
        KEY_TYPE_START, PROTOCOL_VERSION,
    },
};
use serde::Serialize;
use tracing::trace;

/// Everything a ticket is built from.
#[derive(Debug, Clone, Copy)]
pub struct TicketSource<'a> {
    /// Serial number emitted as `SN`.
    pub serial: &'a SerialNumber,
    /// Key material; only start tickets embed it.
    pub keys: &'a DeviceKeys,
    /// Per-device attribute overrides.
    pub attributes: &'a DeviceAttributes,
    /// Process-wide fallbacks.
    pub defaults: &'a Defaults,
    /// Issue instant; CT is this value and LD is derived from it.
    pub issued_at: CucoTimestamp,
}

impl TicketSource<'_> {
    fn resolver(&self) -> FieldResolver<'_> {
        FieldResolver::new(self.attributes, self.defaults)
    }
}

/// A fully populated, unsigned ticket.
///
/// # Example
///
/// ```
/// use cuco_core::{CucoTimestamp, DeviceKeys, TicketType};
/// use cuco_ticket::{Defaults, DeviceAttributes, Ticket, TicketSource};
///
/// let keys = DeviceKeys::new(
///     "0x73a99b188a1054aac0a0d77ceb6883ef0fc1c515",
///     "4E8ADD61E02DCD2FDAD9457D9738E370",
///     "2A6BCC61D12DCD2FDAD9457D9738E421",
/// );
/// let serial = keys.serial_number().unwrap();
/// let attributes = DeviceAttributes::from_json_str(r#"{"BT": "Locked"}"#).unwrap();
/// let defaults = Defaults::new();
///
/// let ticket = Ticket::blocked(&TicketSource {
///     serial: &serial,
///     keys: &keys,
///     attributes: &attributes,
///     defaults: &defaults,
///     issued_at: CucoTimestamp::from_epoch_seconds(0x1D9093DD),
/// })
/// .unwrap();
///
/// assert_eq!(ticket.ticket_type(), TicketType::Blocked);
/// assert_eq!(
///     ticket.fields().keys().collect::<Vec<_>>(),
///     vec!["V", "TT", "SN", "CT", "BT"]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "fields")]
pub enum Ticket {
    Free(FieldRecord),
    Normal(FieldRecord),
    Blocked(FieldRecord),
    Start(FieldRecord),
}

impl Ticket {
    /// Build a free ticket (`TT=F`).
    ///
    /// # Errors
    /// Returns `Error::InvalidFieldFormat` if a resolved value contains a
    /// line break.
    pub fn free(source: &TicketSource<'_>) -> Result<Self> {
        let resolver = source.resolver();
        let mut fields = base_record(TicketType::Free, source)?;
        fields.insert_resolved(FIELD_INFO_TEXT, resolver.resolve(FIELD_INFO_TEXT))?;
        Ok(Ticket::Free(fields))
    }

    /// Build a normal ticket (`TT=N`).
    ///
    /// # Errors
    /// - `Error::InvalidLifetime` if `ticketlifetime` is not a non-negative integer
    /// - `Error::InvalidFieldFormat` if a resolved value contains a line break
    pub fn normal(source: &TicketSource<'_>) -> Result<Self> {
        let mut fields = base_record(TicketType::Normal, source)?;
        append_lease_fields(&mut fields, source)?;
        Ok(Ticket::Normal(fields))
    }

    /// Build a blocked ticket (`TT=B`).
    ///
    /// # Errors
    /// Returns `Error::InvalidFieldFormat` if a resolved value contains a
    /// line break.
    pub fn blocked(source: &TicketSource<'_>) -> Result<Self> {
        let resolver = source.resolver();
        let mut fields = base_record(TicketType::Blocked, source)?;
        fields.insert_resolved(FIELD_BLOCKED_TEXT, resolver.resolve(FIELD_BLOCKED_TEXT))?;
        Ok(Ticket::Blocked(fields))
    }

    /// Build a start ticket (`TT=S`), which also carries the device keys.
    ///
    /// # Errors
    /// Same as [`Ticket::normal`], plus `Error::InvalidHex` if the device's
    /// AK or UK is empty.
    pub fn start(source: &TicketSource<'_>) -> Result<Self> {
        let resolver = source.resolver();
        let mut fields = base_record(TicketType::Start, source)?;
        fields.insert_resolved(FIELD_INFO_TEXT, resolver.resolve(FIELD_INFO_TEXT))?;
        append_lease_fields(&mut fields, source)?;
        fields.insert(FIELD_KEY_TYPE, KEY_TYPE_START)?;
        fields.insert(FIELD_AUTH_KEY, device_key(FIELD_AUTH_KEY, source.keys.ak())?)?;
        fields.insert(FIELD_UNLOCK_KEY, device_key(FIELD_UNLOCK_KEY, source.keys.uk())?)?;
        Ok(Ticket::Start(fields))
    }

    /// Build the ticket of the given type.
    ///
    /// # Errors
    /// Same as the per-type constructors.
    pub fn build(ticket_type: TicketType, source: &TicketSource<'_>) -> Result<Self> {
        let ticket = match ticket_type {
            TicketType::Free => Ticket::free(source)?,
            TicketType::Normal => Ticket::normal(source)?,
            TicketType::Blocked => Ticket::blocked(source)?,
            TicketType::Start => Ticket::start(source)?,
        };
        trace!(
            ticket_type = %ticket.ticket_type(),
            field_count = ticket.fields().len(),
            "ticket built"
        );
        Ok(ticket)
    }

    /// The ticket type.
    #[must_use]
    pub fn ticket_type(&self) -> TicketType {
        match self {
            Ticket::Free(_) => TicketType::Free,
            Ticket::Normal(_) => TicketType::Normal,
            Ticket::Blocked(_) => TicketType::Blocked,
            Ticket::Start(_) => TicketType::Start,
        }
    }

    /// The ordered fields.
    #[must_use]
    pub fn fields(&self) -> &FieldRecord {
        match self {
            Ticket::Free(fields)
            | Ticket::Normal(fields)
            | Ticket::Blocked(fields)
            | Ticket::Start(fields) => fields,
        }
    }

    /// Consume the ticket, keeping its fields.
    #[must_use]
    pub fn into_fields(self) -> FieldRecord {
        match self {
            Ticket::Free(fields)
            | Ticket::Normal(fields)
            | Ticket::Blocked(fields)
            | Ticket::Start(fields) => fields,
        }
    }

    /// Value of a field, if present.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields().get(key)
    }

    /// The decoded `CT` field.
    ///
    /// # Errors
    /// Returns `Error::InvalidTimestamp` if CT is not valid hex.
    pub fn created_at(&self) -> Result<CucoTimestamp> {
        CucoTimestamp::parse(self.fields().required(FIELD_CREATED)?)
    }

    /// The decoded `LD` field, if the ticket carries one.
    ///
    /// # Errors
    /// Returns `Error::InvalidTimestamp` if LD is not valid hex.
    pub fn deadline(&self) -> Result<Option<CucoTimestamp>> {
        self.field(FIELD_DEADLINE)
            .map(CucoTimestamp::parse)
            .transpose()
    }
}

fn base_record(ticket_type: TicketType, source: &TicketSource<'_>) -> Result<FieldRecord> {
    let mut fields = FieldRecord::new();
    fields.insert(FIELD_VERSION, PROTOCOL_VERSION)?;
    fields.insert(FIELD_TICKET_TYPE, ticket_type.code())?;
    fields.insert(FIELD_SERIAL, source.serial.as_str())?;
    fields.insert(FIELD_CREATED, source.issued_at.encode())?;
    Ok(fields)
}

/// `BT, BW, LD, TW, MaxUC`, shared by normal and start tickets.
fn append_lease_fields(fields: &mut FieldRecord, source: &TicketSource<'_>) -> Result<()> {
    let resolver = source.resolver();
    fields.insert_resolved(FIELD_BLOCKED_TEXT, resolver.resolve(FIELD_BLOCKED_TEXT))?;
    fields.insert_resolved(FIELD_BLOCKED_WARNING, resolver.resolve(FIELD_BLOCKED_WARNING))?;

    if let Some(lifetime) = resolver.resolve(ATTR_TICKET_LIFETIME) {
        let deadline = source.issued_at.deadline(parse_lifetime(lifetime)?)?;
        fields.insert(FIELD_DEADLINE, deadline.encode())?;
    }

    fields.insert_resolved(FIELD_TIME_WINDOW, resolver.resolve(FIELD_TIME_WINDOW))?;
    fields.insert_resolved(
        FIELD_MAX_UNLOCK_CODES,
        resolver.resolve(FIELD_MAX_UNLOCK_CODES),
    )?;
    Ok(())
}

/// Key material is never resolved; a missing key is a store defect.
fn device_key<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(Error::InvalidHex {
            message: format!("device {name} must not be empty"),
        });
    }
    Ok(value)
}

/// Whole seconds; integral JSON floats such as `86400.0` are accepted.
fn parse_lifetime(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    let seconds = trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15)
            .map(|f| f as i64)
    });

    match seconds {
        Some(seconds) if seconds >= 0 => Ok(seconds),
        _ => Err(Error::InvalidLifetime(format!(
            "'{raw}' is not a non-negative number of seconds"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ADDRESS: &str = "0x73a99b188a1054aac0a0d77ceb6883ef0fc1c515";
    const AK: &str = "4E8ADD61E02DCD2FDAD9457D9738E370";
    const UK: &str = "2A6BCC61D12DCD2FDAD9457D9738E421";
    const ISSUED: i64 = 0x1D9093DD;

    fn attributes() -> DeviceAttributes {
        DeviceAttributes::from_json_str(
            r#"{"IT": "TestITValue", "BT": "TestBTValue", "BW": "TestBWValue",
                "ticketlifetime": 3600, "TW": "TestTWValue", "MaxUC": "10"}"#,
        )
        .unwrap()
    }

    fn build(ticket_type: TicketType, attributes: &DeviceAttributes, defaults: &Defaults) -> Ticket {
        let keys = DeviceKeys::new(ADDRESS, AK, UK);
        let serial = keys.serial_number().unwrap();
        Ticket::build(
            ticket_type,
            &TicketSource {
                serial: &serial,
                keys: &keys,
                attributes,
                defaults,
                issued_at: CucoTimestamp::from_epoch_seconds(ISSUED),
            },
        )
        .unwrap()
    }

    fn keys_of(ticket: &Ticket) -> Vec<&str> {
        ticket.fields().keys().collect()
    }

    #[rstest]
    #[case(TicketType::Free, vec!["V", "TT", "SN", "CT", "IT"])]
    #[case(TicketType::Normal, vec!["V", "TT", "SN", "CT", "BT", "BW", "LD", "TW", "MaxUC"])]
    #[case(TicketType::Blocked, vec!["V", "TT", "SN", "CT", "BT"])]
    #[case(
        TicketType::Start,
        vec!["V", "TT", "SN", "CT", "IT", "BT", "BW", "LD", "TW", "MaxUC", "AKT", "AK", "UK"]
    )]
    fn test_field_order(#[case] ticket_type: TicketType, #[case] expected: Vec<&str>) {
        let ticket = build(ticket_type, &attributes(), &Defaults::new());
        assert_eq!(ticket.ticket_type(), ticket_type);
        assert_eq!(keys_of(&ticket), expected);
        assert_eq!(ticket.field("TT"), Some(ticket_type.code()));
    }

    #[test]
    fn test_base_fields() {
        let ticket = build(TicketType::Free, &attributes(), &Defaults::new());
        assert_eq!(ticket.field("V"), Some("1"));
        assert_eq!(ticket.field("SN"), Some("8A1054AAC0A0D77CEB6883EF0FC1C515"));
        assert_eq!(ticket.field("CT"), Some("1D9093DD"));
        assert_eq!(ticket.created_at().unwrap().epoch_seconds(), ISSUED);
    }

    #[test]
    fn test_deadline_from_lifetime() {
        let ticket = build(TicketType::Normal, &attributes(), &Defaults::new());
        let deadline = ticket.deadline().unwrap().unwrap();
        assert_eq!(deadline.epoch_seconds() - ISSUED, 3600);
        assert_eq!(ticket.field("LD"), Some("1D90A1ED"));
    }

    #[test]
    fn test_start_carries_keys() {
        let ticket = build(TicketType::Start, &attributes(), &Defaults::new());
        assert_eq!(ticket.field("AKT"), Some("S"));
        assert_eq!(ticket.field("AK"), Some(AK));
        assert_eq!(ticket.field("UK"), Some(UK));
    }

    #[test]
    fn test_missing_attributes_are_omitted() {
        let ticket = build(TicketType::Start, &DeviceAttributes::new(), &Defaults::new());
        assert_eq!(
            keys_of(&ticket),
            vec!["V", "TT", "SN", "CT", "AKT", "AK", "UK"]
        );
        assert_eq!(ticket.deadline().unwrap(), None);
    }

    #[test]
    fn test_defaults_fill_gaps() {
        let defaults: Defaults = [("IT", "DefaultITValue"), ("ticketlifetime", "7200")]
            .into_iter()
            .collect();
        let ticket = build(TicketType::Free, &DeviceAttributes::new(), &defaults);
        assert_eq!(ticket.field("IT"), Some("DefaultITValue"));

        let ticket = build(TicketType::Normal, &DeviceAttributes::new(), &defaults);
        assert_eq!(ticket.deadline().unwrap().unwrap().epoch_seconds() - ISSUED, 7200);
    }

    #[rstest]
    #[case("soon")]
    #[case("-5")]
    #[case("1.5")]
    #[case("-60.0")]
    #[case("NaN")]
    #[case("inf")]
    fn test_invalid_lifetime(#[case] lifetime: &str) {
        let keys = DeviceKeys::new(ADDRESS, AK, UK);
        let serial = keys.serial_number().unwrap();
        let mut attributes = DeviceAttributes::new();
        attributes.insert("ticketlifetime", lifetime);
        let defaults = Defaults::new();

        let result = Ticket::normal(&TicketSource {
            serial: &serial,
            keys: &keys,
            attributes: &attributes,
            defaults: &defaults,
            issued_at: CucoTimestamp::from_epoch_seconds(ISSUED),
        });
        assert!(matches!(result, Err(Error::InvalidLifetime(_))));
    }

    #[rstest]
    #[case("86400", 86_400)]
    #[case("86400.0", 86_400)]
    #[case(" 3600 ", 3_600)]
    #[case("0", 0)]
    fn test_lifetime_forms(#[case] lifetime: &str, #[case] expected: i64) {
        assert_eq!(parse_lifetime(lifetime).unwrap(), expected);
    }

    #[test]
    fn test_float_lifetime_from_json() {
        let attributes =
            DeviceAttributes::from_json_str(r#"{"ticketlifetime": 86400.0}"#).unwrap();
        let ticket = build(TicketType::Normal, &attributes, &Defaults::new());
        assert_eq!(ticket.field("LD"), Some("1D91E55D"));
    }

    #[rstest]
    #[case("", UK)]
    #[case(AK, "")]
    fn test_start_requires_keys(#[case] ak: &str, #[case] uk: &str) {
        let keys = DeviceKeys::new(ADDRESS, ak, uk);
        let serial = keys.serial_number().unwrap();
        let attributes = attributes();
        let defaults = Defaults::new();

        let result = Ticket::start(&TicketSource {
            serial: &serial,
            keys: &keys,
            attributes: &attributes,
            defaults: &defaults,
            issued_at: CucoTimestamp::from_epoch_seconds(ISSUED),
        });
        assert!(matches!(result, Err(Error::InvalidHex { .. })));
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let ticket = build(TicketType::Blocked, &attributes(), &Defaults::new());
        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["type"], "Blocked");
        assert_eq!(json["fields"][1], serde_json::json!(["TT", "B"]));
    }
}
