//! Ticket type selection and issuance.

use crate::{
    auth::Authenticator,
    resolve::{Defaults, DeviceAttributes},
    serializer::serialize,
    ticket::{Ticket, TicketSource},
};
use cuco_core::{CucoTimestamp, DeviceKeys, DeviceState, RequestIntent, Result, TicketType};
use tracing::debug;

/// Pick the ticket type for a device state code.
///
/// An explicit check request always yields a start ticket, whatever the
/// state code is, including codes that are otherwise unknown.
///
/// # Errors
/// Returns `Error::UnknownDeviceState` for a code outside `"0"`, `"1"`,
/// `"2"` on a regular request.
///
/// # Examples
///
/// ```
/// use cuco_core::{RequestIntent, TicketType};
/// use cuco_ticket::select_ticket_type;
///
/// assert_eq!(select_ticket_type("2", RequestIntent::normal()).unwrap(), TicketType::Blocked);
/// assert_eq!(select_ticket_type("2", RequestIntent::check()).unwrap(), TicketType::Start);
/// assert!(select_ticket_type("7", RequestIntent::normal()).is_err());
/// ```
pub fn select_ticket_type(state: &str, intent: RequestIntent) -> Result<TicketType> {
    if intent.explicit_check {
        return Ok(TicketType::Start);
    }
    Ok(DeviceState::from_code(state)?.into())
}

/// Build the ticket for a device, stamped with the current time.
///
/// Pure apart from reading the clock.
///
/// # Errors
/// - `Error::UnknownDeviceState` from [`select_ticket_type`]
/// - `Error::InvalidAddress` if the device address is too short for a serial
/// - ticket construction errors from [`Ticket`]
pub fn create_ticket(
    state: &str,
    keys: &DeviceKeys,
    attributes: &DeviceAttributes,
    defaults: &Defaults,
    intent: RequestIntent,
) -> Result<Ticket> {
    create_ticket_at(
        state,
        keys,
        attributes,
        defaults,
        intent,
        CucoTimestamp::now(),
    )
}

/// [`create_ticket`] with an explicit issue instant.
///
/// # Errors
/// Same as [`create_ticket`].
pub fn create_ticket_at(
    state: &str,
    keys: &DeviceKeys,
    attributes: &DeviceAttributes,
    defaults: &Defaults,
    intent: RequestIntent,
    issued_at: CucoTimestamp,
) -> Result<Ticket> {
    let ticket_type = select_ticket_type(state, intent)?;
    let serial = keys.serial_number()?;
    debug!(
        state,
        explicit_check = intent.explicit_check,
        %ticket_type,
        "ticket type selected"
    );

    Ticket::build(
        ticket_type,
        &TicketSource {
            serial: &serial,
            keys,
            attributes,
            defaults,
            issued_at,
        },
    )
}

/// Issues signed tickets against one immutable defaults table.
///
/// The defaults are loaded once and only read afterwards, so a factory can
/// be shared across threads by reference.
///
/// # Example
///
/// ```
/// use cuco_core::{DeviceKeys, RequestIntent};
/// use cuco_ticket::{Defaults, DeviceAttributes, TicketFactory};
///
/// let defaults: Defaults = [("IT", "Welcome")].into_iter().collect();
/// let factory = TicketFactory::new(defaults);
///
/// let keys = DeviceKeys::new(
///     "0x73a99b188a1054aac0a0d77ceb6883ef0fc1c515",
///     "D53470ED1DE204EAAB9ED03AA8BAEE86",
///     "2A6BCC61D12DCD2FDAD9457D9738E421",
/// );
/// let wire = factory
///     .issue("0", &keys, &DeviceAttributes::new(), RequestIntent::normal())
///     .unwrap();
///
/// assert!(wire.starts_with("V=1\nTT=F\nSN=8A1054AAC0A0D77CEB6883EF0FC1C515\n"));
/// assert!(wire.contains("\nIT=Welcome\n"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TicketFactory {
    defaults: Defaults,
}

impl TicketFactory {
    /// Factory that falls back to `defaults` for missing attributes.
    #[must_use]
    pub fn new(defaults: Defaults) -> Self {
        TicketFactory { defaults }
    }

    /// Process-wide fallback values.
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Build an unsigned ticket. See [`create_ticket`].
    ///
    /// # Errors
    /// Same as [`create_ticket`].
    pub fn create_ticket(
        &self,
        state: &str,
        keys: &DeviceKeys,
        attributes: &DeviceAttributes,
        intent: RequestIntent,
    ) -> Result<Ticket> {
        create_ticket(state, keys, attributes, &self.defaults, intent)
    }

    /// Build, sign and serialize a ticket stamped with the current time.
    ///
    /// Either the whole wire string is produced or an error is returned.
    ///
    /// # Errors
    /// Ticket construction errors plus key errors from [`Authenticator`].
    pub fn issue(
        &self,
        state: &str,
        keys: &DeviceKeys,
        attributes: &DeviceAttributes,
        intent: RequestIntent,
    ) -> Result<String> {
        self.issue_at(state, keys, attributes, intent, CucoTimestamp::now())
    }

    /// [`TicketFactory::issue`] with an explicit issue instant.
    ///
    /// # Errors
    /// Same as [`TicketFactory::issue`].
    pub fn issue_at(
        &self,
        state: &str,
        keys: &DeviceKeys,
        attributes: &DeviceAttributes,
        intent: RequestIntent,
        issued_at: CucoTimestamp,
    ) -> Result<String> {
        let ticket = create_ticket_at(state, keys, attributes, &self.defaults, intent, issued_at)?;
        let authenticator = Authenticator::for_device(keys)?;
        serialize(&ticket, &authenticator)
    }
}
