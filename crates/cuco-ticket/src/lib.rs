pub mod auth;
pub mod factory;
pub mod field;
pub mod resolve;
pub mod serializer;
pub mod ticket;
pub mod unlock;
pub mod validation;

pub use auth::Authenticator;
pub use factory::{TicketFactory, create_ticket, create_ticket_at, select_ticket_type};
pub use field::FieldRecord;
pub use resolve::{Defaults, DeviceAttributes, FieldResolver};
pub use serializer::{SignedTicket, canonical_text, parse_ticket, serialize};
pub use ticket::{Ticket, TicketSource};
pub use unlock::{UnlockChallenge, derive_unlock_code};
pub use validation::{validate_key, validate_value};
