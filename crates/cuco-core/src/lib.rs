//! Leaf types and codecs shared by the CUCo ticket crates.

pub mod bytes;
pub mod constants;
pub mod error;
pub mod timestamp;
pub mod types;

pub use error::{Error, Result};
pub use timestamp::CucoTimestamp;
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
