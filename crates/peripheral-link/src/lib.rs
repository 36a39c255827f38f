//! Peripheral Link
//!
//! Async line-delimited JSON link to the alert peripheral. Runs over a
//! serial port or any duplex stream.

mod client;
mod error;
mod protocol;

pub use client::{Endpoint, LinkStream, PeripheralClient};
pub use error::LinkError;
pub use protocol::{decode_line, encode, ConnectionState, WireMessage};
