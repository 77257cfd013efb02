//! relayhook wire protocol: talking to the relay.
//!
//! The relay is an opaque duplex channel carrying one JSON envelope per line.
//!
//! ## Architecture
//!
//! - **PayloadCodec**: decides whether outgoing text is structured data or opaque text
//! - **FrameReader / FrameWriter**: newline-delimited envelope framing
//! - **ConnectionHandle**: the single relay connection owned by the client loop

pub mod codec;
pub mod connection;
pub mod frame;

pub use codec::PayloadCodec;
pub use connection::{connect, ConnectionHandle, ConnectionState};
pub use frame::{decode_frame, encode_frame, FrameReader, FrameWriter, WireError};
