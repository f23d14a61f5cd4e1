//! Client side of the gesture protocol extension.
//!
//! [`GestureConnection`] wraps an application's existing connection (any
//! [`Transport`]) and provides the extension's operations on top of it:
//! version query, event selection, and gesture grabs. Capability discovery
//! happens lazily on first use and is cached per connection. Raw event
//! records are turned into [`GestureEvent`](xgesture_protocol::GestureEvent)
//! values by the [`GestureCodec`] registered with the transport.
//!
//! The crate also builds the `xgesture` inspection tool.

pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod registry;
pub mod tracing;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use codec::GestureCodec;
pub use config::{ClientConfig, GestureConfig};
pub use connection::GestureConnection;
pub use error::{GestureError, GestureResult, ReplyError, TransportError, TransportResult};
pub use registry::{CapabilityInfo, CapabilityRegistry, ProtocolVersion};
pub use transport::{ExtensionCodec, ExtensionCodes, Transport};
