//! Seams to the underlying connection.
//!
//! The gesture layer does not open sockets or frame generic protocol
//! messages. It drives whatever connection the application already has
//! through [`Transport`], and hands that connection an [`ExtensionCodec`] so
//! gesture event buffers can be interpreted on the delivery path.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use xgesture_protocol::{ByteOrder, GestureEvent, SerialState, EVENT_SIZE};

use crate::error::TransportResult;

/// Base codes the server's extension registry assigned on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionCodes {
    /// Major opcode of every request of the extension.
    pub major_opcode: u8,
    /// First event code of the extension.
    pub first_event: u8,
    /// First error code of the extension.
    pub first_error: u8,
}

/// Primitives the gesture layer needs from a connection.
///
/// Replies must be delivered in the order requests were sent; the gesture
/// layer sends one request and consumes exactly the next reply.
pub trait Transport: Send {
    /// Byte order negotiated at connection setup.
    fn byte_order(&self) -> ByteOrder;

    /// Looks up an extension in the server's registry.
    ///
    /// Returns `Ok(None)` if the server does not advertise it.
    fn query_extension(&mut self, name: &str) -> TransportResult<Option<ExtensionCodes>>;

    /// Installs the codec as handler for its event range.
    fn register_codec(&mut self, codec: Arc<dyn ExtensionCodec>) -> TransportResult<()>;

    /// Queues a complete request for sending.
    fn send_request(&mut self, request: &[u8]) -> TransportResult<()>;

    /// Flushes pending requests and blocks for the next reply.
    fn await_reply(&mut self) -> TransportResult<Vec<u8>>;

    /// Serial bookkeeping used to widen event sequence numbers.
    ///
    /// Widening only tracks the server if `last_read` keeps moving: after
    /// each decoded event the transport must store the widened
    /// `event.header().serial` as its new last request read.
    fn serial_state(&self) -> SerialState;
}

/// Conversion hooks the transport calls for buffers in an extension's range.
pub trait ExtensionCodec: Send + Sync {
    /// First event code and number of event codes handled.
    fn event_range(&self) -> (u8, u8);

    /// Converts a raw event buffer into a typed event.
    ///
    /// `None` means the buffer is not one of this extension's events and
    /// should be offered to other handlers.
    fn wire_to_event(&self, wire: &[u8], serial: SerialState) -> Option<GestureEvent>;

    /// Converts a typed event back into its wire record.
    fn event_to_wire(&self, event: &GestureEvent) -> [u8; EVENT_SIZE];

    /// Returns the name of an error code if it belongs to this extension.
    fn error_string(&self, code: u8) -> Option<String>;
}
