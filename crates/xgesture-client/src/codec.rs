//! Event and error conversion bound to one connection's negotiated codes.

use tracing::{trace, warn};
use xgesture_protocol::{
    ByteOrder, ConnectionId, ErrorCode, EventContext, GestureEvent, ProtocolResult, SerialState,
    EVENT_SIZE, NUMBER_EVENTS,
};

use crate::registry::CapabilityInfo;
use crate::transport::ExtensionCodec;

/// Converts gesture records for one connection.
///
/// Immutable once built, so the transport may call it from its event
/// delivery path without taking any lock of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureCodec {
    connection: ConnectionId,
    info: CapabilityInfo,
    order: ByteOrder,
}

impl GestureCodec {
    pub fn new(connection: ConnectionId, info: CapabilityInfo, order: ByteOrder) -> Self {
        Self {
            connection,
            info,
            order,
        }
    }

    pub fn info(&self) -> &CapabilityInfo {
        &self.info
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Decodes a record; `Ok(None)` if the type code is not a gesture event.
    pub fn decode(&self, wire: &[u8], serial: SerialState) -> ProtocolResult<Option<GestureEvent>> {
        let ctx = EventContext::new(self.order, self.info.codes.first_event)
            .with_serial(serial)
            .with_connection(self.connection);
        let event = GestureEvent::from_wire(wire, &ctx)?;
        if let Some(event) = &event {
            trace!(connection = %self.connection, ?event, "decoded gesture event");
        }
        Ok(event)
    }

    /// Encodes an event with this connection's first event code.
    pub fn encode(&self, event: &GestureEvent) -> [u8; EVENT_SIZE] {
        trace!(connection = %self.connection, ?event, "encoding gesture event");
        event.to_wire(self.order, self.info.codes.first_event)
    }

    /// Returns the error this absolute code stands for, if it is ours and
    /// the server reported a version.
    pub fn error_code(&self, code: u8) -> Option<ErrorCode> {
        let offset = code.checked_sub(self.info.codes.first_error)?;
        if offset >= self.info.num_errors {
            return None;
        }
        ErrorCode::from_offset(offset)
    }
}

impl ExtensionCodec for GestureCodec {
    fn event_range(&self) -> (u8, u8) {
        (self.info.codes.first_event, NUMBER_EVENTS)
    }

    fn wire_to_event(&self, wire: &[u8], serial: SerialState) -> Option<GestureEvent> {
        match self.decode(wire, serial) {
            Ok(event) => event,
            Err(e) => {
                warn!(connection = %self.connection, error = %e, "Malformed gesture event");
                None
            }
        }
    }

    fn event_to_wire(&self, event: &GestureEvent) -> [u8; EVENT_SIZE] {
        self.encode(event)
    }

    fn error_string(&self, code: u8) -> Option<String> {
        self.error_code(code).map(|e| e.name().to_string())
    }
}
