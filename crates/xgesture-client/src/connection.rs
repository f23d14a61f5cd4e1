//! Gesture operations on one connection.
//!
//! Every operation resolves the connection's capability record first, so a
//! server without the extension fails fast with
//! [`GestureError::NotSupported`] before anything is sent. Requests are then
//! validated locally, sent, and matched with exactly one reply while the
//! transport lock is held.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};
use xgesture_protocol::{
    ConnectionId, EventMask, GestureEvent, GrabReply, GrabStatus, Request, SelectedEventsReply,
    Timestamp, VersionReply, Window, EVENT_SIZE, NUMBER_EVENTS,
};

use crate::codec::GestureCodec;
use crate::config::GestureConfig;
use crate::error::{GestureError, GestureResult};
use crate::registry::{CapabilityInfo, CapabilityRegistry, ProtocolVersion};
use crate::transport::{ExtensionCodec, ExtensionCodes, Transport};

static NEXT_CONNECTION: AtomicU32 = AtomicU32::new(1);

/// Gesture extension client bound to one transport.
pub struct GestureConnection<T: Transport> {
    id: ConnectionId,
    config: GestureConfig,
    registry: CapabilityRegistry,
    transport: Mutex<T>,
}

impl<T: Transport> GestureConnection<T> {
    /// Wraps a transport with the default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, GestureConfig::default())
    }

    pub fn with_config(transport: T, config: GestureConfig) -> Self {
        let id = ConnectionId(NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed));
        debug!(
            connection = %id,
            extension = %config.extension_name,
            "Created gesture connection"
        );
        Self {
            id,
            config,
            registry: CapabilityRegistry::new(),
            transport: Mutex::new(transport),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Returns the capability record, negotiating it on first use.
    pub fn resolve(&self) -> GestureResult<CapabilityInfo> {
        self.registry
            .resolve_with(&self.config.extension_name, || self.create_capability())
    }

    /// Returns the record if it was already negotiated.
    pub fn capability(&self) -> Option<CapabilityInfo> {
        self.registry.cached()
    }

    /// Base codes the server assigned to the extension.
    pub fn query_extension(&self) -> GestureResult<ExtensionCodes> {
        self.resolve().map(|info| info.codes)
    }

    /// Codec bound to this connection's negotiated codes.
    pub fn codec(&self) -> GestureResult<GestureCodec> {
        let info = self.resolve()?;
        let order = self.lock_transport().byte_order();
        Ok(GestureCodec::new(self.id, info, order))
    }

    /// Forgets the negotiated record; the next operation negotiates again.
    ///
    /// Returns false if nothing was cached.
    pub fn close(&self) -> bool {
        debug!(connection = %self.id, "Closing gesture connection");
        self.registry.forget()
    }

    /// Runs `f` with exclusive access to the transport.
    pub fn with_transport<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.lock_transport())
    }

    pub fn into_transport(self) -> T {
        self.transport
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Asks the server for its protocol version.
    pub fn query_version(&self) -> GestureResult<ProtocolVersion> {
        let info = self.resolve()?;
        let mut transport = self.lock_transport();
        let version = Self::exchange_version(&mut *transport, info.codes.major_opcode)?;
        debug!(connection = %self.id, %version, "QueryVersion");
        Ok(version)
    }

    /// Replaces the gesture selection of `window`.
    ///
    /// The request has no reply; undefined mask bits are reported by the
    /// server asynchronously, not here.
    pub fn select_events(&self, window: Window, mask: EventMask) -> GestureResult<()> {
        const OP: &str = "SelectEvents";
        let info = self.resolve()?;
        debug!(connection = %self.id, window, %mask, "{OP}");

        let mut transport = self.lock_transport();
        let request = Request::select_events(window, mask)
            .encode(transport.byte_order(), info.codes.major_opcode);
        transport
            .send_request(&request)
            .map_err(|e| GestureError::invalid_reply(OP, e))
    }

    /// Reads back the gesture selection of `window`.
    pub fn get_selected_events(&self, window: Window) -> GestureResult<EventMask> {
        const OP: &str = "GetSelectedEvents";
        let info = self.resolve()?;

        let mut transport = self.lock_transport();
        let order = transport.byte_order();
        let request = Request::get_selected_events(window);
        let reply = Self::exchange(&mut *transport, OP, &request, info.codes.major_opcode)?;
        let reply = SelectedEventsReply::parse(&reply, order)
            .map_err(|e| GestureError::invalid_reply(OP, e))?;

        debug!(connection = %self.id, window, mask = %reply.mask, "{OP}");
        Ok(reply.mask)
    }

    /// Grabs a gesture on `window` for this client.
    ///
    /// The server's answer comes back as-is; [`GrabStatus::GRABBED_ALREADY`]
    /// is a normal outcome, not an error.
    pub fn grab_event(
        &self,
        window: Window,
        event_type: u32,
        num_finger: u8,
        time: Timestamp,
    ) -> GestureResult<GrabStatus> {
        const OP: &str = "GrabEvent";
        let info = self.resolve()?;
        let Some(kind) = Self::checked_kind(event_type) else {
            debug!(connection = %self.id, event_type, "{OP}: event type out of range");
            return Err(GestureError::GrabAbnormal { event_type });
        };

        let request = Request::grab_event(window, kind, num_finger, time);
        let status = self.grab_exchange(OP, &request, &info)?;
        debug!(connection = %self.id, window, event_type, num_finger, %status, "{OP}");
        Ok(status)
    }

    /// Releases a gesture grab on `window`.
    pub fn ungrab_event(
        &self,
        window: Window,
        event_type: u32,
        num_finger: u8,
        time: Timestamp,
    ) -> GestureResult<GrabStatus> {
        const OP: &str = "UngrabEvent";
        let info = self.resolve()?;
        if window == 0 {
            debug!(connection = %self.id, "{OP}: window is 0");
            return Err(GestureError::ungrab_abnormal("window is 0"));
        }
        let Some(kind) = Self::checked_kind(event_type) else {
            debug!(connection = %self.id, event_type, "{OP}: event type out of range");
            return Err(GestureError::ungrab_abnormal(format!(
                "event type {event_type} is out of range"
            )));
        };

        let request = Request::ungrab_event(window, kind, num_finger, time);
        let status = self.grab_exchange(OP, &request, &info)?;
        debug!(connection = %self.id, window, event_type, num_finger, %status, "{OP}");
        Ok(status)
    }

    /// Decodes a raw event record read from this connection.
    ///
    /// `Ok(None)` means the record is not a gesture event; malformed records
    /// are logged and reported the same way.
    pub fn decode_event(&self, wire: &[u8]) -> GestureResult<Option<GestureEvent>> {
        let codec = self.codec()?;
        let serial = self.lock_transport().serial_state();
        Ok(codec.wire_to_event(wire, serial))
    }

    /// Encodes an event for sending with this connection's codes.
    pub fn encode_event(&self, event: &GestureEvent) -> GestureResult<[u8; EVENT_SIZE]> {
        Ok(self.codec()?.encode(event))
    }

    fn create_capability(&self) -> GestureResult<Option<CapabilityInfo>> {
        let name = self.config.extension_name.as_str();
        let mut transport = self.lock_transport();

        let codes = match transport.query_extension(name) {
            Ok(Some(codes)) => codes,
            Ok(None) => {
                debug!(connection = %self.id, extension = name, "Extension not advertised");
                return Ok(None);
            }
            Err(e) => return Err(GestureError::invalid_reply("QueryExtension", e)),
        };

        let mut info = CapabilityInfo::new(codes);
        if self.config.negotiate_version {
            match Self::exchange_version(&mut *transport, codes.major_opcode) {
                Ok(version) => info = info.with_version(version),
                Err(e) => {
                    warn!(connection = %self.id, error = %e, "Version negotiation failed")
                }
            }
        }

        let codec = GestureCodec::new(self.id, info, transport.byte_order());
        transport
            .register_codec(Arc::new(codec))
            .map_err(|e| GestureError::invalid_reply("QueryExtension", e))?;

        Ok(Some(info))
    }

    fn grab_exchange(
        &self,
        operation: &'static str,
        request: &Request,
        info: &CapabilityInfo,
    ) -> GestureResult<GrabStatus> {
        let mut transport = self.lock_transport();
        let order = transport.byte_order();
        let reply = Self::exchange(&mut *transport, operation, request, info.codes.major_opcode)?;
        GrabReply::parse(&reply, order)
            .map(|reply| reply.status)
            .map_err(|e| GestureError::invalid_reply(operation, e))
    }

    fn exchange_version(transport: &mut T, major_opcode: u8) -> GestureResult<ProtocolVersion> {
        const OP: &str = "QueryVersion";
        let reply = Self::exchange(transport, OP, &Request::QueryVersion, major_opcode)?;
        let reply = VersionReply::parse(&reply, transport.byte_order())
            .map_err(|e| GestureError::invalid_reply(OP, e))?;
        Ok(ProtocolVersion::new(reply.major, reply.minor, reply.patch))
    }

    /// Sends one request and takes the next reply.
    fn exchange(
        transport: &mut T,
        operation: &'static str,
        request: &Request,
        major_opcode: u8,
    ) -> GestureResult<Vec<u8>> {
        let bytes = request.encode(transport.byte_order(), major_opcode);
        transport
            .send_request(&bytes)
            .map_err(|e| GestureError::invalid_reply(operation, e))?;
        transport
            .await_reply()
            .map_err(|e| GestureError::invalid_reply(operation, e))
    }

    fn checked_kind(event_type: u32) -> Option<u8> {
        u8::try_from(event_type)
            .ok()
            .filter(|kind| *kind < NUMBER_EVENTS)
    }

    fn lock_transport(&self) -> MutexGuard<'_, T> {
        self.transport.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
