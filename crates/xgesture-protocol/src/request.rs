//! Request records sent from client to server.
//!
//! Every request starts with the generic 4-byte header:
//!
//! ```text
//! +--------------+--------------+----------------------+
//! | major opcode | minor opcode | length (4-byte units)|
//! | u8           | u8           | u16                  |
//! +--------------+--------------+----------------------+
//! ```
//!
//! The major opcode is assigned per connection by the server's extension
//! registry; the minor opcode selects the operation.

use crate::error::{ProtocolError, ProtocolResult};
use crate::event::{EventMask, Timestamp, Window};
use crate::wire::{ByteOrder, WireReader, WireWriter};
use crate::REQUEST_HEADER_SIZE;

/// Operations of the extension, as carried in the minor opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MinorOpcode {
    QueryVersion = 0,
    SelectEvents = 1,
    GetSelectedEvents = 2,
    GrabEvent = 3,
    UngrabEvent = 4,
}

impl MinorOpcode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::QueryVersion),
            1 => Some(Self::SelectEvents),
            2 => Some(Self::GetSelectedEvents),
            3 => Some(Self::GrabEvent),
            4 => Some(Self::UngrabEvent),
            _ => None,
        }
    }

    /// Request length in 4-byte units, header included.
    pub fn length_units(self) -> u16 {
        match self {
            Self::QueryVersion => 1,
            Self::SelectEvents => 3,
            Self::GetSelectedEvents => 2,
            Self::GrabEvent | Self::UngrabEvent => 4,
        }
    }

    /// Returns true if the server answers this request with a reply.
    pub fn expects_reply(self) -> bool {
        !matches!(self, Self::SelectEvents)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::QueryVersion => "QueryVersion",
            Self::SelectEvents => "SelectEvents",
            Self::GetSelectedEvents => "GetSelectedEvents",
            Self::GrabEvent => "GrabEvent",
            Self::UngrabEvent => "UngrabEvent",
        }
    }
}

/// Parameters shared by GrabEvent and UngrabEvent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrabParams {
    pub window: Window,
    /// Kind code of the gesture to grab.
    pub event_type: u8,
    pub num_finger: u8,
    pub time: Timestamp,
}

/// A request of the gesture extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Ask the server for its protocol version.
    QueryVersion,

    /// Replace the gesture selection of a window.
    SelectEvents { window: Window, mask: EventMask },

    /// Read back the gesture selection of a window.
    GetSelectedEvents { window: Window },

    /// Grab a gesture on a window for this client.
    GrabEvent(GrabParams),

    /// Release a previously grabbed gesture.
    UngrabEvent(GrabParams),
}

impl Request {
    /// Creates a SelectEvents request.
    pub fn select_events(window: Window, mask: EventMask) -> Self {
        Self::SelectEvents { window, mask }
    }

    /// Creates a GetSelectedEvents request.
    pub fn get_selected_events(window: Window) -> Self {
        Self::GetSelectedEvents { window }
    }

    /// Creates a GrabEvent request.
    pub fn grab_event(window: Window, event_type: u8, num_finger: u8, time: Timestamp) -> Self {
        Self::GrabEvent(GrabParams {
            window,
            event_type,
            num_finger,
            time,
        })
    }

    /// Creates an UngrabEvent request.
    pub fn ungrab_event(window: Window, event_type: u8, num_finger: u8, time: Timestamp) -> Self {
        Self::UngrabEvent(GrabParams {
            window,
            event_type,
            num_finger,
            time,
        })
    }

    pub fn minor_opcode(&self) -> MinorOpcode {
        match self {
            Self::QueryVersion => MinorOpcode::QueryVersion,
            Self::SelectEvents { .. } => MinorOpcode::SelectEvents,
            Self::GetSelectedEvents { .. } => MinorOpcode::GetSelectedEvents,
            Self::GrabEvent(_) => MinorOpcode::GrabEvent,
            Self::UngrabEvent(_) => MinorOpcode::UngrabEvent,
        }
    }

    /// Returns true if the server answers this request with a reply.
    pub fn expects_reply(&self) -> bool {
        self.minor_opcode().expects_reply()
    }

    /// Encodes the request with the connection's major opcode.
    pub fn encode(&self, order: ByteOrder, major_opcode: u8) -> Vec<u8> {
        let minor = self.minor_opcode();
        let units = minor.length_units();

        let mut w = WireWriter::<16>::new(order);
        w.put_u8(0, major_opcode)
            .put_u8(1, minor as u8)
            .put_u16(2, units);

        match self {
            Self::QueryVersion => {}
            Self::SelectEvents { window, mask } => {
                w.put_u32(4, *window).put_u32(8, mask.bits());
            }
            Self::GetSelectedEvents { window } => {
                w.put_u32(4, *window);
            }
            Self::GrabEvent(params) | Self::UngrabEvent(params) => {
                w.put_u32(4, params.window)
                    .put_u32(8, params.time)
                    .put_u8(12, params.event_type)
                    .put_u8(13, params.num_finger);
            }
        }

        let mut buffer = w.into_inner().to_vec();
        buffer.truncate(usize::from(units) * 4);
        buffer
    }

    /// Decodes a request, returning the major opcode it was sent with.
    pub fn decode(data: &[u8], order: ByteOrder) -> ProtocolResult<(u8, Self)> {
        let header = WireReader::new(data, order, REQUEST_HEADER_SIZE)?;
        let minor = header.u8(1);
        let opcode =
            MinorOpcode::from_u8(minor).ok_or(ProtocolError::UnknownRequest { minor })?;

        let declared = header.u16(2);
        let actual = opcode.length_units();
        if declared != actual {
            return Err(ProtocolError::LengthMismatch { declared, actual });
        }

        let r = WireReader::new(data, order, usize::from(actual) * 4)?;
        let grab_params = || GrabParams {
            window: r.u32(4),
            time: r.u32(8),
            event_type: r.u8(12),
            num_finger: r.u8(13),
        };

        let request = match opcode {
            MinorOpcode::QueryVersion => Self::QueryVersion,
            MinorOpcode::SelectEvents => Self::SelectEvents {
                window: r.u32(4),
                mask: EventMask::from_bits(r.u32(8)),
            },
            MinorOpcode::GetSelectedEvents => Self::GetSelectedEvents { window: r.u32(4) },
            MinorOpcode::GrabEvent => Self::GrabEvent(grab_params()),
            MinorOpcode::UngrabEvent => Self::UngrabEvent(grab_params()),
        };

        Ok((header.u8(0), request))
    }
}
