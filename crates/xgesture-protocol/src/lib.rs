//! Wire schema and codec for the gesture protocol extension.
//!
//! This crate describes every request, reply and event of the gesture
//! extension byte for byte, and converts between those fixed-layout records
//! and typed Rust values. It performs no I/O.
//!
//! # Protocol Overview
//!
//! - Requests start with a 4-byte header: major opcode (assigned per
//!   connection), minor opcode ([`MinorOpcode`]) and the request length in
//!   4-byte units.
//! - Replies and events are always 32 bytes.
//! - Every event starts with the type code (top bit = send-flag), the
//!   subevent kind, the low 16 bits of the request serial and a timestamp.
//! - Angles and zoom factors are 16.16 fixed point ([`Fixed`]).
//!
//! # Example
//!
//! ```rust
//! use xgesture_protocol::{ByteOrder, EventContext, GestureEvent};
//!
//! let mut wire = [0u8; 32];
//! wire[0] = 0x41; // first_event 0x40 + Flick
//! wire[20..24].copy_from_slice(&0x0001_8000i32.to_le_bytes());
//!
//! let ctx = EventContext::new(ByteOrder::LsbFirst, 0x40);
//! let event = GestureEvent::from_wire(&wire, &ctx).unwrap().unwrap();
//! match event {
//!     GestureEvent::Flick(flick) => assert_eq!(flick.angle.to_f64(), 1.5),
//!     _ => unreachable!(),
//! }
//! ```

mod error;
mod event;
mod fixed;
mod reply;
mod request;
mod serial;
mod wire;

pub use error::{ProtocolError, ProtocolResult};
pub use event::{
    direction, kind, tap_repeat, ConnectionId, EventContext, EventHeader, EventKind, EventMask,
    FlickEvent, GestureEvent, GroupEvent, HoldEvent, PanEvent, PinchRotationEvent, TapAndHoldEvent,
    TapEvent, Timestamp, Window,
};
pub use fixed::Fixed;
pub use reply::{
    error_packet, ErrorCode, GrabReply, GrabStatus, ReplyHeader, SelectedEventsReply, VersionReply,
};
pub use request::{GrabParams, MinorOpcode, Request};
pub use serial::SerialState;
pub use wire::{ByteOrder, WireReader, WireWriter};

/// Name the server advertises the extension under.
pub const EXTENSION_NAME: &str = "GESTURE";

/// Protocol major version implemented by this crate.
pub const MAJOR_VERSION: u16 = 0;

/// Protocol minor version implemented by this crate.
pub const MINOR_VERSION: u16 = 1;

/// Protocol patch version implemented by this crate.
pub const PATCH_VERSION: u16 = 0;

/// Number of event codes the extension occupies.
pub const NUMBER_EVENTS: u8 = 7;

/// Number of error codes the extension occupies.
pub const NUMBER_ERRORS: u8 = 3;

/// Size of every event and reply record.
pub const EVENT_SIZE: usize = 32;

/// Size of a reply record without extra data.
pub const REPLY_SIZE: usize = 32;

/// Size of the generic request header.
pub const REQUEST_HEADER_SIZE: usize = 4;
