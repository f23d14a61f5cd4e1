//! Gesture events: typed model and 32-byte wire records.
//!
//! Every record shares a 12-byte header:
//!
//! ```text
//! +------+------+----------+-----------+-------------+----------------+
//! | type | kind | sequence | time      | window      | variant body   |
//! | u8   | u8   | u16      | u32       | u32         | 20 bytes       |
//! +------+------+----------+-----------+-------------+----------------+
//!   0      1      2          4           8             12
//! ```
//!
//! The top bit of `type` is the send-flag. The rest is the absolute event
//! code, i.e. the connection's first event code plus the [`EventKind`].

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::fixed::Fixed;
use crate::serial::SerialState;
use crate::wire::{ByteOrder, WireReader, WireWriter};
use crate::EVENT_SIZE;

/// X window identifier.
pub type Window = u32;

/// Server timestamp in milliseconds.
pub type Timestamp = u32;

const SEND_EVENT_BIT: u8 = 0x80;
const TYPE_MASK: u8 = 0x7F;

const OFF_TYPE: usize = 0;
const OFF_KIND: usize = 1;
const OFF_SEQUENCE: usize = 2;
const OFF_TIME: usize = 4;
const OFF_WINDOW: usize = 8;

/// Handle of the connection an event was read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u32);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Subevent kinds carried in byte 1 of every event.
pub mod kind {
    /// Gesture started.
    pub const BEGIN: u8 = 0;
    /// Gesture in progress.
    pub const UPDATE: u8 = 1;
    /// Gesture finished.
    pub const END: u8 = 2;
    /// Gesture completed as a single notification.
    pub const DONE: u8 = 3;

    /// A finger group disappeared.
    pub const GROUP_REMOVED: u8 = 0;
    /// A finger group appeared.
    pub const GROUP_ADDED: u8 = 1;
    /// Report of the current group.
    pub const GROUP_CURRENT: u8 = 2;
}

/// Tap repeat counts.
pub mod tap_repeat {
    pub const SINGLE: u8 = 1;
    pub const DOUBLE: u8 = 2;
    pub const TRIPLE: u8 = 3;
}

/// Eight-way direction octants used by flick and pan events.
pub mod direction {
    /// Number of octants; valid directions are `0..COUNT`.
    pub const COUNT: u8 = 8;

    pub fn is_valid(direction: u8) -> bool {
        direction < COUNT
    }
}

/// Gesture kinds, numbered relative to the connection's first event code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EventKind {
    Group = 0,
    Flick = 1,
    Pan = 2,
    PinchRotation = 3,
    Tap = 4,
    TapAndHold = 5,
    Hold = 6,
}

impl EventKind {
    /// All kinds in code order.
    pub const ALL: [EventKind; 7] = [
        EventKind::Group,
        EventKind::Flick,
        EventKind::Pan,
        EventKind::PinchRotation,
        EventKind::Tap,
        EventKind::TapAndHold,
        EventKind::Hold,
    ];

    /// Maps a code relative to the first event code back to a kind.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns the selection mask bit for this kind.
    pub fn mask(self) -> EventMask {
        EventMask(1 << self.code())
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Flick => "flick",
            Self::Pan => "pan",
            Self::PinchRotation => "pinch_rotation",
            Self::Tap => "tap",
            Self::TapAndHold => "tap_and_hold",
            Self::Hold => "hold",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-window event selection mask, one bit per [`EventKind`].
///
/// Bits outside [`EventMask::ALL`] are carried as-is; the server is the one
/// that rejects them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventMask(u32);

impl EventMask {
    pub const NONE: EventMask = EventMask(0);
    pub const GROUP: EventMask = EventMask(1 << 0);
    pub const FLICK: EventMask = EventMask(1 << 1);
    pub const PAN: EventMask = EventMask(1 << 2);
    pub const PINCH_ROTATION: EventMask = EventMask(1 << 3);
    pub const TAP: EventMask = EventMask(1 << 4);
    pub const TAP_AND_HOLD: EventMask = EventMask(1 << 5);
    pub const HOLD: EventMask = EventMask(1 << 6);
    /// Every defined kind.
    pub const ALL: EventMask = EventMask(0x7F);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, kind: EventKind) -> bool {
        self.0 & kind.mask().0 != 0
    }

    /// Returns true if bits outside the defined kinds are set.
    pub fn has_unknown_bits(self) -> bool {
        self.0 & !Self::ALL.0 != 0
    }

    /// Returns the defined kinds selected by this mask.
    pub fn kinds(self) -> impl Iterator<Item = EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl BitOr for EventMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EventMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<EventKind> for EventMask {
    fn from(kind: EventKind) -> Self {
        kind.mask()
    }
}

impl fmt::Display for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Connection state needed to interpret an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventContext {
    /// Byte order of the connection.
    pub order: ByteOrder,
    /// First event code assigned to the extension.
    pub first_event: u8,
    /// Serial bookkeeping used to widen the sequence number.
    pub serial: SerialState,
    /// Connection the record was read from.
    pub connection: ConnectionId,
}

impl EventContext {
    pub fn new(order: ByteOrder, first_event: u8) -> Self {
        Self {
            order,
            first_event,
            serial: SerialState::default(),
            connection: ConnectionId::default(),
        }
    }

    /// Builder: set the serial state.
    pub fn with_serial(mut self, serial: SerialState) -> Self {
        self.serial = serial;
        self
    }

    /// Builder: set the originating connection.
    pub fn with_connection(mut self, connection: ConnectionId) -> Self {
        self.connection = connection;
        self
    }

    /// Returns the kind a raw type code maps to, if it is one of ours.
    pub fn classify(&self, type_code: u8) -> Option<EventKind> {
        (type_code & TYPE_MASK)
            .checked_sub(self.first_event)
            .and_then(EventKind::from_code)
    }
}

/// Fields common to every gesture event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHeader {
    /// Absolute event code with the send-flag stripped.
    pub event_type: u8,
    /// Serial of the last request processed by the server.
    pub serial: u64,
    /// True if the event came from a SendEvent request.
    pub send_event: bool,
    /// Connection the event was read from.
    pub connection: ConnectionId,
    /// Window the event was selected on.
    pub window: Window,
    /// Server timestamp.
    pub time: Timestamp,
    /// Subevent kind, see [`kind`].
    pub kind: u8,
}

impl EventHeader {
    fn read(r: &WireReader<'_>, ctx: &EventContext) -> Self {
        let type_code = r.u8(OFF_TYPE);
        Self {
            event_type: type_code & TYPE_MASK,
            serial: ctx.serial.widen(r.u16(OFF_SEQUENCE)),
            send_event: type_code & SEND_EVENT_BIT != 0,
            connection: ctx.connection,
            window: r.u32(OFF_WINDOW),
            time: r.u32(OFF_TIME),
            kind: r.u8(OFF_KIND),
        }
    }

    fn write(&self, w: &mut WireWriter<EVENT_SIZE>, type_code: u8) {
        let flag = if self.send_event { SEND_EVENT_BIT } else { 0 };
        w.put_u8(OFF_TYPE, (type_code & TYPE_MASK) | flag)
            .put_u8(OFF_KIND, self.kind)
            .put_u16(OFF_SEQUENCE, SerialState::truncate(self.serial))
            .put_u32(OFF_TIME, self.time)
            .put_u32(OFF_WINDOW, self.window);
    }
}

/// Finger group added, removed or reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEvent {
    pub header: EventHeader,
    pub group_id: u8,
    pub num_group: u8,
}

/// Quick swipe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlickEvent {
    pub header: EventHeader,
    pub num_finger: u8,
    /// Octant 0–7.
    pub direction: u8,
    /// Distance between first and last point in pixels.
    pub distance: u16,
    /// Time between press and release in milliseconds.
    pub duration: u32,
    /// Angle between the horizontal and the flick line, in radians.
    pub angle: Fixed,
}

/// Drag with one or more fingers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanEvent {
    pub header: EventHeader,
    pub num_finger: u8,
    pub direction: u8,
    pub distance: u16,
    pub duration: u32,
    pub dx: i16,
    pub dy: i16,
}

/// Two-finger pinch and rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinchRotationEvent {
    pub header: EventHeader,
    pub num_finger: u8,
    /// Distance from the centre in pixels.
    pub distance: u16,
    pub cx: i16,
    pub cy: i16,
    /// Zoom factor relative to 1.0.
    pub zoom: Fixed,
    /// Angle between the first and the current line, in radians.
    pub angle: Fixed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapEvent {
    pub header: EventHeader,
    pub num_finger: u8,
    /// See [`tap_repeat`].
    pub tap_repeat: u8,
    pub cx: i16,
    pub cy: i16,
    /// Time since the previous tap in milliseconds.
    pub interval: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapAndHoldEvent {
    pub header: EventHeader,
    pub num_finger: u8,
    pub cx: i16,
    pub cy: i16,
    /// Time between the tap and the hold in milliseconds.
    pub interval: u32,
    pub hold_time: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldEvent {
    pub header: EventHeader,
    pub num_finger: u8,
    pub cx: i16,
    pub cy: i16,
    pub hold_time: u32,
}

/// A decoded gesture notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureEvent {
    Group(GroupEvent),
    Flick(FlickEvent),
    Pan(PanEvent),
    PinchRotation(PinchRotationEvent),
    Tap(TapEvent),
    TapAndHold(TapAndHoldEvent),
    Hold(HoldEvent),
}

impl GestureEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Group(_) => EventKind::Group,
            Self::Flick(_) => EventKind::Flick,
            Self::Pan(_) => EventKind::Pan,
            Self::PinchRotation(_) => EventKind::PinchRotation,
            Self::Tap(_) => EventKind::Tap,
            Self::TapAndHold(_) => EventKind::TapAndHold,
            Self::Hold(_) => EventKind::Hold,
        }
    }

    pub fn header(&self) -> &EventHeader {
        match self {
            Self::Group(e) => &e.header,
            Self::Flick(e) => &e.header,
            Self::Pan(e) => &e.header,
            Self::PinchRotation(e) => &e.header,
            Self::Tap(e) => &e.header,
            Self::TapAndHold(e) => &e.header,
            Self::Hold(e) => &e.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut EventHeader {
        match self {
            Self::Group(e) => &mut e.header,
            Self::Flick(e) => &mut e.header,
            Self::Pan(e) => &mut e.header,
            Self::PinchRotation(e) => &mut e.header,
            Self::Tap(e) => &mut e.header,
            Self::TapAndHold(e) => &mut e.header,
            Self::Hold(e) => &mut e.header,
        }
    }

    /// Decodes a wire record.
    ///
    /// Returns `Ok(None)` when the type code does not belong to this
    /// extension; the caller should offer the record to other decoders.
    /// Only a record too short to hold an event is an error.
    pub fn from_wire(wire: &[u8], ctx: &EventContext) -> ProtocolResult<Option<Self>> {
        let Some(&type_code) = wire.first() else {
            return Err(ProtocolError::IncompleteMessage {
                expected: EVENT_SIZE,
                received: 0,
            });
        };
        let Some(kind) = ctx.classify(type_code) else {
            return Ok(None);
        };

        let r = WireReader::new(wire, ctx.order, EVENT_SIZE)?;
        let header = EventHeader::read(&r, ctx);

        let event = match kind {
            EventKind::Group => Self::Group(GroupEvent {
                header,
                group_id: r.u8(12),
                num_group: r.u8(13),
            }),
            EventKind::Flick => Self::Flick(FlickEvent {
                header,
                num_finger: r.u8(12),
                direction: r.u8(13),
                distance: r.u16(14),
                duration: r.u32(16),
                angle: Fixed(r.i32(20)),
            }),
            EventKind::Pan => Self::Pan(PanEvent {
                header,
                num_finger: r.u8(12),
                direction: r.u8(13),
                distance: r.u16(14),
                duration: r.u32(16),
                dx: r.i16(20),
                dy: r.i16(22),
            }),
            EventKind::PinchRotation => Self::PinchRotation(PinchRotationEvent {
                header,
                num_finger: r.u8(12),
                distance: r.u16(14),
                cx: r.i16(16),
                cy: r.i16(18),
                zoom: Fixed(r.i32(20)),
                angle: Fixed(r.i32(24)),
            }),
            EventKind::Tap => Self::Tap(TapEvent {
                header,
                num_finger: r.u8(12),
                tap_repeat: r.u8(13),
                cx: r.i16(14),
                cy: r.i16(16),
                interval: r.u32(20),
            }),
            EventKind::TapAndHold => Self::TapAndHold(TapAndHoldEvent {
                header,
                num_finger: r.u8(12),
                cx: r.i16(14),
                cy: r.i16(16),
                interval: r.u32(20),
                hold_time: r.u32(24),
            }),
            EventKind::Hold => Self::Hold(HoldEvent {
                header,
                num_finger: r.u8(12),
                cx: r.i16(14),
                cy: r.i16(16),
                hold_time: r.u32(20),
            }),
        };

        Ok(Some(event))
    }

    /// Encodes this event as a wire record.
    ///
    /// The type code is recomputed from the variant and `first_event`; only
    /// the low 16 bits of the serial survive.
    pub fn to_wire(&self, order: ByteOrder, first_event: u8) -> [u8; EVENT_SIZE] {
        let mut w = WireWriter::<EVENT_SIZE>::new(order);
        self.header()
            .write(&mut w, first_event.wrapping_add(self.kind().code()));

        match self {
            Self::Group(e) => {
                w.put_u8(12, e.group_id).put_u8(13, e.num_group);
            }
            Self::Flick(e) => {
                w.put_u8(12, e.num_finger)
                    .put_u8(13, e.direction)
                    .put_u16(14, e.distance)
                    .put_u32(16, e.duration)
                    .put_i32(20, e.angle.raw());
            }
            Self::Pan(e) => {
                w.put_u8(12, e.num_finger)
                    .put_u8(13, e.direction)
                    .put_u16(14, e.distance)
                    .put_u32(16, e.duration)
                    .put_i16(20, e.dx)
                    .put_i16(22, e.dy);
            }
            Self::PinchRotation(e) => {
                w.put_u8(12, e.num_finger)
                    .put_u16(14, e.distance)
                    .put_i16(16, e.cx)
                    .put_i16(18, e.cy)
                    .put_i32(20, e.zoom.raw())
                    .put_i32(24, e.angle.raw());
            }
            Self::Tap(e) => {
                w.put_u8(12, e.num_finger)
                    .put_u8(13, e.tap_repeat)
                    .put_i16(14, e.cx)
                    .put_i16(16, e.cy)
                    .put_u32(20, e.interval);
            }
            Self::TapAndHold(e) => {
                w.put_u8(12, e.num_finger)
                    .put_i16(14, e.cx)
                    .put_i16(16, e.cy)
                    .put_u32(20, e.interval)
                    .put_u32(24, e.hold_time);
            }
            Self::Hold(e) => {
                w.put_u8(12, e.num_finger)
                    .put_i16(14, e.cx)
                    .put_i16(16, e.cy)
                    .put_u32(20, e.hold_time);
            }
        }

        w.into_inner()
    }
}
