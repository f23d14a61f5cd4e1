//! Reply records and status codes.
//!
//! Replies reuse the generic 32-byte reply layout:
//!
//! ```text
//! +------+------+----------+----------------+---------------------+
//! | 1    | data | sequence | extra length   | reply fields        |
//! | u8   | u8   | u16      | u32 (4-byte u.)| 24 bytes            |
//! +------+------+----------+----------------+---------------------+
//! ```
//!
//! A buffer starting with `0` instead of `1` is an error packet.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::event::EventMask;
use crate::wire::{ByteOrder, WireReader, WireWriter};
use crate::REPLY_SIZE;

const X_ERROR: u8 = 0;
const X_REPLY: u8 = 1;

/// Status returned by grab and ungrab requests.
///
/// Codes reported by the server are passed through unchanged. The library
/// reports its own local failures with the same numbering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrabStatus(pub u8);

impl GrabStatus {
    pub const SUCCESS: GrabStatus = GrabStatus(0);
    /// Another client already holds the grab.
    pub const GRABBED_ALREADY: GrabStatus = GrabStatus(1);
    pub const GRAB_ABNORMAL: GrabStatus = GrabStatus(2);
    pub const UNGRAB_ABNORMAL: GrabStatus = GrabStatus(3);
    /// No reply could be obtained.
    pub const INVALID_REPLY: GrabStatus = GrabStatus(4);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Returns the symbolic name of a known status.
    pub fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("Success"),
            1 => Some("GrabbedAlready"),
            2 => Some("GrabAbnormal"),
            3 => Some("UngrabAbnormal"),
            4 => Some("InvalidReply"),
            _ => None,
        }
    }
}

impl fmt::Display for GrabStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "status {}", self.0),
        }
    }
}

/// Error codes of the extension, relative to the connection's first error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ErrorCode {
    /// Request came from a client not running on the server host.
    ClientNotLocal = 0,
    /// Event mask contains undefined bits.
    InvalidMask = 1,
    /// Server does not implement the requested operation.
    OperationNotSupported = 2,
}

impl ErrorCode {
    /// Maps a code relative to the first error code back to a variant.
    pub fn from_offset(offset: u8) -> Option<Self> {
        match offset {
            0 => Some(Self::ClientNotLocal),
            1 => Some(Self::InvalidMask),
            2 => Some(Self::OperationNotSupported),
            _ => None,
        }
    }

    /// Returns the protocol name of the error.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClientNotLocal => "ClientNotLocal",
            Self::InvalidMask => "InValidMask",
            Self::OperationNotSupported => "OperationNotSupported",
        }
    }

    /// Returns a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            Self::ClientNotLocal => "Client is not local to the server",
            Self::InvalidMask => "Event mask contains undefined bits",
            Self::OperationNotSupported => "Operation is not supported by the server",
        }
    }
}

/// Generic part of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyHeader {
    /// Reply-specific data byte.
    pub data: u8,
    pub sequence: u16,
    /// Extra length beyond 32 bytes, in 4-byte units.
    pub length: u32,
}

impl ReplyHeader {
    /// Parses the generic reply header and returns a reader over the record.
    ///
    /// Error packets surface as [`ProtocolError::ServerError`].
    pub fn parse(data: &[u8], order: ByteOrder) -> ProtocolResult<(Self, WireReader<'_>)> {
        let r = WireReader::new(data, order, REPLY_SIZE)?;
        match r.u8(0) {
            X_REPLY => {}
            X_ERROR => {
                return Err(ProtocolError::ServerError {
                    code: r.u8(1),
                    sequence: r.u16(2),
                    minor_opcode: r.u16(8),
                    major_opcode: r.u8(10),
                });
            }
            code => return Err(ProtocolError::UnexpectedReply { code }),
        }

        let header = Self {
            data: r.u8(1),
            sequence: r.u16(2),
            length: r.u32(4),
        };

        let total = REPLY_SIZE + header.length as usize * 4;
        if data.len() < total {
            return Err(ProtocolError::IncompleteMessage {
                expected: total,
                received: data.len(),
            });
        }

        Ok((header, r))
    }

    fn write(&self, w: &mut WireWriter<REPLY_SIZE>) {
        w.put_u8(0, X_REPLY)
            .put_u8(1, self.data)
            .put_u16(2, self.sequence)
            .put_u32(4, self.length);
    }
}

/// Builds an error packet as the server would send it.
pub fn error_packet(
    order: ByteOrder,
    code: u8,
    sequence: u16,
    major_opcode: u8,
    minor_opcode: u16,
) -> [u8; REPLY_SIZE] {
    let mut w = WireWriter::<REPLY_SIZE>::new(order);
    w.put_u8(0, X_ERROR)
        .put_u8(1, code)
        .put_u16(2, sequence)
        .put_u16(8, minor_opcode)
        .put_u8(10, major_opcode);
    w.into_inner()
}

/// Reply to QueryVersion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionReply {
    pub sequence: u16,
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl VersionReply {
    pub fn parse(data: &[u8], order: ByteOrder) -> ProtocolResult<Self> {
        let (header, r) = ReplyHeader::parse(data, order)?;
        Ok(Self {
            sequence: header.sequence,
            major: r.u16(8),
            minor: r.u16(10),
            patch: r.u16(12),
        })
    }

    pub fn encode(&self, order: ByteOrder) -> [u8; REPLY_SIZE] {
        let mut w = WireWriter::<REPLY_SIZE>::new(order);
        reply_header(self.sequence, 0).write(&mut w);
        w.put_u16(8, self.major)
            .put_u16(10, self.minor)
            .put_u16(12, self.patch);
        w.into_inner()
    }
}

/// Reply to GetSelectedEvents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedEventsReply {
    pub sequence: u16,
    pub mask: EventMask,
}

impl SelectedEventsReply {
    pub fn parse(data: &[u8], order: ByteOrder) -> ProtocolResult<Self> {
        let (header, r) = ReplyHeader::parse(data, order)?;
        Ok(Self {
            sequence: header.sequence,
            mask: EventMask::from_bits(r.u32(8)),
        })
    }

    pub fn encode(&self, order: ByteOrder) -> [u8; REPLY_SIZE] {
        let mut w = WireWriter::<REPLY_SIZE>::new(order);
        reply_header(self.sequence, 0).write(&mut w);
        w.put_u32(8, self.mask.bits());
        w.into_inner()
    }
}

/// Reply to GrabEvent and UngrabEvent; the status rides in the data byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrabReply {
    pub sequence: u16,
    pub status: GrabStatus,
}

impl GrabReply {
    pub fn parse(data: &[u8], order: ByteOrder) -> ProtocolResult<Self> {
        let (header, _) = ReplyHeader::parse(data, order)?;
        Ok(Self {
            sequence: header.sequence,
            status: GrabStatus(header.data),
        })
    }

    pub fn encode(&self, order: ByteOrder) -> [u8; REPLY_SIZE] {
        let mut w = WireWriter::<REPLY_SIZE>::new(order);
        reply_header(self.sequence, self.status.0).write(&mut w);
        w.into_inner()
    }
}

fn reply_header(sequence: u16, data: u8) -> ReplyHeader {
    ReplyHeader {
        data,
        sequence,
        length: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_reply_roundtrip() {
        let reply = VersionReply {
            sequence: 4,
            major: 0,
            minor: 1,
            patch: 0,
        };
        let bytes = reply.encode(ByteOrder::MsbFirst);
        assert_eq!(bytes[0], 1);
        assert_eq!(VersionReply::parse(&bytes, ByteOrder::MsbFirst).unwrap(), reply);
    }

    #[test]
    fn grab_status_rides_in_data_byte() {
        let reply = GrabReply {
            sequence: 2,
            status: GrabStatus::GRABBED_ALREADY,
        };
        let bytes = reply.encode(ByteOrder::LsbFirst);
        assert_eq!(bytes[1], 1);
        assert_eq!(GrabReply::parse(&bytes, ByteOrder::LsbFirst).unwrap(), reply);
    }

    #[test]
    fn selected_events_mask_offset() {
        let reply = SelectedEventsReply {
            sequence: 9,
            mask: EventMask::from_bits(0b0101),
        };
        let bytes = reply.encode(ByteOrder::LsbFirst);
        assert_eq!(&bytes[8..12], &[0b0101, 0, 0, 0]);
    }

    #[test]
    fn error_packet_becomes_server_error() {
        let bytes = error_packet(ByteOrder::LsbFirst, 129, 6, 140, 1);
        let result = SelectedEventsReply::parse(&bytes, ByteOrder::LsbFirst);
        assert_eq!(
            result,
            Err(ProtocolError::ServerError {
                code: 129,
                major_opcode: 140,
                minor_opcode: 1,
                sequence: 6,
            })
        );
    }

    #[test]
    fn short_reply_is_incomplete() {
        let result = GrabReply::parse(&[1, 0, 0, 0], ByteOrder::LsbFirst);
        assert!(matches!(
            result,
            Err(ProtocolError::IncompleteMessage { expected: 32, received: 4 })
        ));
    }

    #[test]
    fn event_record_is_not_a_reply() {
        let mut bytes = [0u8; REPLY_SIZE];
        bytes[0] = 0x41;
        let result = GrabReply::parse(&bytes, ByteOrder::LsbFirst);
        assert_eq!(result, Err(ProtocolError::UnexpectedReply { code: 0x41 }));
    }

    #[test]
    fn extra_length_must_be_present() {
        let mut bytes = [0u8; REPLY_SIZE];
        bytes[0] = 1;
        bytes[4] = 2;
        let result = GrabReply::parse(&bytes, ByteOrder::LsbFirst);
        assert!(matches!(
            result,
            Err(ProtocolError::IncompleteMessage { expected: 40, .. })
        ));
    }

    #[test]
    fn error_code_names() {
        assert_eq!(ErrorCode::from_offset(1), Some(ErrorCode::InvalidMask));
        assert_eq!(ErrorCode::from_offset(3), None);
        assert_eq!(ErrorCode::ClientNotLocal.name(), "ClientNotLocal");
        assert!(!ErrorCode::OperationNotSupported.description().is_empty());
    }

    #[test]
    fn grab_status_display() {
        assert_eq!(GrabStatus::SUCCESS.to_string(), "Success");
        assert_eq!(GrabStatus(42).to_string(), "status 42");
        assert!(GrabStatus::SUCCESS.is_success());
        assert!(!GrabStatus::GRABBED_ALREADY.is_success());
    }
}
