//! Request serial reconstruction.
//!
//! Events and replies only carry the low 16 bits of the serial of the last
//! request the server processed. The full value is rebuilt from what the
//! connection last knew, assuming serials never go backwards.

use serde::{Deserialize, Serialize};

/// Serial bookkeeping of a connection at the time an event is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialState {
    /// Serial of the last request the server is known to have processed.
    pub last_read: u64,
    /// Serial of the last request sent by the client.
    pub last_sent: u64,
}

impl SerialState {
    pub fn new(last_read: u64, last_sent: u64) -> Self {
        Self {
            last_read,
            last_sent,
        }
    }

    /// Rebuilds a full serial from a 16-bit wire sequence number.
    ///
    /// The high bits come from `last_read`. If that lands below `last_read`
    /// the sequence number has wrapped, so the next 64K block is used unless
    /// that would pass the last request sent.
    pub fn widen(&self, sequence: u16) -> u64 {
        let serial = (self.last_read & !0xFFFF) | u64::from(sequence);
        if serial >= self.last_read {
            return serial;
        }
        let wrapped = serial + 0x1_0000;
        if wrapped > self.last_sent {
            serial
        } else {
            wrapped
        }
    }

    /// Truncates a full serial to the wire sequence number.
    pub fn truncate(serial: u64) -> u16 {
        (serial & 0xFFFF) as u16
    }
}
