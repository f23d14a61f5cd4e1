//! Fixed-layout field access for wire records.
//!
//! Every record of the extension is positional: a field lives at a known
//! offset with a known width. [`WireReader`] and [`WireWriter`] wrap a byte
//! buffer and read or write those fields in the connection's byte order.
//!
//! ```text
//! +------+------+-----------+-----------+------------------+
//! | type | kind | seq (u16) | time (u32)| window (u32) ... |
//! +------+------+-----------+-----------+------------------+
//!   0      1      2           4           8
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

/// Byte order of multi-byte integers on a connection.
///
/// Chosen by the client when the connection is set up; the server answers in
/// the same order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Least significant byte first.
    #[default]
    #[serde(alias = "lsb", alias = "little")]
    LsbFirst,
    /// Most significant byte first.
    #[serde(alias = "msb", alias = "big")]
    MsbFirst,
}

/// Reads fixed-offset fields from a wire record.
pub struct WireReader<'a> {
    buf: &'a [u8],
    order: ByteOrder,
}

impl<'a> WireReader<'a> {
    /// Creates a reader over `buf`, which must hold at least `size` bytes.
    pub fn new(buf: &'a [u8], order: ByteOrder, size: usize) -> ProtocolResult<Self> {
        if buf.len() < size {
            return Err(ProtocolError::IncompleteMessage {
                expected: size,
                received: buf.len(),
            });
        }
        Ok(Self { buf, order })
    }

    pub fn u8(&self, offset: usize) -> u8 {
        self.buf[offset]
    }

    pub fn u16(&self, offset: usize) -> u16 {
        let bytes = [self.buf[offset], self.buf[offset + 1]];
        match self.order {
            ByteOrder::LsbFirst => u16::from_le_bytes(bytes),
            ByteOrder::MsbFirst => u16::from_be_bytes(bytes),
        }
    }

    pub fn i16(&self, offset: usize) -> i16 {
        self.u16(offset) as i16
    }

    pub fn u32(&self, offset: usize) -> u32 {
        let bytes = [
            self.buf[offset],
            self.buf[offset + 1],
            self.buf[offset + 2],
            self.buf[offset + 3],
        ];
        match self.order {
            ByteOrder::LsbFirst => u32::from_le_bytes(bytes),
            ByteOrder::MsbFirst => u32::from_be_bytes(bytes),
        }
    }

    pub fn i32(&self, offset: usize) -> i32 {
        self.u32(offset) as i32
    }
}

/// Writes fixed-offset fields into a zero-initialised record.
pub struct WireWriter<const N: usize> {
    buf: [u8; N],
    order: ByteOrder,
}

impl<const N: usize> WireWriter<N> {
    /// Creates a writer over an all-zero record.
    pub fn new(order: ByteOrder) -> Self {
        Self {
            buf: [0u8; N],
            order,
        }
    }

    pub fn put_u8(&mut self, offset: usize, value: u8) -> &mut Self {
        self.buf[offset] = value;
        self
    }

    pub fn put_u16(&mut self, offset: usize, value: u16) -> &mut Self {
        let bytes = match self.order {
            ByteOrder::LsbFirst => value.to_le_bytes(),
            ByteOrder::MsbFirst => value.to_be_bytes(),
        };
        self.buf[offset..offset + 2].copy_from_slice(&bytes);
        self
    }

    pub fn put_i16(&mut self, offset: usize, value: i16) -> &mut Self {
        self.put_u16(offset, value as u16)
    }

    pub fn put_u32(&mut self, offset: usize, value: u32) -> &mut Self {
        let bytes = match self.order {
            ByteOrder::LsbFirst => value.to_le_bytes(),
            ByteOrder::MsbFirst => value.to_be_bytes(),
        };
        self.buf[offset..offset + 4].copy_from_slice(&bytes);
        self
    }

    pub fn put_i32(&mut self, offset: usize, value: i32) -> &mut Self {
        self.put_u32(offset, value as u32)
    }

    /// Unwraps this writer, returning the finished record.
    pub fn into_inner(self) -> [u8; N] {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_rejects_short_buffer() {
        let result = WireReader::new(&[0u8; 8], ByteOrder::LsbFirst, 32);
        assert!(matches!(
            result,
            Err(ProtocolError::IncompleteMessage {
                expected: 32,
                received: 8
            })
        ));
    }

    #[test]
    fn writer_honours_byte_order() {
        let mut lsb = WireWriter::<8>::new(ByteOrder::LsbFirst);
        lsb.put_u16(0, 0x1234).put_u32(4, 0xAABB_CCDD);
        assert_eq!(lsb.into_inner(), [0x34, 0x12, 0, 0, 0xDD, 0xCC, 0xBB, 0xAA]);

        let mut msb = WireWriter::<8>::new(ByteOrder::MsbFirst);
        msb.put_u16(0, 0x1234).put_u32(4, 0xAABB_CCDD);
        assert_eq!(msb.into_inner(), [0x12, 0x34, 0, 0, 0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn signed_fields_keep_sign() {
        let mut writer = WireWriter::<8>::new(ByteOrder::MsbFirst);
        writer.put_i16(0, -5).put_i32(4, -70_000);
        let record = writer.into_inner();

        let reader = WireReader::new(&record, ByteOrder::MsbFirst, 8).unwrap();
        assert_eq!(reader.i16(0), -5);
        assert_eq!(reader.i32(4), -70_000);
    }

    #[test]
    fn byte_order_parses_short_names() {
        let order: ByteOrder = serde_json::from_str("\"msb\"").unwrap();
        assert_eq!(order, ByteOrder::MsbFirst);
        let order: ByteOrder = serde_json::from_str("\"lsb_first\"").unwrap();
        assert_eq!(order, ByteOrder::LsbFirst);
    }
}
