//! Byte order detection and width-aware field access
//!
//! Packet codecs read and write fields through [`PacketReader`] and
//! [`PacketWriter`]. Both carry the stream's [`ByteOrder`] and swap multi-byte
//! fields by width, so no packet ever swaps bytes by hand.

use crate::error::{CodecError, Result};
use bytes::{Buf, BufMut, BytesMut};
use once_cell::sync::Lazy;

/// Value of the byte-swap magic field when read in the sender's own order.
pub const BYTE_SWAP_MAGIC: u16 = 0x8000;

/// Order of multi-byte fields on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Big,
    Little,
}

static HOST_BYTE_ORDER: Lazy<ByteOrder> = Lazy::new(|| {
    if u16::from_ne_bytes([0x12, 0x34]) == 0x1234 {
        ByteOrder::Big
    } else {
        ByteOrder::Little
    }
});

/// Byte order of the running process, detected once.
pub fn host_byte_order() -> ByteOrder {
    *HOST_BYTE_ORDER
}

impl ByteOrder {
    pub fn swapped(self) -> ByteOrder {
        match self {
            ByteOrder::Big => ByteOrder::Little,
            ByteOrder::Little => ByteOrder::Big,
        }
    }

    /// Identifies the sender's byte order from the two raw magic bytes.
    pub fn from_magic(bytes: [u8; 2]) -> Result<ByteOrder> {
        match bytes {
            [0x80, 0x00] => Ok(ByteOrder::Big),
            [0x00, 0x80] => Ok(ByteOrder::Little),
            other => Err(CodecError::BadMagic(u16::from_be_bytes(other))),
        }
    }

    /// Parses the configuration spelling: `native`, `big` or `little`.
    pub fn parse(text: &str) -> Option<ByteOrder> {
        match text.trim().to_ascii_lowercase().as_str() {
            "native" | "host" => Some(host_byte_order()),
            "big" | "network" => Some(ByteOrder::Big),
            "little" => Some(ByteOrder::Little),
            _ => None,
        }
    }
}

/// Cursor over the payload of one packet.
#[derive(Debug)]
pub struct PacketReader<'a> {
    buf: &'a [u8],
    order: ByteOrder,
}

macro_rules! read_field {
    ($name:ident, $ty:ty, $be:ident, $le:ident) => {
        pub fn $name(&mut self) -> Result<$ty> {
            self.ensure(std::mem::size_of::<$ty>())?;
            Ok(match self.order {
                ByteOrder::Big => self.buf.$be(),
                ByteOrder::Little => self.buf.$le(),
            })
        }
    };
}

impl<'a> PacketReader<'a> {
    pub fn new(buf: &'a [u8], order: ByteOrder) -> Self {
        Self { buf, order }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(CodecError::Truncated {
                needed,
                available: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn get_i8(&mut self) -> Result<i8> {
        self.ensure(1)?;
        Ok(self.buf.get_i8())
    }

    read_field!(get_u16, u16, get_u16, get_u16_le);
    read_field!(get_i16, i16, get_i16, get_i16_le);
    read_field!(get_u32, u32, get_u32, get_u32_le);
    read_field!(get_i32, i32, get_i32, get_i32_le);
    read_field!(get_f32, f32, get_f32, get_f32_le);
    read_field!(get_f64, f64, get_f64, get_f64_le);

    /// Skips reserved bytes.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.buf.advance(count);
        Ok(())
    }

    /// Borrows the next `count` raw bytes.
    pub fn get_slice(&mut self, count: usize) -> Result<&'a [u8]> {
        self.ensure(count)?;
        let (head, tail) = self.buf.split_at(count);
        self.buf = tail;
        Ok(head)
    }

    /// Borrows everything left in the packet.
    pub fn rest(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.buf)
    }
}

/// Appends fields of one packet to an outgoing buffer.
#[derive(Debug)]
pub struct PacketWriter<'a> {
    buf: &'a mut BytesMut,
    order: ByteOrder,
    start: usize,
}

macro_rules! write_field {
    ($name:ident, $ty:ty, $be:ident, $le:ident) => {
        pub fn $name(&mut self, value: $ty) {
            match self.order {
                ByteOrder::Big => self.buf.$be(value),
                ByteOrder::Little => self.buf.$le(value),
            }
        }
    };
}

impl<'a> PacketWriter<'a> {
    pub fn new(buf: &'a mut BytesMut, order: ByteOrder) -> Self {
        let start = buf.len();
        Self { buf, order, start }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Bytes written through this writer so far.
    pub fn written(&self) -> usize {
        self.buf.len() - self.start
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn put_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    write_field!(put_u16, u16, put_u16, put_u16_le);
    write_field!(put_i16, i16, put_i16, put_i16_le);
    write_field!(put_u32, u32, put_u32, put_u32_le);
    write_field!(put_i32, i32, put_i32, put_i32_le);
    write_field!(put_f32, f32, put_f32, put_f32_le);
    write_field!(put_f64, f64, put_f64, put_f64_le);

    /// Writes reserved bytes.
    pub fn put_zeros(&mut self, count: usize) {
        self.buf.put_bytes(0, count);
    }

    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Pads with zeros until `written()` reaches `len`.
    pub fn pad_to(&mut self, len: usize) {
        let written = self.written();
        if written < len {
            self.put_zeros(len - written);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_order_matches_target() {
        let expected = if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        };
        assert_eq!(host_byte_order(), expected);
    }

    #[test]
    fn magic_identifies_sender_order() {
        assert_eq!(ByteOrder::from_magic([0x80, 0x00]), Ok(ByteOrder::Big));
        assert_eq!(ByteOrder::from_magic([0x00, 0x80]), Ok(ByteOrder::Little));
        assert_eq!(
            ByteOrder::from_magic([0x12, 0x34]),
            Err(CodecError::BadMagic(0x1234))
        );
    }

    #[test]
    fn writer_and_reader_swap_by_width() {
        for order in [ByteOrder::Big, ByteOrder::Little] {
            let mut buf = BytesMut::new();
            let mut writer = PacketWriter::new(&mut buf, order);
            writer.put_u8(7);
            writer.put_u16(0xBEEF);
            writer.put_i32(-42);
            writer.put_f64(1.25);
            assert_eq!(writer.written(), 15);

            let mut reader = PacketReader::new(&buf, order);
            assert_eq!(reader.get_u8(), Ok(7));
            assert_eq!(reader.get_u16(), Ok(0xBEEF));
            assert_eq!(reader.get_i32(), Ok(-42));
            assert_eq!(reader.get_f64(), Ok(1.25));
            assert_eq!(reader.remaining(), 0);
        }

        let mut buf = BytesMut::new();
        PacketWriter::new(&mut buf, ByteOrder::Big).put_u16(0x8000);
        assert_eq!(&buf[..], &[0x80, 0x00]);
        buf.clear();
        PacketWriter::new(&mut buf, ByteOrder::Little).put_u16(0x8000);
        assert_eq!(&buf[..], &[0x00, 0x80]);
    }

    #[test]
    fn reader_never_reads_past_the_end() {
        let mut reader = PacketReader::new(&[1, 2, 3], ByteOrder::Big);
        assert_eq!(
            reader.get_u32(),
            Err(CodecError::Truncated {
                needed: 4,
                available: 3
            })
        );
        assert_eq!(reader.get_u16(), Ok(0x0102));
        assert!(reader.skip(2).is_err());
    }

    #[test]
    fn parses_configured_orders() {
        assert_eq!(ByteOrder::parse("Big"), Some(ByteOrder::Big));
        assert_eq!(ByteOrder::parse("little"), Some(ByteOrder::Little));
        assert_eq!(ByteOrder::parse("native"), Some(host_byte_order()));
        assert_eq!(ByteOrder::parse("middle"), None);
    }
}
