//! Primitive wire types for A2S packets
//!
//! All multi-byte values are little-endian. Strings are NUL-terminated and
//! booleans occupy a single byte.

use crate::error::{ProtocolError, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Every A2S datagram starts with these four bytes.
pub const PACKET_HEADER: u32 = 0xFFFF_FFFF;

/// Growable buffer for building an outgoing packet
#[derive(Debug, Default, Clone)]
pub struct PacketWriter {
    buf: Vec<u8>,
}

impl PacketWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a packet with the magic header and the given type byte
    pub fn with_header(kind: u8) -> Self {
        let mut writer = Self::new();
        writer.write_u32(PACKET_HEADER);
        writer.write_u8(kind);
        writer
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        let mut bytes = [0u8; 2];
        LittleEndian::write_u16(&mut bytes, v);
        self.buf.extend_from_slice(&bytes);
    }

    pub fn write_u32(&mut self, v: u32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, v);
        self.buf.extend_from_slice(&bytes);
    }

    pub fn write_u64(&mut self, v: u64) {
        let mut bytes = [0u8; 8];
        LittleEndian::write_u64(&mut bytes, v);
        self.buf.extend_from_slice(&bytes);
    }

    /// Writes the IEEE-754 bit pattern of `v` as a u32
    pub fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    pub fn write_cstring(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a received datagram
///
/// Every read names the field it is decoding so that a short packet reports
/// exactly where it ran out of bytes.
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Validates the magic header and returns the type byte that follows it
    pub fn read_header(&mut self) -> Result<u8> {
        let header = self.read_u32("header")?;
        if header != PACKET_HEADER {
            return Err(ProtocolError::InvalidHeader(header));
        }
        self.read_u8("type")
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(ProtocolError::Truncated { field });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    pub fn read_u16(&mut self, field: &'static str) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2, field)?))
    }

    pub fn read_u32(&mut self, field: &'static str) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4, field)?))
    }

    pub fn read_u64(&mut self, field: &'static str) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8, field)?))
    }

    pub fn read_f32(&mut self, field: &'static str) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32(field)?))
    }

    /// Reads up to the first NUL, consuming the terminator
    pub fn read_cstring(&mut self, field: &'static str) -> Result<String> {
        let rest = &self.buf[self.pos..];
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(ProtocolError::Truncated { field })?;
        let s = String::from_utf8_lossy(&rest[..end]).into_owned();
        self.pos += end + 1;
        Ok(s)
    }

    pub fn read_bool(&mut self, field: &'static str) -> Result<bool> {
        Ok(self.read_u8(field)? != 0)
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_integers_are_little_endian() {
        let mut writer = PacketWriter::new();
        writer.write_u16(0x0102);
        writer.write_u32(0x0304_0506);
        writer.write_u64(0x0708_090A_0B0C_0D0E);

        assert_eq!(
            writer.into_bytes(),
            vec![
                0x02, 0x01, 0x06, 0x05, 0x04, 0x03, 0x0E, 0x0D, 0x0C, 0x0B, 0x0A, 0x09, 0x08,
                0x07
            ]
        );
    }

    #[test]
    fn test_header_is_all_bits_set() {
        let bytes = PacketWriter::with_header(b'T').into_bytes();
        assert_eq!(bytes, vec![0xFF, 0xFF, 0xFF, 0xFF, b'T']);

        let mut reader = PacketReader::new(&bytes);
        assert_eq!(reader.read_header().unwrap(), b'T');
        assert!(!reader.has_remaining());
    }

    #[test]
    fn test_invalid_header() {
        let bytes = [0xFE, 0xFF, 0xFF, 0xFF, b'T'];
        let mut reader = PacketReader::new(&bytes);

        match reader.read_header() {
            Err(ProtocolError::InvalidHeader(value)) => assert_eq!(value, 0xFFFF_FFFE),
            other => panic!("Expected InvalidHeader, got {:?}", other),
        }
    }

    #[test]
    fn test_header_without_type_byte() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF];
        let mut reader = PacketReader::new(&bytes);
        assert!(matches!(
            reader.read_header(),
            Err(ProtocolError::Truncated { field: "type" })
        ));
    }

    #[test]
    fn test_cstring_stops_at_first_nul() {
        let bytes = b"foo\0bar\0";
        let mut reader = PacketReader::new(bytes);

        assert_eq!(reader.read_cstring("first").unwrap(), "foo");
        assert_eq!(reader.read_cstring("second").unwrap(), "bar");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_cstring_without_terminator() {
        let mut reader = PacketReader::new(b"unterminated");
        assert!(matches!(
            reader.read_cstring("name"),
            Err(ProtocolError::Truncated { field: "name" })
        ));
    }

    #[test]
    fn test_cstring_utf8() {
        let mut writer = PacketWriter::new();
        writer.write_cstring("späße");
        let bytes = writer.into_bytes();

        let mut reader = PacketReader::new(&bytes);
        assert_eq!(reader.read_cstring("name").unwrap(), "späße");
    }

    #[test]
    fn test_float_bit_pattern() {
        let mut writer = PacketWriter::new();
        writer.write_f32(234.5);
        let bytes = writer.into_bytes();
        assert_eq!(bytes, 234.5f32.to_bits().to_le_bytes().to_vec());

        let mut reader = PacketReader::new(&bytes);
        assert_approx_eq!(reader.read_f32("duration").unwrap(), 234.5);
    }

    #[test]
    fn test_bool_encoding() {
        let mut writer = PacketWriter::new();
        writer.write_bool(true);
        writer.write_bool(false);
        assert_eq!(writer.into_bytes(), vec![1, 0]);

        let mut reader = PacketReader::new(&[0, 1, 7]);
        assert!(!reader.read_bool("a").unwrap());
        assert!(reader.read_bool("b").unwrap());
        assert!(reader.read_bool("c").unwrap());
    }

    #[test]
    fn test_read_past_end() {
        let mut reader = PacketReader::new(&[1, 2, 3]);
        assert!(matches!(
            reader.read_u32("score"),
            Err(ProtocolError::Truncated { field: "score" })
        ));
        // A failed read consumes nothing
        assert_eq!(reader.read_u16("port").unwrap(), 0x0201);
    }
}
