//! FIFO packet 3 layout (accel + gyro + temperature + timestamp).
//!
//! ```text
//! byte  0      header (0x68: ACCEL | GYRO | TMST_ODR)
//! bytes 1..7   accel X, Y, Z   (i16 LE)
//! bytes 7..13  gyro  X, Y, Z   (i16 LE)
//! byte  13     temperature     (i8)
//! bytes 14..16 timestamp       (u16 LE, microseconds)
//! ```

use byteorder::{ByteOrder, LittleEndian};

/// Size of one FIFO record in bytes.
pub const RECORD_SIZE: usize = 16;

/// Header byte marking an accel + gyro packet.
pub const PACKET3_HEADER: u8 = 0x68;

/// One synthetic sensor sample as stored in the FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleRecord {
    pub header: u8,
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
    pub temperature: i8,
    pub timestamp: u16,
}

impl SampleRecord {
    /// Build a packet 3 record.
    pub fn new(accel: [i16; 3], gyro: [i16; 3], temperature: i8, timestamp: u16) -> Self {
        Self {
            header: PACKET3_HEADER,
            accel,
            gyro,
            temperature,
            timestamp,
        }
    }

    /// Serialize to the FIFO wire layout.
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0] = self.header;
        LittleEndian::write_i16_into(&self.accel, &mut buf[1..7]);
        LittleEndian::write_i16_into(&self.gyro, &mut buf[7..13]);
        buf[13] = self.temperature as u8;
        LittleEndian::write_u16(&mut buf[14..16], self.timestamp);
        buf
    }

    /// Decode a record from FIFO bytes. Returns `None` if fewer than
    /// [`RECORD_SIZE`] bytes are given.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < RECORD_SIZE {
            return None;
        }
        let mut accel = [0i16; 3];
        let mut gyro = [0i16; 3];
        LittleEndian::read_i16_into(&bytes[1..7], &mut accel);
        LittleEndian::read_i16_into(&bytes[7..13], &mut gyro);
        Some(Self {
            header: bytes[0],
            accel,
            gyro,
            temperature: bytes[13] as i8,
            timestamp: LittleEndian::read_u16(&bytes[14..16]),
        })
    }

    /// Whether the header marks a packet 3 record.
    #[inline]
    pub fn is_packet3(&self) -> bool {
        self.header == PACKET3_HEADER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_layout() {
        let rec = SampleRecord::new([1, -1, 0x1234], [-32768, 32767, 0], 44, 0xBEEF);
        let bytes = rec.to_bytes();

        assert_eq!(bytes[0], 0x68);
        assert_eq!(&bytes[1..3], &[0x01, 0x00]);
        assert_eq!(&bytes[3..5], &[0xFF, 0xFF]);
        assert_eq!(&bytes[5..7], &[0x34, 0x12]);
        assert_eq!(&bytes[7..9], &[0x00, 0x80]);
        assert_eq!(&bytes[9..11], &[0xFF, 0x7F]);
        assert_eq!(bytes[13], 44);
        assert_eq!(&bytes[14..16], &[0xEF, 0xBE]);

        assert_eq!(SampleRecord::parse(&bytes), Some(rec));
    }

    #[test]
    fn test_parse_short_buffer() {
        assert_eq!(SampleRecord::parse(&[0x68; 15]), None);
    }
}
