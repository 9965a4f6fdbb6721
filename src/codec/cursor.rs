/// Sequential, most-significant-bit-first reader over a payload
use crate::codec::error::CursorError;

const MAX_WIDTH: u32 = 32;

/// Read-only bit cursor borrowing the payload bytes.
///
/// The offset only moves forward, and only by the exact width of a
/// successful read. A failed read leaves the cursor untouched.
#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BitCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        BitCursor { buf, pos: 0 }
    }

    /// Current bit offset from the start of the buffer.
    pub fn bit_position(&self) -> usize {
        self.pos
    }

    /// Bits left before the end of the buffer.
    pub fn remaining_bits(&self) -> usize {
        self.buf.len() * 8 - self.pos
    }

    /// Read `width` bits as an unsigned value. A width of 0 yields 0.
    pub fn read_uint(&mut self, width: u32) -> Result<u32, CursorError> {
        if width > MAX_WIDTH {
            return Err(CursorError::WidthTooLarge(width));
        }
        let remaining = self.remaining_bits();
        if width as usize > remaining {
            return Err(CursorError::Exhausted {
                requested: width,
                remaining,
            });
        }

        let mut value: u64 = 0;
        for i in 0..width as usize {
            let bit = self.pos + i;
            let byte = self.buf[bit / 8];
            value = (value << 1) | u64::from((byte >> (7 - bit % 8)) & 1);
        }
        self.pos += width as usize;

        Ok(value as u32)
    }

    /// Read `width` bits as a two's-complement value, sign-extended to 32 bits.
    pub fn read_int(&mut self, width: u32) -> Result<i32, CursorError> {
        let raw = self.read_uint(width)?;
        if width == 0 {
            return Ok(0);
        }
        let shift = MAX_WIDTH - width;
        Ok(((raw << shift) as i32) >> shift)
    }

    pub fn read_bool(&mut self) -> Result<bool, CursorError> {
        Ok(self.read_uint(1)? == 1)
    }

    /// Skip whole bits without interpreting them.
    pub fn skip(&mut self, width: u32) -> Result<(), CursorError> {
        let mut left = width;
        while left > 0 {
            let step = left.min(MAX_WIDTH);
            self.read_uint(step)?;
            left -= step;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_msb_first_across_bytes() {
        let data = [0b1010_1100, 0b0101_0011];
        let mut cursor = BitCursor::new(&data);

        assert_eq!(cursor.read_uint(3).unwrap(), 0b101);
        assert_eq!(cursor.read_uint(7).unwrap(), 0b0_1100_01);
        assert_eq!(cursor.bit_position(), 10);
        assert_eq!(cursor.remaining_bits(), 6);
        assert_eq!(cursor.read_uint(6).unwrap(), 0b01_0011);
        assert_eq!(cursor.remaining_bits(), 0);
    }

    #[test]
    fn test_signed_reads_sign_extend() {
        let data = [0xFF, 0xF0, 0x7F, 0xFF, 0xFF];
        let mut cursor = BitCursor::new(&data);

        assert_eq!(cursor.read_int(12).unwrap(), -1);
        assert_eq!(cursor.read_int(4).unwrap(), 0);
        assert_eq!(cursor.read_int(24).unwrap(), 0x7FFFFF);

        let mut cursor = BitCursor::new(&[0x80, 0x00, 0x00]);
        assert_eq!(cursor.read_int(24).unwrap(), -0x800000);

        let mut cursor = BitCursor::new(&[0x80]);
        assert_eq!(cursor.read_int(1).unwrap(), -1);
    }

    #[test]
    fn test_full_width_read() {
        let data = [0xDE, 0xAD, 0xBE, 0xEF];
        let mut cursor = BitCursor::new(&data);
        assert_eq!(cursor.read_uint(32).unwrap(), 0xDEAD_BEEF);

        let mut cursor = BitCursor::new(&data);
        assert_eq!(cursor.read_int(32).unwrap(), 0xDEAD_BEEFu32 as i32);
    }

    #[test]
    fn test_exhausted_read_does_not_advance() {
        let data = [0xAB];
        let mut cursor = BitCursor::new(&data);
        cursor.read_uint(5).unwrap();

        assert_eq!(
            cursor.read_uint(4),
            Err(CursorError::Exhausted {
                requested: 4,
                remaining: 3
            })
        );
        assert_eq!(cursor.bit_position(), 5);
        assert_eq!(cursor.read_uint(3).unwrap(), 0b011);
    }

    #[test]
    fn test_width_limits() {
        let data = [0u8; 8];
        let mut cursor = BitCursor::new(&data);

        assert_eq!(cursor.read_uint(33), Err(CursorError::WidthTooLarge(33)));
        assert_eq!(cursor.read_uint(0).unwrap(), 0);
        assert_eq!(cursor.read_int(0).unwrap(), 0);
        assert_eq!(cursor.bit_position(), 0);
    }

    #[test]
    fn test_bool_and_skip() {
        let data = [0b0100_0000, 0x01];
        let mut cursor = BitCursor::new(&data);

        assert!(!cursor.read_bool().unwrap());
        assert!(cursor.read_bool().unwrap());
        cursor.skip(13).unwrap();
        assert!(cursor.read_bool().unwrap());
        assert!(cursor.read_bool().is_err());
    }
}
