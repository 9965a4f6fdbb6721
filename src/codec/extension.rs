/// Trailing (size, value) section of the flag-based format
use crate::codec::cursor::BitCursor;

const SIZE_BITS: u32 = 5;

/// Read self-describing values until the payload runs out.
///
/// Each value is preceded by a 5-bit size holding its width minus one.
/// Fewer than 5 bits left, or a value wider than what is left, is byte
/// padding and ends the section.
pub fn decode_values(cursor: &mut BitCursor) -> Vec<u32> {
    let mut values = Vec::new();

    while cursor.remaining_bits() >= SIZE_BITS as usize {
        let Ok(size) = cursor.read_uint(SIZE_BITS) else {
            break;
        };
        match cursor.read_uint(size + 1) {
            Ok(value) => values.push(value),
            Err(_) => break,
        }
    }

    values
}

/// Comma-joined decimal rendering stored with the record.
pub fn render(values: &[u32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pair() {
        // 7 leading bits, then size=3 (4-bit value) and value=0b1011
        let data = [0b0000_0000, 0b0011_1011];
        let mut cursor = BitCursor::new(&data);
        cursor.skip(7).unwrap();
        let values = decode_values(&mut cursor);
        assert_eq!(values, vec![11]);
        assert_eq!(render(&values), "11");
        assert_eq!(cursor.remaining_bits(), 0);
    }

    #[test]
    fn test_short_tail_is_empty() {
        let data = [0xF0];
        let mut cursor = BitCursor::new(&data);
        cursor.read_uint(4).unwrap();
        assert!(decode_values(&mut cursor).is_empty());
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn test_oversized_value_stops() {
        // size=31 declares a 32-bit value, only 3 bits follow
        let data = [0b11111_000];
        let mut cursor = BitCursor::new(&data);
        assert!(decode_values(&mut cursor).is_empty());
        assert_eq!(cursor.bit_position(), 5);
    }

    #[test]
    fn test_multiple_values() {
        // size=0 value=1 | size=7 value=200 | size=3 value=2 | 4 padding bits
        let data = [0b0000_0100, 0b1111_1001, 0b0000_0011, 0b0010_0000];
        let mut cursor = BitCursor::new(&data);
        let values = decode_values(&mut cursor);
        assert_eq!(values, vec![1, 200, 2]);
        assert_eq!(render(&values), "1,200,2");
    }
}
