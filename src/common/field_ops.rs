//! Fixed-position field access on CAN payloads.
//!
//! Bit numbering follows the Intel (little-endian) convention used by the
//! protocol: bit `n` lives in byte `n / 8` at position `n % 8`. Reads past the
//! end of the payload yield zero so that a short frame can never produce a
//! spurious non-zero field.

const BITS_PER_BYTE: usize = 8;

pub fn read_u8_at(data: &[u8], offset: usize) -> u8 {
    data.get(offset).copied().unwrap_or(0)
}

pub fn read_bit_at(data: &[u8], bit: usize) -> bool {
    (read_u8_at(data, bit / BITS_PER_BYTE) >> (bit % BITS_PER_BYTE)) & 0x01 != 0
}

pub fn read_le_u16_at(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([read_u8_at(data, offset), read_u8_at(data, offset + 1)])
}

/// Low nibble of the byte at `offset`
pub fn read_low_nibble_at(data: &[u8], offset: usize) -> u8 {
    read_u8_at(data, offset) & 0x0F
}

pub fn write_u8_at(data: &mut [u8], offset: usize, value: u8) {
    if let Some(byte) = data.get_mut(offset) {
        *byte = value;
    }
}

pub fn write_bit_at(data: &mut [u8], bit: usize, value: bool) {
    if let Some(byte) = data.get_mut(bit / BITS_PER_BYTE) {
        let mask = 1 << (bit % BITS_PER_BYTE);
        if value {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }
}

pub fn write_le_u16_at(data: &mut [u8], offset: usize, value: u16) {
    let [lo, hi] = value.to_le_bytes();
    write_u8_at(data, offset, lo);
    write_u8_at(data, offset + 1, hi);
}

/// Write counter value into the low nibble, preserving the high nibble
pub fn write_low_nibble_at(data: &mut [u8], offset: usize, value: u8) {
    if let Some(byte) = data.get_mut(offset) {
        *byte = (*byte & 0xF0) | (value & 0x0F);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_numbering_is_intel() {
        let data = [0x00, 0x40, 0x00, 0x00, 0x80];
        assert!(read_bit_at(&data, 14));
        assert!(read_bit_at(&data, 39));
        assert!(!read_bit_at(&data, 13));
        assert!(!read_bit_at(&data, 15));
    }

    #[test]
    fn test_out_of_range_reads_are_zero() {
        let data = [0xFF; 4];
        assert_eq!(read_u8_at(&data, 4), 0);
        assert!(!read_bit_at(&data, 32));
        assert_eq!(read_le_u16_at(&data, 3), 0x00FF);
    }

    #[test]
    fn test_write_then_read() {
        let mut data = [0u8; 16];
        write_le_u16_at(&mut data, 8, 0xBEEF);
        assert_eq!(data[8], 0xEF);
        assert_eq!(data[9], 0xBE);
        assert_eq!(read_le_u16_at(&data, 8), 0xBEEF);

        write_bit_at(&mut data, 35, true);
        assert_eq!(data[4], 0x08);
        write_bit_at(&mut data, 35, false);
        assert_eq!(data[4], 0x00);

        data[1] = 0xA0;
        write_low_nibble_at(&mut data, 1, 0x1F);
        assert_eq!(data[1], 0xAF);
        assert_eq!(read_low_nibble_at(&data, 1), 0x0F);
    }
}
