//! Nibble-addressed field access.
//!
//! Record fields are described as half-open nibble ranges `[start, end)`,
//! nibble 0 being the high half of byte 0. Values are read
//! most-significant-nibble first, so a range is just a big-endian number
//! that does not have to start or end on a byte boundary.
//!
//! Nibbles past the end of the buffer read as zero and are ignored on
//! write; trailing optional fields decode as 0 on short records.

/// Widest field that fits the return type.
pub const MAX_NIBBLES: usize = 16;

#[inline]
fn nibble_at(buf: &[u8], n: usize) -> u8 {
    match buf.get(n / 2) {
        Some(&b) if n % 2 == 0 => b >> 4,
        Some(&b) => b & 0x0F,
        None => 0,
    }
}

/// Read the nibble range `[start, end)` as an unsigned integer.
pub fn get(buf: &[u8], start: usize, end: usize) -> u64 {
    debug_assert!(end >= start && end - start <= MAX_NIBBLES);
    if end <= start {
        return 0;
    }

    if start % 2 == 0 && end % 2 == 0 && end / 2 <= buf.len() {
        return buf[start / 2..end / 2]
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
    }

    (start..end).fold(0u64, |acc, n| (acc << 4) | u64::from(nibble_at(buf, n)))
}

/// Write `value` into the nibble range `[start, end)`, leaving every other
/// bit of `buf` untouched. Excess high bits of `value` are discarded.
pub fn set(buf: &mut [u8], start: usize, end: usize, value: u64) {
    debug_assert!(end >= start && end - start <= MAX_NIBBLES);
    let mut v = value;
    for n in (start..end).rev() {
        let nib = (v & 0x0F) as u8;
        v >>= 4;
        let Some(byte) = buf.get_mut(n / 2) else {
            continue;
        };
        if n % 2 == 0 {
            *byte = (*byte & 0x0F) | (nib << 4);
        } else {
            *byte = (*byte & 0xF0) | nib;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_aligned_fast_path() {
        let buf = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(get(&buf, 0, 4), 0x1234);
        assert_eq!(get(&buf, 2, 8), 0x345678);
    }

    #[test]
    fn test_unaligned_span() {
        let buf = [0x12, 0x34, 0x56];
        assert_eq!(get(&buf, 1, 4), 0x234);
        assert_eq!(get(&buf, 3, 4), 0x4);
        assert_eq!(get(&buf, 0, 1), 0x1);
    }

    #[test]
    fn test_out_of_range_reads_zero() {
        let buf = [0xAB];
        assert_eq!(get(&buf, 2, 4), 0);
        // partially in range: 0xB then a missing nibble
        assert_eq!(get(&buf, 1, 3), 0xB0);
        // aligned but past the end still goes through the slow path
        assert_eq!(get(&buf, 0, 4), 0xAB00);
    }

    #[test]
    fn test_set_preserves_neighbours() {
        let mut buf = [0xFF, 0xFF, 0xFF];
        set(&mut buf, 1, 4, 0x000);
        assert_eq!(buf, [0xF0, 0x00, 0xFF]);

        set(&mut buf, 3, 5, 0xAB);
        assert_eq!(buf, [0xF0, 0x0A, 0xBF]);
    }

    #[test]
    fn test_set_truncates_wide_values() {
        let mut buf = [0x00, 0x00];
        set(&mut buf, 2, 3, 0x1F);
        assert_eq!(buf, [0x00, 0xF0]);
    }

    #[test]
    fn test_set_past_end_is_ignored() {
        let mut buf = [0x00];
        set(&mut buf, 1, 4, 0xABC);
        assert_eq!(buf, [0x0A]);
    }

    #[test]
    fn test_tileset_selector_split() {
        // tileset 2, object 0x045
        let buf = [0x20, 0x45];
        assert_eq!(get(&buf, 0, 1), 2);
        assert_eq!(get(&buf, 1, 4), 0x045);
    }
}
