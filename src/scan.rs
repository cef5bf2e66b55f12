//! Word-at-a-time byte scanning primitives.
//!
//! Both entry points are semantically equivalent to a byte-by-byte loop
//! but test eight positions per iteration using the classical zero-byte
//! detection trick: for a word `w`, `(w - 0x0101..01) & !w & 0x8080..80`
//! is non-zero iff some byte of `w` is zero. XORing the haystack word
//! with a broadcast of the target byte turns "find byte" into "find
//! zero byte". The trick is a containment test only (borrow propagation
//! can set spurious high bits above the lowest hit), so the exact
//! position is always resolved with a scalar pass over the hit word.
//!
//! No heap allocation, no reads past the slice, endianness-agnostic.

const LO_ONES: u64 = 0x0101_0101_0101_0101;
const HI_BITS: u64 = 0x8080_8080_8080_8080;

const WORD: usize = std::mem::size_of::<u64>();

/// True iff `w` contains at least one zero byte.
#[inline(always)]
const fn has_zero_byte(w: u64) -> bool {
    w.wrapping_sub(LO_ONES) & !w & HI_BITS != 0
}

/// Loads an 8-byte chunk as a native-endian word.
#[inline(always)]
fn load_word(chunk: &[u8]) -> u64 {
    // chunks_exact(WORD) guarantees exactly 8 bytes here
    u64::from_ne_bytes(chunk.try_into().expect("8-byte chunk"))
}

/// Returns the index of the first occurrence of `target` in `haystack`.
///
/// The unaligned head (up to the first 8-byte boundary of the backing
/// allocation) and the trailing remainder are scanned byte-by-byte; the
/// aligned middle is scanned a word at a time.
#[must_use]
pub fn index_byte(haystack: &[u8], target: u8) -> Option<usize> {
    let head = haystack
        .as_ptr()
        .align_offset(WORD)
        .min(haystack.len());

    if let Some(pos) = haystack[..head].iter().position(|&b| b == target) {
        return Some(pos);
    }

    let broadcast = u64::from(target) * LO_ONES;
    let mut offset = head;
    let mut chunks = haystack[head..].chunks_exact(WORD);
    for chunk in &mut chunks {
        if has_zero_byte(load_word(chunk) ^ broadcast) {
            // Resolve the exact position within the hit word.
            for (i, &b) in chunk.iter().enumerate() {
                if b == target {
                    return Some(offset + i);
                }
            }
        }
        offset += WORD;
    }

    chunks
        .remainder()
        .iter()
        .position(|&b| b == target)
        .map(|pos| offset + pos)
}

/// Counts the newline bytes (`\n`) in `buf`.
///
/// Words with no newline are skipped in one test; words with at least
/// one hit are counted byte-by-byte, so the result is exact.
#[must_use]
pub fn count_lines(buf: &[u8]) -> usize {
    let head = buf.as_ptr().align_offset(WORD).min(buf.len());

    let mut count = buf[..head].iter().filter(|&&b| b == b'\n').count();

    let broadcast = u64::from(b'\n') * LO_ONES;
    let mut chunks = buf[head..].chunks_exact(WORD);
    for chunk in &mut chunks {
        if has_zero_byte(load_word(chunk) ^ broadcast) {
            count += chunk.iter().filter(|&&b| b == b'\n').count();
        }
    }

    count + chunks.remainder().iter().filter(|&&b| b == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_index(haystack: &[u8], target: u8) -> Option<usize> {
        haystack.iter().position(|&b| b == target)
    }

    #[test]
    fn test_index_byte_empty() {
        assert_eq!(index_byte(b"", b'x'), None);
    }

    #[test]
    fn test_index_byte_basic() {
        assert_eq!(index_byte(b"hello world", b'w'), Some(6));
        assert_eq!(index_byte(b"hello world", b'h'), Some(0));
        assert_eq!(index_byte(b"hello world", b'd'), Some(10));
        assert_eq!(index_byte(b"hello world", b'z'), None);
    }

    #[test]
    fn test_index_byte_matches_naive_at_all_offsets() {
        // Sub-slicing shifts alignment, exercising every head length.
        let data: Vec<u8> = (0u16..257).map(|i| (i % 251) as u8).collect();
        for start in 0..16 {
            for target in [0u8, 1, 127, 128, 250, 255] {
                let slice = &data[start..];
                assert_eq!(
                    index_byte(slice, target),
                    naive_index(slice, target),
                    "start={start} target={target}"
                );
            }
        }
    }

    #[test]
    fn test_index_byte_high_bit_no_false_positive() {
        // 0x80 bytes are the classic false-positive bait for the SWAR trick.
        let buf = [0x80u8; 64];
        assert_eq!(index_byte(&buf, 0x7f), None);
        assert_eq!(index_byte(&buf, 0x80), Some(0));
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(b""), 0);
        assert_eq!(count_lines(b"no newline"), 0);
        assert_eq!(count_lines(b"a\nb\nc\n"), 3);
        assert_eq!(count_lines(b"\n\n\n\n\n\n\n\n\n"), 9);
    }

    #[test]
    fn test_count_lines_matches_naive() {
        let mut data = Vec::new();
        for i in 0..512u32 {
            data.push(if i % 7 == 0 { b'\n' } else { (i % 256) as u8 });
        }
        for start in 0..9 {
            let slice = &data[start..];
            let naive = slice.iter().filter(|&&b| b == b'\n').count();
            assert_eq!(count_lines(slice), naive, "start={start}");
        }
    }
}
