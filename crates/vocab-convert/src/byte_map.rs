//! GPT-2 style byte-to-codepoint remapping.
//!
//! Bytes that render unambiguously (printable ASCII and most of Latin-1) stand
//! for themselves. Every other byte in `1..=255` is assigned a stable
//! substitute codepoint above `U+0100`, in ascending byte order, so that any
//! byte string can be carried as text and recovered exactly.

/// Inclusive byte ranges that pass through unchanged.
pub const PRINTABLE_RANGES: [(u8, u8); 3] = [(33, 126), (161, 172), (174, 255)];

/// First substitute codepoint is `REMAP_BASE + 1`.
pub const REMAP_BASE: u32 = 256;

/// Number of bytes in `1..=255` that are not printable.
pub const REMAP_LEN: usize = 67;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRemapEntry {
    pub raw: u8,
    pub mapped: u32,
}

pub fn is_printable(byte: u8) -> bool {
    PRINTABLE_RANGES
        .iter()
        .any(|&(lo, hi)| (lo..=hi).contains(&byte))
}

/// Builds the remap table. Byte 0 is never mapped: the compiled charsmap
/// cannot hold a NUL key.
pub fn byte_remap_table() -> Vec<ByteRemapEntry> {
    let mut table = Vec::with_capacity(REMAP_LEN);
    let mut n = 1;
    for raw in 1..=u8::MAX {
        if is_printable(raw) {
            continue;
        }
        table.push(ByteRemapEntry {
            raw,
            mapped: REMAP_BASE + n,
        });
        n += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn table_covers_every_non_printable_byte_once() {
        let table = byte_remap_table();
        assert_eq!(table.len(), REMAP_LEN);

        let raws: HashSet<u8> = table.iter().map(|e| e.raw).collect();
        assert_eq!(raws.len(), table.len());
        for byte in 1..=u8::MAX {
            assert_eq!(raws.contains(&byte), !is_printable(byte), "byte {byte}");
        }
        assert!(!raws.contains(&0));
    }

    #[test]
    fn mapped_codepoints_start_at_257_and_increase() {
        let table = byte_remap_table();
        assert_eq!(table[0], ByteRemapEntry { raw: 1, mapped: 257 });
        for pair in table.windows(2) {
            assert!(pair[0].raw < pair[1].raw);
            assert_eq!(pair[1].mapped, pair[0].mapped + 1);
        }
        assert_eq!(table.last().map(|e| (e.raw, e.mapped)), Some((173, 323)));
    }

    #[test]
    fn printable_edges() {
        for byte in [33u8, 126, 161, 172, 174, 255] {
            assert!(is_printable(byte));
        }
        for byte in [0u8, 1, 32, 127, 160, 173] {
            assert!(!is_printable(byte));
        }
    }

    #[test]
    fn table_is_deterministic() {
        assert_eq!(byte_remap_table(), byte_remap_table());
    }
}
