//! Precompiled character maps.
//!
//! A charsmap blob is a little-endian `u32` trie size, the double-array trie
//! units, then the NUL-terminated UTF-8 replacement strings. Trie values are
//! byte offsets into the replacement section.

mod darts;

use crate::errors::{compile_error, Result};
use std::collections::BTreeMap;

/// Codepoint sequence to codepoint sequence.
pub type CharsMap = BTreeMap<Vec<u32>, Vec<u32>>;

/// Upper bound on keys sharing a common prefix chain at runtime.
pub const MAX_TRIE_RESULTS: usize = 32;

pub fn compile_chars_map(map: &CharsMap) -> Result<Vec<u8>> {
    if map.is_empty() {
        return Err(compile_error("cannot compile an empty charsmap"));
    }

    // Keys with the same target share one replacement string.
    let mut positions: BTreeMap<&[u32], u32> = map
        .values()
        .map(|target| (target.as_slice(), 0))
        .collect();
    let mut normalized = Vec::new();
    for (target, position) in positions.iter_mut() {
        *position = u32::try_from(normalized.len())
            .map_err(|_| compile_error("replacement section exceeds 4 GiB"))?;
        normalized.extend_from_slice(codepoints_to_utf8(target)?.as_bytes());
        normalized.push(0);
    }

    let mut entries = Vec::with_capacity(map.len());
    for (source, target) in map {
        let key = codepoints_to_utf8(source)?;
        if key.is_empty() {
            return Err(compile_error("charsmap keys must not be empty"));
        }
        entries.push((key.into_bytes(), positions[target.as_slice()]));
    }
    entries.sort();

    let units = darts::build(&entries)?;

    let max_prefixes = entries
        .iter()
        .map(|(key, _)| darts::common_prefix_search(&units, key).len())
        .max()
        .unwrap_or(0);
    if max_prefixes >= MAX_TRIE_RESULTS {
        return Err(compile_error(format!(
            "a key has {max_prefixes} shared prefixes; the limit is {}",
            MAX_TRIE_RESULTS - 1
        )));
    }

    encode_blob(&units, &normalized)
}

fn codepoints_to_utf8(codepoints: &[u32]) -> Result<String> {
    codepoints
        .iter()
        .map(|&cp| match char::from_u32(cp) {
            Some('\0') => Err(compile_error("U+0000 cannot appear in a charsmap")),
            Some(ch) => Ok(ch),
            None => Err(compile_error(format!("{cp:#x} is not a Unicode scalar value"))),
        })
        .collect()
}

fn encode_blob(units: &[u32], normalized: &[u8]) -> Result<Vec<u8>> {
    let trie_len = units.len() * 4;
    let header = u32::try_from(trie_len).map_err(|_| compile_error("trie exceeds 4 GiB"))?;

    let mut blob = Vec::with_capacity(4 + trie_len + normalized.len());
    blob.extend_from_slice(&header.to_le_bytes());
    for unit in units {
        blob.extend_from_slice(&unit.to_le_bytes());
    }
    blob.extend_from_slice(normalized);
    Ok(blob)
}
