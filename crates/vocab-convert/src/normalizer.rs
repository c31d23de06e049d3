use crate::byte_map::ByteRemapEntry;
use crate::charsmap::{compile_chars_map, CharsMap};
use crate::errors::Result;
use crate::proto::NormalizerSpec;

pub const NORMALIZER_NAME: &str = "byte_level_remap";
pub const DENORMALIZER_NAME: &str = "byte_level_restore";

/// `[raw] -> [mapped]` for every remapped byte.
pub fn forward_chars_map(table: &[ByteRemapEntry]) -> CharsMap {
    table
        .iter()
        .map(|entry| (vec![u32::from(entry.raw)], vec![entry.mapped]))
        .collect()
}

/// `[mapped] -> [raw]`, undoing [`forward_chars_map`].
pub fn inverse_chars_map(table: &[ByteRemapEntry]) -> CharsMap {
    table
        .iter()
        .map(|entry| (vec![entry.mapped], vec![u32::from(entry.raw)]))
        .collect()
}

pub fn build_normalizer_spec(table: &[ByteRemapEntry]) -> Result<NormalizerSpec> {
    byte_level_spec(NORMALIZER_NAME, &forward_chars_map(table))
}

pub fn build_denormalizer_spec(table: &[ByteRemapEntry]) -> Result<NormalizerSpec> {
    byte_level_spec(DENORMALIZER_NAME, &inverse_chars_map(table))
}

// The runtime must see exactly the remapped text: no dummy prefix, no
// whitespace folding, no whitespace escaping.
fn byte_level_spec(name: &str, map: &CharsMap) -> Result<NormalizerSpec> {
    let charsmap = compile_chars_map(map)?;
    log::debug!("compiled {name} charsmap: {} entries, {} bytes", map.len(), charsmap.len());

    Ok(NormalizerSpec {
        name: Some(name.to_owned()),
        precompiled_charsmap: Some(charsmap),
        add_dummy_prefix: Some(false),
        remove_extra_whitespaces: Some(false),
        escape_whitespaces: Some(false),
    })
}
