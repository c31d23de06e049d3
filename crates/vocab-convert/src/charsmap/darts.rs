//! Double-array trie laid out in darts-clone units.
//!
//! Unit bits: `0..=7` label, `8` has-leaf, `9` offset extension, `10..=31`
//! offset. Leaf units carry the value in bits `0..=30` with bit 31 set, which
//! keeps their label from matching any input byte. The children of a node at
//! `id` live at `id ^ offset ^ label`; its leaf sits at `id ^ offset`.

use crate::errors::{compile_error, Result};
use std::collections::{BTreeMap, HashSet, VecDeque};

const LEAF_BIT: u32 = 1 << 31;
const HAS_LEAF_BIT: u32 = 1 << 8;
const EXTENSION_BIT: u32 = 1 << 9;
const OFFSET_LIMIT: u32 = 1 << 29;
const SHORT_OFFSET_LIMIT: u32 = 1 << 21;
const BLOCK_SIZE: usize = 256;

pub(crate) fn unit_label(unit: u32) -> u32 {
    unit & (LEAF_BIT | 0xFF)
}

pub(crate) fn unit_has_leaf(unit: u32) -> bool {
    unit & HAS_LEAF_BIT != 0
}

pub(crate) fn unit_value(unit: u32) -> u32 {
    unit & !LEAF_BIT
}

pub(crate) fn unit_offset(unit: u32) -> u32 {
    (unit >> 10) << ((unit & EXTENSION_BIT) >> 6)
}

fn encode_offset(offset: u32) -> Result<u32> {
    if offset >= OFFSET_LIMIT {
        return Err(compile_error(format!("trie offset {offset} is too large")));
    }
    if offset < SHORT_OFFSET_LIMIT {
        Ok(offset << 10)
    } else if offset & 0xFF == 0 {
        Ok((offset << 2) | EXTENSION_BIT)
    } else {
        Err(compile_error(format!(
            "trie offset {offset} cannot be encoded in a unit"
        )))
    }
}

#[derive(Default)]
struct TrieNode {
    children: BTreeMap<u8, TrieNode>,
    value: Option<u32>,
}

/// Builds the unit array for `entries`. Keys must be non-empty, free of NUL
/// bytes and unique; values must fit in 31 bits.
pub(crate) fn build(entries: &[(Vec<u8>, u32)]) -> Result<Vec<u32>> {
    let mut root = TrieNode::default();
    for (key, value) in entries {
        if key.is_empty() {
            return Err(compile_error("empty key"));
        }
        if key.contains(&0) {
            return Err(compile_error(format!("key {key:?} contains a NUL byte")));
        }
        if *value & LEAF_BIT != 0 {
            return Err(compile_error(format!("value {value} does not fit in 31 bits")));
        }

        let mut node = &mut root;
        for &byte in key {
            node = node.children.entry(byte).or_default();
        }
        if node.value.replace(*value).is_some() {
            return Err(compile_error(format!("duplicate key {key:?}")));
        }
    }

    Layout::default().place(&root)
}

#[derive(Default)]
struct Layout {
    units: Vec<u32>,
    used: Vec<bool>,
    used_bases: HashSet<usize>,
}

impl Layout {
    fn place(mut self, root: &TrieNode) -> Result<Vec<u32>> {
        self.reserve(0);
        let mut queue = VecDeque::from([(0usize, root)]);

        while let Some((index, node)) = queue.pop_front() {
            let mut labels = Vec::with_capacity(node.children.len() + 1);
            if node.value.is_some() {
                labels.push(0u8);
            }
            labels.extend(node.children.keys().copied());
            if labels.is_empty() {
                continue;
            }

            let base = self.find_base(&labels);
            self.used_bases.insert(base);
            let offset = u32::try_from(index ^ base)
                .map_err(|_| compile_error("trie grew beyond 32-bit offsets"))?;
            self.units[index] |= encode_offset(offset)?;

            if let Some(value) = node.value {
                self.units[index] |= HAS_LEAF_BIT;
                self.reserve(base);
                self.units[base] = value | LEAF_BIT;
            }

            for (&label, child) in &node.children {
                let child_index = base ^ usize::from(label);
                self.reserve(child_index);
                self.units[child_index] = u32::from(label);
                queue.push_back((child_index, child));
            }
        }

        Ok(self.units)
    }

    /// Lowest base whose slots for every label are free. Bases are never
    /// shared, so a unit found at `base ^ label` always belongs to the node
    /// that owns `base`.
    fn find_base(&self, labels: &[u8]) -> usize {
        let first = usize::from(labels[0]);
        let mut index = 1;
        loop {
            if !self.is_used(index) {
                let base = index ^ first;
                if !self.used_bases.contains(&base)
                    && labels
                        .iter()
                        .all(|&label| !self.is_used(base ^ usize::from(label)))
                {
                    return base;
                }
            }
            index += 1;
        }
    }

    fn is_used(&self, index: usize) -> bool {
        self.used.get(index).copied().unwrap_or(false)
    }

    fn reserve(&mut self, index: usize) {
        if index >= self.units.len() {
            let len = (index / BLOCK_SIZE + 1) * BLOCK_SIZE;
            self.units.resize(len, 0);
            self.used.resize(len, false);
        }
        self.used[index] = true;
    }
}

/// Returns `(value, prefix_len)` for every key that is a prefix of `key`,
/// shortest first.
pub(crate) fn common_prefix_search(units: &[u32], key: &[u8]) -> Vec<(u32, usize)> {
    let mut results = Vec::new();
    let Some(&root) = units.first() else {
        return results;
    };

    let mut pos = unit_offset(root) as usize;
    for (i, &byte) in key.iter().enumerate() {
        pos ^= usize::from(byte);
        let Some(&unit) = units.get(pos) else {
            break;
        };
        if unit_label(unit) != u32::from(byte) {
            break;
        }
        pos ^= unit_offset(unit) as usize;
        if unit_has_leaf(unit) {
            match units.get(pos) {
                Some(&leaf) => results.push((unit_value(leaf), i + 1)),
                None => break,
            }
        }
    }

    results
}
