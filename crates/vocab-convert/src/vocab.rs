//! Vocabulary assembly.
//!
//! Hugging Face BPE vocabularies carry no scores, so the rank implied by each
//! token's index stands in for likelihood: the piece at rank `i` scores `-i`.

use crate::errors::{Error, Result};
use crate::proto::{PieceType, SentencePiece};
use crate::types::AddedTokenDoc;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct AssembledVocab {
    pub pieces: Vec<SentencePiece>,
    pub vocab_entries: usize,
    pub added_emitted: usize,
    pub added_skipped: usize,
    pub has_unknown: bool,
}

pub fn assemble_pieces(
    vocab: &HashMap<String, u32>,
    unk_token: &str,
    added_tokens: &[AddedTokenDoc],
) -> Result<AssembledVocab> {
    let ordered = ordered_vocab(vocab)?;
    let mut assembled = AssembledVocab {
        pieces: Vec::with_capacity(ordered.len() + added_tokens.len()),
        vocab_entries: ordered.len(),
        ..AssembledVocab::default()
    };

    for (rank, text) in ordered.iter().enumerate() {
        let kind = if *text == unk_token {
            assembled.has_unknown = true;
            PieceType::Unknown
        } else {
            PieceType::Normal
        };
        assembled.pieces.push(scored_piece(text, kind, rank));
    }

    if !assembled.has_unknown {
        log::warn!("unk_token {unk_token:?} is not in the vocabulary; no piece is marked UNKNOWN");
    }

    let known: HashSet<&str> = ordered.iter().copied().collect();
    for token in added_tokens {
        if !token.normalized {
            log::debug!("skipping unnormalized added token {:?}", token.content);
            assembled.added_skipped += 1;
            continue;
        }
        if known.contains(token.content.as_str()) {
            log::warn!(
                "added token {:?} duplicates a vocabulary entry",
                token.content
            );
        }
        let rank = assembled.pieces.len();
        assembled
            .pieces
            .push(scored_piece(&token.content, PieceType::UserDefined, rank));
        assembled.added_emitted += 1;
    }

    Ok(assembled)
}

/// Places every token at its index. Indices must cover `0..len` exactly once.
fn ordered_vocab(vocab: &HashMap<String, u32>) -> Result<Vec<&str>> {
    let len = vocab.len();
    let mut slots: Vec<Option<&str>> = vec![None; len];

    for (token, &id) in vocab {
        let index = id as usize;
        let slot = slots.get_mut(index).ok_or_else(|| {
            Error::Data(format!(
                "token {token:?} has index {id}, outside 0..{len}"
            ))
        })?;
        if let Some(previous) = slot.replace(token) {
            return Err(Error::Data(format!(
                "tokens {previous:?} and {token:?} share index {id}"
            )));
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| Error::Data(format!("no token has index {index}")))
        })
        .collect()
}

fn scored_piece(text: &str, kind: PieceType, rank: usize) -> SentencePiece {
    let mut piece = SentencePiece {
        piece: Some(text.to_owned()),
        score: Some(-(rank as i64) as f32),
        r#type: None,
    };
    piece.set_type(kind);
    piece
}
