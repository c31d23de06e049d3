use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `tokenizer_config.json`. Only the fields the conversion reads.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenizerConfigDoc {
    pub unk_token: TokenText,
}

/// A token as written in `tokenizer_config.json`: either bare text or a
/// serialized `AddedToken` object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TokenText {
    Plain(String),
    Added { content: String },
}

impl TokenText {
    pub fn as_str(&self) -> &str {
        match self {
            TokenText::Plain(text) => text,
            TokenText::Added { content } => content,
        }
    }
}

/// `tokenizer.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenizerDoc {
    pub model: ModelSection,
    pub added_tokens: Vec<AddedTokenDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSection {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub vocab: HashMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddedTokenDoc {
    pub content: String,
    pub normalized: bool,
}

#[derive(Debug, Clone)]
pub struct HfDocuments {
    pub config: TokenizerConfigDoc,
    pub tokenizer: TokenizerDoc,
}

impl HfDocuments {
    pub fn unk_token(&self) -> &str {
        self.config.unk_token.as_str()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub input_hash: String,
    pub created_at: String,
    pub piece_count: usize,
    pub model_bytes: usize,
}

/// What a conversion produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub vocab_entries: usize,
    pub added_emitted: usize,
    pub added_skipped: usize,
    pub piece_count: usize,
    pub has_unknown: bool,
    pub model_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unk_token_accepts_both_encodings() {
        let plain: TokenizerConfigDoc =
            serde_json::from_value(json!({ "unk_token": "<unk>" })).unwrap();
        assert_eq!(plain.unk_token.as_str(), "<unk>");

        let added: TokenizerConfigDoc = serde_json::from_value(json!({
            "unk_token": {
                "__type": "AddedToken",
                "content": "<|endoftext|>",
                "lstrip": false,
                "normalized": true
            }
        }))
        .unwrap();
        assert_eq!(added.unk_token.as_str(), "<|endoftext|>");
    }

    #[test]
    fn unk_token_must_be_present_and_non_null() {
        assert!(serde_json::from_value::<TokenizerConfigDoc>(json!({})).is_err());
        assert!(serde_json::from_value::<TokenizerConfigDoc>(json!({ "unk_token": null })).is_err());
        assert!(serde_json::from_value::<TokenizerConfigDoc>(json!({ "unk_token": 3 })).is_err());
    }

    #[test]
    fn tokenizer_doc_ignores_unrelated_fields() {
        let doc: TokenizerDoc = serde_json::from_value(json!({
            "version": "1.0",
            "model": { "type": "BPE", "vocab": { "a": 0 }, "merges": [] },
            "added_tokens": [{ "id": 1, "content": "<s>", "normalized": false, "special": true }],
            "pre_tokenizer": null
        }))
        .unwrap();
        assert_eq!(doc.model.kind.as_deref(), Some("BPE"));
        assert_eq!(doc.model.vocab.get("a"), Some(&0));
        assert_eq!(
            doc.added_tokens,
            vec![AddedTokenDoc {
                content: "<s>".into(),
                normalized: false
            }]
        );
    }

    #[test]
    fn negative_indices_are_rejected() {
        let result = serde_json::from_value::<TokenizerDoc>(json!({
            "model": { "vocab": { "a": -1 } },
            "added_tokens": []
        }));
        assert!(result.is_err());
    }
}
