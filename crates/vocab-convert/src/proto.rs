//! Subset of the SentencePiece `ModelProto` schema (proto2).
//!
//! Only the fields this crate writes are declared. Field numbers follow
//! `sentencepiece_model.proto`, so artifacts load in any SentencePiece runtime,
//! and decoding a foreign model simply skips the fields listed here as absent.

use prost::Message;

#[derive(Clone, PartialEq, Message)]
pub struct ModelProto {
    #[prost(message, repeated, tag = "1")]
    pub pieces: Vec<model_proto::SentencePiece>,
    #[prost(message, optional, tag = "2")]
    pub trainer_spec: Option<TrainerSpec>,
    #[prost(message, optional, tag = "3")]
    pub normalizer_spec: Option<NormalizerSpec>,
    #[prost(message, optional, tag = "5")]
    pub denormalizer_spec: Option<NormalizerSpec>,
}

pub mod model_proto {
    use prost::Message;

    #[derive(Clone, PartialEq, Message)]
    pub struct SentencePiece {
        #[prost(string, optional, tag = "1")]
        pub piece: Option<String>,
        #[prost(float, optional, tag = "2")]
        pub score: Option<f32>,
        #[prost(enumeration = "sentence_piece::Type", optional, tag = "3", default = "Normal")]
        pub r#type: Option<i32>,
    }

    pub mod sentence_piece {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
        #[repr(i32)]
        pub enum Type {
            Normal = 1,
            Unknown = 2,
            Control = 3,
            UserDefined = 4,
            Unused = 5,
            Byte = 6,
        }
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct TrainerSpec {
    #[prost(enumeration = "trainer_spec::ModelType", optional, tag = "3", default = "Unigram")]
    pub model_type: Option<i32>,
    #[prost(int32, optional, tag = "4", default = "8000")]
    pub vocab_size: Option<i32>,
}

pub mod trainer_spec {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum ModelType {
        Unigram = 1,
        Bpe = 2,
        Word = 3,
        Char = 4,
    }
}

/// The three boolean flags default to `true` on the wire, so they must be
/// written explicitly to disable them.
#[derive(Clone, PartialEq, Message)]
pub struct NormalizerSpec {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub precompiled_charsmap: Option<Vec<u8>>,
    #[prost(bool, optional, tag = "3", default = "true")]
    pub add_dummy_prefix: Option<bool>,
    #[prost(bool, optional, tag = "4", default = "true")]
    pub remove_extra_whitespaces: Option<bool>,
    #[prost(bool, optional, tag = "5", default = "true")]
    pub escape_whitespaces: Option<bool>,
}

pub use model_proto::sentence_piece::Type as PieceType;
pub use model_proto::SentencePiece;
pub use trainer_spec::ModelType;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_flags_survive_the_wire() {
        let spec = NormalizerSpec {
            name: Some("identity".into()),
            precompiled_charsmap: Some(vec![1, 2, 3]),
            add_dummy_prefix: Some(false),
            remove_extra_whitespaces: Some(false),
            escape_whitespaces: Some(false),
        };
        let decoded = NormalizerSpec::decode(spec.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.add_dummy_prefix, Some(false));
        assert_eq!(decoded.remove_extra_whitespaces, Some(false));
        assert_eq!(decoded.escape_whitespaces, Some(false));
        assert!(!decoded.add_dummy_prefix());
    }

    #[test]
    fn unset_flags_fall_back_to_proto_defaults() {
        let decoded = NormalizerSpec::decode(&[][..]).unwrap();
        assert!(decoded.add_dummy_prefix());
        assert!(decoded.escape_whitespaces());
        assert_eq!(TrainerSpec::decode(&[][..]).unwrap().vocab_size(), 8000);
    }

    #[test]
    fn piece_type_accessors() {
        let mut piece = SentencePiece::default();
        assert_eq!(piece.r#type(), PieceType::Normal);
        piece.set_type(PieceType::UserDefined);
        assert_eq!(piece.r#type, Some(4));
    }
}
