use crate::errors::{Error, Result};
use crate::proto::{ModelProto, ModelType, NormalizerSpec, SentencePiece, TrainerSpec};
use prost::Message;

pub fn build_trainer_spec(pieces: &[SentencePiece]) -> Result<TrainerSpec> {
    let vocab_size = i32::try_from(pieces.len()).map_err(|_| {
        Error::Data(format!(
            "{} pieces exceed the model's vocab_size range",
            pieces.len()
        ))
    })?;

    let mut spec = TrainerSpec {
        model_type: None,
        vocab_size: Some(vocab_size),
    };
    spec.set_model_type(ModelType::Bpe);
    Ok(spec)
}

pub fn assemble_model(
    normalizer: NormalizerSpec,
    denormalizer: NormalizerSpec,
    pieces: Vec<SentencePiece>,
) -> Result<ModelProto> {
    let trainer_spec = build_trainer_spec(&pieces)?;
    Ok(ModelProto {
        pieces,
        trainer_spec: Some(trainer_spec),
        normalizer_spec: Some(normalizer),
        denormalizer_spec: Some(denormalizer),
    })
}

pub fn encode_model(model: &ModelProto) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(model.encoded_len());
    model.encode(&mut buffer)?;
    Ok(buffer)
}

pub fn decode_model(bytes: &[u8]) -> Result<ModelProto> {
    ModelProto::decode(bytes).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::PieceType;

    fn piece(text: &str) -> SentencePiece {
        let mut piece = SentencePiece {
            piece: Some(text.into()),
            score: Some(0.0),
            r#type: None,
        };
        piece.set_type(PieceType::Normal);
        piece
    }

    #[test]
    fn trainer_spec_counts_pieces() {
        let spec = build_trainer_spec(&[piece("a"), piece("b")]).unwrap();
        assert_eq!(spec.model_type(), ModelType::Bpe);
        assert_eq!(spec.vocab_size, Some(2));
    }

    #[test]
    fn model_survives_encode_decode() {
        let model = assemble_model(
            NormalizerSpec::default(),
            NormalizerSpec::default(),
            vec![piece("hello"), piece("world")],
        )
        .unwrap();
        let decoded = decode_model(&encode_model(&model).unwrap()).unwrap();
        assert_eq!(decoded, model);
        assert_eq!(decoded.trainer_spec.and_then(|t| t.vocab_size), Some(2));
    }

    #[test]
    fn garbage_does_not_decode() {
        assert!(decode_model(&[0xff, 0xff, 0xff]).is_err());
    }
}
