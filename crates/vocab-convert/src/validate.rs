use crate::config::Config;
use crate::errors::{Error, Result};
use crate::proto::{ModelProto, ModelType, PieceType};
use std::path::Path;

pub fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.input.dir.as_os_str().is_empty() {
        return Err(Error::InvalidConfig("input.dir must not be empty".into()));
    }

    let model = cfg.output.model.as_path();
    if model.file_name().is_none() {
        return Err(Error::InvalidConfig(format!(
            "output.model '{}' does not name a file",
            model.display()
        )));
    }
    if model.is_dir() {
        return Err(Error::InvalidConfig(format!(
            "output.model '{}' is a directory",
            model.display()
        )));
    }
    ensure_directory_creatable(model)?;

    if let Some(manifest) = cfg.output.manifest.as_deref() {
        if manifest == model {
            return Err(Error::InvalidConfig(
                "output.manifest must differ from output.model".into(),
            ));
        }
        ensure_directory_creatable(manifest)?;
    }

    Ok(())
}

/// Checks the invariants every converted model must hold before it is
/// written.
pub fn validate_model(model: &ModelProto) -> Result<()> {
    let trainer = model
        .trainer_spec
        .as_ref()
        .ok_or_else(|| Error::Validation("model has no trainer_spec".into()))?;
    if trainer.model_type() != ModelType::Bpe {
        return Err(Error::Validation(format!(
            "trainer_spec.model_type is {:?}, expected Bpe",
            trainer.model_type()
        )));
    }
    if trainer.vocab_size != Some(model.pieces.len() as i32) {
        return Err(Error::Validation(format!(
            "trainer_spec.vocab_size {:?} does not match {} pieces",
            trainer.vocab_size,
            model.pieces.len()
        )));
    }

    if model.normalizer_spec.is_none() || model.denormalizer_spec.is_none() {
        return Err(Error::Validation(
            "model requires both normalizer and denormalizer specs".into(),
        ));
    }

    let unknown = model
        .pieces
        .iter()
        .filter(|piece| piece.r#type() == PieceType::Unknown)
        .count();
    if unknown > 1 {
        return Err(Error::Validation(format!(
            "{unknown} pieces are marked UNKNOWN, at most one is allowed"
        )));
    }

    for (rank, piece) in model.pieces.iter().enumerate() {
        let expected = -(rank as i64) as f32;
        if piece.score != Some(expected) {
            return Err(Error::Validation(format!(
                "piece {:?} at rank {rank} has score {:?}, expected {expected}",
                piece.piece(),
                piece.score
            )));
        }
    }

    Ok(())
}

// The first existing ancestor must be a directory, otherwise
// `create_dir_all` cannot succeed.
fn ensure_directory_creatable(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };

    for ancestor in parent.ancestors() {
        if ancestor.as_os_str().is_empty() {
            return Ok(());
        }
        if ancestor.is_dir() {
            return Ok(());
        }
        if ancestor.exists() {
            return Err(Error::InvalidConfig(format!(
                "'{}' exists but is not a directory",
                ancestor.display()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::assemble_model;
    use crate::proto::{NormalizerSpec, SentencePiece};
    use std::fs;

    fn piece(text: &str, kind: PieceType, score: f32) -> SentencePiece {
        let mut piece = SentencePiece {
            piece: Some(text.into()),
            score: Some(score),
            r#type: None,
        };
        piece.set_type(kind);
        piece
    }

    fn model(pieces: Vec<SentencePiece>) -> ModelProto {
        assemble_model(NormalizerSpec::default(), NormalizerSpec::default(), pieces).unwrap()
    }

    #[test]
    fn accepts_well_formed_model() {
        let model = model(vec![
            piece("a", PieceType::Normal, 0.0),
            piece("<unk>", PieceType::Unknown, -1.0),
            piece("<pad>", PieceType::UserDefined, -2.0),
        ]);
        validate_model(&model).unwrap();
    }

    #[test]
    fn rejects_two_unknown_pieces() {
        let model = model(vec![
            piece("a", PieceType::Unknown, 0.0),
            piece("b", PieceType::Unknown, -1.0),
        ]);
        assert!(matches!(validate_model(&model), Err(Error::Validation(_))));
    }

    #[test]
    fn rejects_gaps_in_scores() {
        let model = model(vec![
            piece("a", PieceType::Normal, 0.0),
            piece("b", PieceType::Normal, -2.0),
        ]);
        assert!(validate_model(&model).is_err());
    }

    #[test]
    fn rejects_stale_vocab_size() {
        let mut model = model(vec![piece("a", PieceType::Normal, 0.0)]);
        model.pieces.push(piece("b", PieceType::Normal, -1.0));
        assert!(validate_model(&model).is_err());
    }

    #[test]
    fn output_under_a_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let cfg = Config::new(tmp.path(), file.join("sub").join("out.model"));
        assert!(matches!(
            validate_config(&cfg),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn output_that_is_a_directory_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::new(tmp.path(), tmp.path());
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn missing_parents_are_fine() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::new(tmp.path(), tmp.path().join("x").join("y").join("out.model"))
            .with_manifest(tmp.path().join("x").join("manifest.json"));
        validate_config(&cfg).unwrap();
    }

    #[test]
    fn manifest_must_not_overwrite_the_model() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out.model");
        let cfg = Config::new(tmp.path(), &out).with_manifest(&out);
        assert!(validate_config(&cfg).is_err());
    }
}
