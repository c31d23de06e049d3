//! Conversion driver.
//!
//! A conversion moves through `Idle → ConfigsLoaded → SpecsBuilt → VocabBuilt
//! → Serialized → Done`; the first failing step moves it to `Failed` and its
//! error is returned unchanged.

use crate::artifacts::{compute_input_hash, load_documents, write_manifest, write_model};
use crate::byte_map::byte_remap_table;
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::model::{assemble_model, encode_model};
use crate::normalizer::{build_denormalizer_spec, build_normalizer_spec};
use crate::proto::ModelProto;
use crate::types::{ArtifactManifest, ConversionSummary, HfDocuments};
use crate::validate::validate_model;
use crate::vocab::{assemble_pieces, AssembledVocab};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Idle,
    ConfigsLoaded,
    SpecsBuilt,
    VocabBuilt,
    Serialized,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::ConfigsLoaded => "configs-loaded",
            Stage::SpecsBuilt => "specs-built",
            Stage::VocabBuilt => "vocab-built",
            Stage::Serialized => "serialized",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

pub(crate) struct Conversion {
    stage: Stage,
}

impl Conversion {
    pub(crate) fn new() -> Self {
        Self { stage: Stage::Idle }
    }

    #[cfg(test)]
    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }

    /// Runs the step leading to `next`. Steps only run from a live state.
    fn advance<T>(&mut self, next: Stage, step: impl FnOnce() -> Result<T>) -> Result<T> {
        if matches!(self.stage, Stage::Done | Stage::Failed) {
            return Err(Error::Validation(format!(
                "cannot move to {next} from {}",
                self.stage
            )));
        }

        match step() {
            Ok(value) => {
                log::debug!("conversion {} -> {next}", self.stage);
                self.stage = next;
                Ok(value)
            }
            Err(err) => {
                log::error!("conversion failed before {next}: {err}");
                self.stage = Stage::Failed;
                Err(err)
            }
        }
    }

    fn build(&mut self, input_dir: &Path) -> Result<(ModelProto, AssembledVocab)> {
        let docs = self.advance(Stage::ConfigsLoaded, || load_documents(input_dir))?;

        let (normalizer, denormalizer) = self.advance(Stage::SpecsBuilt, || {
            let table = byte_remap_table();
            Ok((
                build_normalizer_spec(&table)?,
                build_denormalizer_spec(&table)?,
            ))
        })?;

        self.advance(Stage::VocabBuilt, || {
            let mut vocab = assemble_docs(&docs)?;
            let pieces = std::mem::take(&mut vocab.pieces);
            let model = assemble_model(normalizer, denormalizer, pieces)?;
            Ok((model, vocab))
        })
    }
}

fn assemble_docs(docs: &HfDocuments) -> Result<AssembledVocab> {
    assemble_pieces(
        &docs.tokenizer.model.vocab,
        docs.unk_token(),
        &docs.tokenizer.added_tokens,
    )
}

/// Loads the documents in `input_dir` and assembles the model without
/// writing anything.
pub fn build_model(input_dir: &Path) -> Result<ModelProto> {
    let mut conversion = Conversion::new();
    let (model, _) = conversion.build(input_dir)?;
    validate_model(&model)?;
    Ok(model)
}

pub fn run(cfg: &Config) -> Result<ConversionSummary> {
    let mut conversion = Conversion::new();
    let (model, vocab) = conversion.build(&cfg.input.dir)?;

    let summary = conversion.advance(Stage::Serialized, || {
        validate_model(&model)?;
        let bytes = encode_model(&model)?;
        let summary = ConversionSummary {
            vocab_entries: vocab.vocab_entries,
            added_emitted: vocab.added_emitted,
            added_skipped: vocab.added_skipped,
            piece_count: model.pieces.len(),
            has_unknown: vocab.has_unknown,
            model_bytes: bytes.len(),
        };
        write_outputs(cfg, &bytes, &summary)?;
        Ok(summary)
    })?;

    conversion.advance(Stage::Done, || Ok(()))?;

    log::info!(
        "wrote {} ({} pieces, {} bytes; {} added tokens emitted, {} skipped)",
        cfg.output.model.display(),
        summary.piece_count,
        summary.model_bytes,
        summary.added_emitted,
        summary.added_skipped
    );

    Ok(summary)
}

// The manifest goes first so a failed manifest never leaves a fresh model
// behind; a failed model write removes the manifest again.
fn write_outputs(cfg: &Config, bytes: &[u8], summary: &ConversionSummary) -> Result<()> {
    let Some(manifest_path) = cfg.output.manifest.as_deref() else {
        return write_model(&cfg.output.model, bytes);
    };

    write_manifest_for(cfg, manifest_path, summary)?;
    write_model(&cfg.output.model, bytes).map_err(|err| {
        if let Err(cleanup) = fs::remove_file(manifest_path) {
            log::warn!("could not remove {}: {cleanup}", manifest_path.display());
        }
        err
    })
}

fn write_manifest_for(cfg: &Config, path: &Path, summary: &ConversionSummary) -> Result<()> {
    let config_path = cfg.tokenizer_config_path();
    let tokenizer_path = cfg.tokenizer_path();
    let input_hash = compute_input_hash(&[config_path.as_path(), tokenizer_path.as_path()])?;

    let created_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Validation(format!("failed to compute timestamp: {e}")))?
        .as_secs();

    let manifest = ArtifactManifest {
        input_hash,
        created_at: format!("unix:{created_at}"),
        piece_count: summary.piece_count,
        model_bytes: summary.model_bytes,
    };
    write_manifest(path, &manifest)
}
