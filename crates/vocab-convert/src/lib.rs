//! Converts Hugging Face byte-level BPE tokenizers into SentencePiece models.
//!
//! The input is a directory holding `tokenizer_config.json` and
//! `tokenizer.json`. The output is a serialized SentencePiece `ModelProto`
//! whose normalizer applies the GPT-2 byte-to-unicode substitution and whose
//! denormalizer undoes it, so a SentencePiece runtime sees exactly the text the
//! original tokenizer would have produced after its own byte-level step.
//!
//! # Scoring
//!
//! Hugging Face BPE vocabularies carry no scores. Pieces are ranked by their
//! token index and scored `0, -1, -2, ...`; normalized added tokens follow as
//! user-defined pieces continuing the same sequence. Unnormalized added tokens
//! are left to the runtime and are not emitted.
//!
//! # Configuration
//!
//! [`convert_tokenizer`] takes the two paths directly. [`convert`] takes a
//! [`Config`], which can also request a JSON manifest recording a hash of the
//! inputs. Configs are validated before anything touches the filesystem.
//!
//! # Thread Safety
//!
//! A conversion owns all of its state. Concurrent conversions are safe as long
//! as they target distinct output paths.

pub mod byte_map;
pub mod charsmap;
pub mod config;
pub mod errors;
pub mod proto;
pub mod types;

mod artifacts;
mod model;
mod normalizer;
mod pipeline;
mod validate;
mod vocab;

use std::path::Path;

pub use artifacts::{read_manifest, read_model};
pub use config::{Config, InputCfg, OutputCfg};
pub use errors::{Error, Result};
pub use proto::{ModelProto, ModelType, NormalizerSpec, PieceType, SentencePiece, TrainerSpec};
pub use types::{ArtifactManifest, ConversionSummary};

/// Converts the tokenizer in `input_dir` and writes the model to
/// `output_path`, creating parent directories and replacing any existing file.
pub fn convert_tokenizer(input_dir: impl AsRef<Path>, output_path: impl AsRef<Path>) -> Result<()> {
    let cfg = Config::new(input_dir.as_ref(), output_path.as_ref());
    convert(&cfg).map(|_| ())
}

pub fn convert(cfg: &Config) -> Result<ConversionSummary> {
    validate::validate_config(cfg)?;
    pipeline::run(cfg)
}

/// Builds the model for `input_dir` in memory.
pub fn build_model(input_dir: impl AsRef<Path>) -> Result<ModelProto> {
    pipeline::build_model(input_dir.as_ref())
}
