use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("invalid tokenizer data: {0}")]
    Data(String),

    #[error("charsmap compilation failed: {0}")]
    Compile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde_json error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("model encode error: {0}")]
    Encode(#[from] prost::EncodeError),

    #[error("model decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

impl Error {
    pub fn is_load(&self) -> bool {
        matches!(self, Error::Load { .. })
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Error::Data(_))
    }
}

pub(crate) fn load_error<S: Into<String>>(path: &Path, reason: S) -> Error {
    Error::Load {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

pub(crate) fn compile_error<S: Into<String>>(msg: S) -> Error {
    Error::Compile(msg.into())
}
