use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const TOKENIZER_CONFIG_FILE: &str = "tokenizer_config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub input: InputCfg,
    pub output: OutputCfg,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputCfg {
    /// Directory holding `tokenizer_config.json` and `tokenizer.json`.
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputCfg {
    pub model: PathBuf,
    #[serde(default)]
    pub manifest: Option<PathBuf>,
}

impl Config {
    pub fn new(input_dir: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            input: InputCfg {
                dir: input_dir.into(),
            },
            output: OutputCfg {
                model: model_path.into(),
                manifest: None,
            },
        }
    }

    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.output.manifest = Some(path.into());
        self
    }

    /// Loads a JSON config. Relative paths resolve against the config file's
    /// directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&contents)?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.apply_base_path(base_dir);
        Ok(config)
    }

    pub fn tokenizer_config_path(&self) -> PathBuf {
        self.input.dir.join(TOKENIZER_CONFIG_FILE)
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.input.dir.join(TOKENIZER_FILE)
    }

    fn apply_base_path(&mut self, base_dir: &Path) {
        resolve_in(base_dir, &mut self.input.dir);
        resolve_in(base_dir, &mut self.output.model);
        if let Some(manifest) = self.output.manifest.as_mut() {
            resolve_in(base_dir, manifest);
        }
    }
}

fn resolve_in(base_dir: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = base_dir.join(&*path);
    }
}
