use crate::config::{TOKENIZER_CONFIG_FILE, TOKENIZER_FILE};
use crate::errors::{load_error, Error, Result};
use crate::model::decode_model;
use crate::proto::ModelProto;
use crate::types::{ArtifactManifest, HfDocuments, TokenizerConfigDoc, TokenizerDoc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

const SUPPORTED_MODEL: &str = "BPE";

// Distinguishes temporary files of concurrent writes within one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn load_documents(dir: &Path) -> Result<HfDocuments> {
    let config: TokenizerConfigDoc = load_document(&dir.join(TOKENIZER_CONFIG_FILE))?;
    let tokenizer: TokenizerDoc = load_document(&dir.join(TOKENIZER_FILE))?;

    if let Some(kind) = tokenizer.model.kind.as_deref() {
        if kind != SUPPORTED_MODEL {
            return Err(Error::Data(format!(
                "{TOKENIZER_FILE}: model type {kind:?} is not supported, expected {SUPPORTED_MODEL:?}"
            )));
        }
    }

    Ok(HfDocuments { config, tokenizer })
}

// Syntax problems are load errors; a well-formed document with the wrong
// shape is a data error.
fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path).map_err(|err| load_error(path, err.to_string()))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|err| load_error(path, format!("malformed JSON: {err}")))?;

    serde_json::from_value(value).map_err(|err| {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Error::Data(format!("{name}: {err}"))
    })
}

/// Writes `bytes` to `path` through a sibling temporary file, creating parent
/// directories as needed. An existing file is replaced.
pub fn write_model(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent(path)?;

    let tmp_path = temp_sibling(path)?;
    if let Err(err) = write_synced(&tmp_path, bytes) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    fs::rename(&tmp_path, path).map_err(|err| {
        let _ = fs::remove_file(&tmp_path);
        Error::from(err)
    })
}

pub fn read_model(path: &Path) -> Result<ModelProto> {
    let bytes = fs::read(path).map_err(|err| load_error(path, err.to_string()))?;
    decode_model(&bytes)
}

pub fn write_manifest(manifest_path: &Path, manifest: &ArtifactManifest) -> Result<()> {
    ensure_parent(manifest_path)?;

    let file = File::create(manifest_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, manifest)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn read_manifest(manifest_path: &Path) -> Result<ArtifactManifest> {
    let file = File::open(manifest_path).map_err(|err| load_error(manifest_path, err.to_string()))?;
    let reader = BufReader::new(file);
    let manifest = serde_json::from_reader(reader)?;
    Ok(manifest)
}

/// SHA-256 over each file's name and contents, in the order given.
pub fn compute_input_hash(paths: &[&Path]) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8 * 1024];

    for path in paths {
        if let Some(name) = path.file_name() {
            hasher.update(name.to_string_lossy().as_bytes());
        }

        let file = File::open(path).map_err(|err| load_error(path, err.to_string()))?;
        let mut reader = BufReader::new(file);
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            log::debug!("creating directory {}", parent.display());
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        Error::InvalidConfig(format!("output path {} has no file name", path.display()))
    })?;
    let mut tmp_name = name.to_os_string();
    let serial = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    tmp_name.push(format!(".tmp-{}-{serial}", process::id()));
    Ok(path.with_file_name(tmp_name))
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_model_creates_parents_and_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a").join("b").join("out.model");

        write_model(&path, b"first").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"first");

        write_model(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1, "temporary file left behind: {leftovers:?}");
    }

    #[test]
    fn temp_siblings_are_unique_per_write() {
        let path = Path::new("out").join("tok.model");
        let first = temp_sibling(&path).unwrap();
        let second = temp_sibling(&path).unwrap();
        assert_ne!(first, second);
        assert_eq!(first.parent(), path.parent());
    }

    #[test]
    fn write_model_into_a_directory_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("taken");
        fs::create_dir_all(&dir).unwrap();
        assert!(write_model(&dir, b"bytes").is_err());
        assert!(dir.is_dir());
    }

    #[test]
    fn hash_depends_on_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("tokenizer.json");
        fs::write(&a, "{}").unwrap();
        let first = compute_input_hash(&[a.as_path()]).unwrap();
        assert_eq!(first, compute_input_hash(&[a.as_path()]).unwrap());
        assert_eq!(first.len(), 64);

        fs::write(&a, "{ }").unwrap();
        assert_ne!(first, compute_input_hash(&[a.as_path()]).unwrap());
    }

    #[test]
    fn manifest_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("manifest.json");
        let manifest = ArtifactManifest {
            input_hash: "abc".into(),
            created_at: "unix:1".into(),
            piece_count: 3,
            model_bytes: 42,
        };
        write_manifest(&path, &manifest).unwrap();
        let loaded = read_manifest(&path).unwrap();
        assert_eq!(loaded.piece_count, 3);
        assert_eq!(loaded.model_bytes, 42);
        assert!(fs::read_to_string(&path).unwrap().ends_with("}\n"));
    }
}
