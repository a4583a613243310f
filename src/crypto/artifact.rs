//! Compiled contract artifact loading.
//!
//! Accepts the Foundry layout (`{"bytecode": {"object": "0x..."}}`) as well as
//! flat artifacts (`{"bytecode": "0x..."}`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("can't open artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("can't decode artifact {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("artifact {} has empty bytecode", path.display())]
    EmptyBytecode { path: PathBuf },
    #[error("artifact {} has invalid bytecode hex: {source}", path.display())]
    Hex {
        path: PathBuf,
        source: hex::FromHexError,
    },
}

#[derive(Deserialize)]
struct Artifact {
    bytecode: Bytecode,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Bytecode {
    Object { object: String },
    Flat(String),
}

impl Bytecode {
    fn hex(&self) -> &str {
        let s = match self {
            Bytecode::Object { object } => object,
            Bytecode::Flat(s) => s,
        };
        s.strip_prefix("0x").unwrap_or(s)
    }
}

/// Parses deployment bytecode out of artifact JSON text. `path` is only used
/// for error messages.
pub fn parse_bytecode(json: &str, path: &Path) -> Result<Vec<u8>, ArtifactError> {
    let artifact: Artifact = serde_json::from_str(json).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let code = artifact.bytecode.hex();
    if code.is_empty() {
        return Err(ArtifactError::EmptyBytecode {
            path: path.to_path_buf(),
        });
    }
    hex::decode(code).map_err(|source| ArtifactError::Hex {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the deployment bytecode from the artifact file at `path`.
pub fn load_bytecode(path: impl AsRef<Path>) -> Result<Vec<u8>, ArtifactError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bytecode(&json, path)
}
