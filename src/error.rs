use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write draft snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize draft snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("invalid `{kind}` payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        source: serde_json::Error,
    },

    #[error("`{kind}` payload has an empty username")]
    EmptyUsername { kind: &'static str },

    #[error("failed to encode outbound frame: {0}")]
    Encode(#[source] serde_json::Error),
}
