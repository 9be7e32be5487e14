use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConveyorError {
    #[error("failed to spawn conveyor source (binary={binary:?}): {source}")]
    Spawn {
        binary: PathBuf,
        source: std::io::Error,
    },
    #[error("failed waiting for conveyor source: {0}")]
    Wait(std::io::Error),
    #[error("failed reading stdout: {0}")]
    StdoutRead(std::io::Error),
    #[error("failed reading stderr: {0}")]
    StderrRead(std::io::Error),
    #[error("internal error: missing stdout pipe")]
    MissingStdout,
    #[error("internal error: missing stderr pipe")]
    MissingStderr,
    #[error("internal error: join failure: {0}")]
    Join(String),
    #[error("failed to parse record as JSON: {source}: `{line}`")]
    MalformedRecord {
        line: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("record handler failed: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),
}
