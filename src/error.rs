use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum EnrichError {
    #[error("invalid SMILES descriptor: {0:?}")]
    InvalidSmiles(String),

    #[error("invalid compound id: {0:?}")]
    InvalidCid(String),

    #[error("input table not found: {0}")]
    MissingInput(Utf8PathBuf),

    #[error("failed to read input table at {path}: {message}")]
    InputRead { path: Utf8PathBuf, message: String },

    #[error("input table has no column named {0:?}")]
    MissingColumn(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read checkpoint at {path}: {message}")]
    CheckpointRead { path: Utf8PathBuf, message: String },

    #[error("failed to write checkpoint at {path}: {message}")]
    CheckpointWrite { path: Utf8PathBuf, message: String },

    #[error("PubChem request failed: {0}")]
    PubchemHttp(String),

    #[error("PubChem returned status {status}: {message}")]
    PubchemStatus { status: u16, message: String },

    #[error("unexpected PubChem response shape: {0}")]
    PubchemParse(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
