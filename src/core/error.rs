use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ChuteError {
    #[error("Cannot parse config: {0}")]
    ConfigParsingError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Cannot read header line: {0}")]
    FileReadError(String),
    #[error("Cannot infer schema: {0}")]
    SchemaInferenceError(String),
    #[error("Statement failed: {0}")]
    StatementError(String),
    #[error("Upload failed: {0}")]
    UploadError(String),
    #[error("Watcher error: {0}")]
    WatchError(String),
}

impl From<std::io::Error> for ChuteError {
    fn from(err: std::io::Error) -> Self {
        ChuteError::IoError(err.to_string())
    }
}

impl From<notify::Error> for ChuteError {
    fn from(err: notify::Error) -> Self {
        ChuteError::WatchError(err.to_string())
    }
}
