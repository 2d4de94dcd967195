mod snowsql;
pub mod sql;

pub use snowsql::SnowSql;

use std::path::Path;

use async_trait::async_trait;

use crate::core::ChuteError;

/// Hands out per-file warehouse sessions.
#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Session>, ChuteError>;
}

/// One short-lived warehouse session. A session is opened for each ingested
/// file and released on every exit path, including mid-sequence failure.
#[async_trait]
pub trait Session: Send {
    /// Runs one statement to completion.
    async fn execute(&mut self, sql: &str) -> Result<(), ChuteError>;

    /// Uploads a local file into a named stage, uncompressed, so the file
    /// format's parsing parameters stay valid server-side.
    async fn put_file(&mut self, local: &Path, stage: &str) -> Result<(), ChuteError>;

    /// Releases the session. Must be safe to call after a failed statement.
    async fn close(&mut self) -> Result<(), ChuteError>;
}
