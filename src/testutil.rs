//! Test doubles and fixtures for exercising ingestion without a warehouse.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::core::ChuteError;
use crate::warehouse::{Session, Warehouse, sql};

/// Everything a recording session was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum WarehouseCall {
    Execute(String),
    Put { local: PathBuf, stage: String },
    Close,
}

/// Warehouse double whose sessions record every call into a shared log.
///
/// `fail_on` makes the first statement containing the given substring fail,
/// so tests can break the sequence at any chosen step.
#[derive(Default)]
pub struct RecordingWarehouse {
    calls: Arc<Mutex<Vec<WarehouseCall>>>,
    fail_on: Arc<Mutex<Option<String>>>,
}

impl RecordingWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any statement (or upload) whose text contains `needle`.
    pub fn fail_on(&self, needle: &str) {
        *self.fail_on.lock().unwrap() = Some(needle.to_string());
    }

    /// Stop injecting failures.
    pub fn heal(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<WarehouseCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the statement texts, uploads rendered as PUT statements.
    pub fn statements(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                WarehouseCall::Execute(stmt) => Some(stmt),
                WarehouseCall::Put { local, stage } => Some(sql::put_into_stage(&local, &stage)),
                WarehouseCall::Close => None,
            })
            .collect()
    }

    pub fn closed_sessions(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, WarehouseCall::Close))
            .count()
    }
}

#[async_trait]
impl Warehouse for RecordingWarehouse {
    async fn connect(&self) -> Result<Box<dyn Session>, ChuteError> {
        Ok(Box::new(RecordingSession {
            calls: Arc::clone(&self.calls),
            fail_on: Arc::clone(&self.fail_on),
        }))
    }
}

struct RecordingSession {
    calls: Arc<Mutex<Vec<WarehouseCall>>>,
    fail_on: Arc<Mutex<Option<String>>>,
}

impl RecordingSession {
    fn should_fail(&self, text: &str) -> bool {
        self.fail_on
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|needle| text.contains(needle))
    }
}

#[async_trait]
impl Session for RecordingSession {
    async fn execute(&mut self, statement: &str) -> Result<(), ChuteError> {
        self.calls
            .lock()
            .unwrap()
            .push(WarehouseCall::Execute(statement.to_string()));
        if self.should_fail(statement) {
            return Err(ChuteError::StatementError(format!(
                "injected failure: {statement}"
            )));
        }
        Ok(())
    }

    async fn put_file(&mut self, local: &Path, stage: &str) -> Result<(), ChuteError> {
        let rendered = sql::put_into_stage(local, stage);
        self.calls.lock().unwrap().push(WarehouseCall::Put {
            local: local.to_path_buf(),
            stage: stage.to_string(),
        });
        if self.should_fail(&rendered) {
            return Err(ChuteError::UploadError(format!(
                "injected failure: {rendered}"
            )));
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ChuteError> {
        self.calls.lock().unwrap().push(WarehouseCall::Close);
        Ok(())
    }
}

/// A fresh drop directory for watcher and ingestion tests.
pub fn drop_dir() -> TempDir {
    TempDir::new().expect("creating temp drop dir")
}

/// Writes a CSV fixture under `dir` and returns its path.
pub fn csv_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("writing csv fixture");
    path
}
