use std::path::Path;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::conf::WarehouseConfig;
use crate::core::ChuteError;

use super::{Session, Warehouse, sql};

/// Warehouse access through the `snowsql` CLI, one process per statement.
///
/// Session context (database, warehouse, schema) rides along as flags on
/// every invocation; the password goes through SNOWSQL_PWD and never appears
/// on a command line.
pub struct SnowSql {
    config: WarehouseConfig,
}

impl SnowSql {
    pub fn new(config: WarehouseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Warehouse for SnowSql {
    async fn connect(&self) -> Result<Box<dyn Session>, ChuteError> {
        Ok(Box::new(SnowSqlSession {
            config: self.config.clone(),
        }))
    }
}

struct SnowSqlSession {
    config: WarehouseConfig,
}

impl SnowSqlSession {
    async fn run(&self, statement: &str) -> Result<(), ChuteError> {
        debug!("snowsql: {}", statement);
        let output = Command::new("snowsql")
            .arg("--accountname")
            .arg(&self.config.account)
            .arg("--username")
            .arg(&self.config.user)
            .arg("--dbname")
            .arg(&self.config.database)
            .arg("--warehouse")
            .arg(&self.config.warehouse)
            .arg("--schemaname")
            .arg(&self.config.schema)
            .arg("-o")
            .arg("friendly=false")
            .arg("-o")
            .arg("exit_on_error=true")
            .arg("-q")
            .arg(statement)
            .env("SNOWSQL_PWD", &self.config.password)
            .output()
            .await
            .map_err(|e| ChuteError::StatementError(format!("spawning snowsql: {e}")))?;

        if !output.status.success() {
            return Err(ChuteError::StatementError(format!(
                "snowsql exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Session for SnowSqlSession {
    async fn execute(&mut self, statement: &str) -> Result<(), ChuteError> {
        self.run(statement).await
    }

    async fn put_file(&mut self, local: &Path, stage: &str) -> Result<(), ChuteError> {
        self.run(&sql::put_into_stage(local, stage))
            .await
            .map_err(|e| match e {
                ChuteError::StatementError(msg) => ChuteError::UploadError(msg),
                other => other,
            })
    }

    async fn close(&mut self) -> Result<(), ChuteError> {
        // Nothing held open between statements.
        Ok(())
    }
}
