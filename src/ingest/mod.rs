use std::path::Path;
use std::sync::Arc;

use log::{error, info, warn};

use crate::conf::WarehouseConfig;
use crate::core::ChuteError;
use crate::infer::{self, HeaderSniffer, SingleLineSniffer};
use crate::registry::TableRegistry;
use crate::warehouse::{Session, Warehouse, sql};

/// Decides, for each created file, between appending to a known table and
/// provisioning a new one, then drives the warehouse statements for it.
///
/// One engine instance serves the whole process; files are handed to
/// [`Ingestor::ingest`] one at a time, in delivery order.
pub struct Ingestor {
    warehouse: Arc<dyn Warehouse>,
    registry: TableRegistry,
    sniffer: Box<dyn HeaderSniffer>,
    database: String,
    schema: String,
}

impl Ingestor {
    pub fn new(warehouse: Arc<dyn Warehouse>, config: &WarehouseConfig) -> Self {
        Self {
            warehouse,
            registry: TableRegistry::new(),
            sniffer: Box::new(SingleLineSniffer),
            database: config.database.clone(),
            schema: config.schema.clone(),
        }
    }

    /// Swaps the header sniffer, e.g. for a multi-line heuristic.
    pub fn with_sniffer(mut self, sniffer: Box<dyn HeaderSniffer>) -> Self {
        self.sniffer = sniffer;
        self
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    /// Loads one file. Errors are logged and swallowed here; no single file
    /// may take down the watch loop, and no retry is attempted.
    pub async fn ingest(&mut self, path: &Path) {
        info!("Loading file into warehouse: {}", path.display());
        match self.ingest_file(path).await {
            Ok(()) => {}
            Err(e) => error!("Failed to load {}: {}", path.display(), e),
        }
    }

    async fn ingest_file(&mut self, path: &Path) -> Result<(), ChuteError> {
        let mut session = self.warehouse.connect().await?;
        let outcome = self.drive(session.as_mut(), path).await;
        // The session is released no matter how the protocol ended.
        if let Err(e) = session.close().await {
            warn!("Closing session after {}: {}", path.display(), e);
        }
        outcome
    }

    async fn drive(&mut self, session: &mut dyn Session, path: &Path) -> Result<(), ChuteError> {
        session.execute(&sql::use_database(&self.database)).await?;
        session.execute(&sql::use_schema(&self.schema)).await?;

        let table_name = table_name_from_path(path)?;

        let matched = self
            .registry
            .find_prefix_match(&table_name)
            .map(|(name, defining)| (name.to_string(), defining.to_path_buf()));

        match matched {
            Some((matched, defining)) => {
                info!("Matching table found: {}", matched);
                let header = infer::read_header_line(path)?;
                let existing = infer::read_header_line(&defining)?;
                if header == existing {
                    self.append(session, &matched, path).await
                } else {
                    // A diverging header means this is really a different
                    // table shape; provision under the candidate name, not
                    // the matched one.
                    info!(
                        "Header differs from {}; provisioning table {}",
                        defining.display(),
                        table_name
                    );
                    self.provision(session, &table_name, path).await
                }
            }
            None => self.provision(session, &table_name, path).await,
        }
    }

    /// Appends `path` to an already provisioned table: upload into its stage,
    /// bulk-load with its file format. Exactly two statements, no registry
    /// change. A staged file whose load fails stays staged.
    async fn append(
        &self,
        session: &mut dyn Session,
        table: &str,
        path: &Path,
    ) -> Result<(), ChuteError> {
        session.put_file(path, &sql::stage_name(table)).await?;
        session.execute(&sql::copy_into(table)).await?;
        info!("File {} appended to table {}", path.display(), table);
        Ok(())
    }

    /// Provisions stage, table, and file format from the file's header, then
    /// loads the file. Replaces any same-named objects, data included; a
    /// failure aborts the remaining steps without rolling back earlier DDL.
    async fn provision(
        &mut self,
        session: &mut dyn Session,
        table: &str,
        path: &Path,
    ) -> Result<(), ChuteError> {
        session.execute(&sql::create_stage(table)).await?;
        info!("Stage {} ready", sql::stage_name(table));

        let header = infer::read_header_line(path)?;
        let schema = self.sniffer.sniff(&header)?;
        info!(
            "Inferred {} columns with delimiter {:?}",
            schema.columns.len(),
            schema.delimiter
        );

        session
            .execute(&sql::create_table(table, &schema.columns))
            .await?;
        session
            .execute(&sql::create_file_format(table, schema.delimiter))
            .await?;
        session.put_file(path, &sql::stage_name(table)).await?;
        session.execute(&sql::copy_into(table)).await?;

        self.registry.put(table, path);
        info!("File {} loaded into new table {}", path.display(), table);
        Ok(())
    }
}

fn table_name_from_path(path: &Path) -> Result<String, ChuteError> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ChuteError::FileReadError(format!("no usable file name in {}", path.display()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{RecordingWarehouse, WarehouseCall, csv_file, drop_dir};

    fn test_config() -> WarehouseConfig {
        WarehouseConfig {
            account: "xy12345".to_string(),
            user: "loader".to_string(),
            password: "hunter2".to_string(),
            database: "RAW".to_string(),
            warehouse: "LOAD_WH".to_string(),
            schema: "LANDING".to_string(),
        }
    }

    fn engine(warehouse: &Arc<RecordingWarehouse>) -> Ingestor {
        Ingestor::new(Arc::clone(warehouse) as Arc<dyn Warehouse>, &test_config())
    }

    #[test]
    fn test_table_name_from_path() {
        assert_eq!(
            table_name_from_path(Path::new("/drop/orders_2024.csv")).unwrap(),
            "orders_2024"
        );
        assert_eq!(table_name_from_path(Path::new("plain.csv")).unwrap(), "plain");
    }

    #[tokio::test]
    async fn test_first_file_provisions_table() {
        let dir = drop_dir();
        let path = csv_file(dir.path(), "orders.csv", "id,name\n1,widget\n");
        let warehouse = Arc::new(RecordingWarehouse::new());
        let mut ingestor = engine(&warehouse);

        ingestor.ingest(&path).await;

        let statements = warehouse.statements();
        assert_eq!(statements[0], "USE DATABASE RAW");
        assert_eq!(statements[1], "USE SCHEMA LANDING");
        assert_eq!(statements[2], "CREATE OR REPLACE STAGE orders_stage");
        assert_eq!(
            statements[3],
            "CREATE OR REPLACE TABLE orders (\"id\" STRING,\"name\" STRING)"
        );
        assert_eq!(
            statements[4],
            "CREATE OR REPLACE FILE FORMAT orders_ff TYPE = 'csv' FIELD_DELIMITER = ',' SKIP_HEADER = 1"
        );
        assert!(statements[5].starts_with("PUT 'file://"));
        assert!(statements[5].ends_with("@orders_stage AUTO_COMPRESS = FALSE"));
        assert_eq!(
            statements[6],
            "COPY INTO orders FROM @orders_stage FILE_FORMAT = (format_name = orders_ff)"
        );
        assert_eq!(statements.len(), 7);

        assert_eq!(ingestor.registry().len(), 1);
        assert_eq!(
            ingestor.registry().defining_path("orders"),
            Some(path.as_path())
        );
        assert_eq!(warehouse.closed_sessions(), 1);
    }

    #[tokio::test]
    async fn test_same_header_appends_with_two_statements() {
        let dir = drop_dir();
        let first = csv_file(dir.path(), "orders.csv", "id,name\n1,widget\n");
        let second = csv_file(dir.path(), "orders_2024.csv", "id,name\n2,gadget\n");
        let warehouse = Arc::new(RecordingWarehouse::new());
        let mut ingestor = engine(&warehouse);

        ingestor.ingest(&first).await;
        let before = warehouse.calls().len();
        ingestor.ingest(&second).await;

        let calls = &warehouse.calls()[before..];
        // USE DATABASE, USE SCHEMA, PUT, COPY INTO, close — nothing else.
        assert_eq!(calls.len(), 5);
        assert!(matches!(
            &calls[2],
            WarehouseCall::Put { stage, .. } if stage == "orders_stage"
        ));
        assert_eq!(
            calls[3],
            WarehouseCall::Execute(
                "COPY INTO orders FROM @orders_stage FILE_FORMAT = (format_name = orders_ff)"
                    .to_string()
            )
        );
        assert_eq!(calls[4], WarehouseCall::Close);

        // Appending never repoints the registry.
        assert_eq!(ingestor.registry().len(), 1);
        assert_eq!(
            ingestor.registry().defining_path("orders"),
            Some(first.as_path())
        );
    }

    #[tokio::test]
    async fn test_header_mismatch_provisions_under_candidate_name() {
        let dir = drop_dir();
        let first = csv_file(dir.path(), "orders.csv", "id,name\n1,widget\n");
        let second = csv_file(dir.path(), "orders_2024.csv", "id,name,amount\n2,gadget,9\n");
        let warehouse = Arc::new(RecordingWarehouse::new());
        let mut ingestor = engine(&warehouse);

        ingestor.ingest(&first).await;
        ingestor.ingest(&second).await;

        // The new table is named after the second file, not the matched one.
        let statements = warehouse.statements();
        assert!(
            statements
                .iter()
                .any(|s| s == "CREATE OR REPLACE STAGE orders_2024_stage")
        );
        assert!(statements.iter().any(|s| s.starts_with(
            "CREATE OR REPLACE TABLE orders_2024 (\"id\" STRING,\"name\" STRING,\"amount\" STRING)"
        )));

        assert_eq!(ingestor.registry().len(), 2);
        assert_eq!(
            ingestor.registry().defining_path("orders_2024"),
            Some(second.as_path())
        );
        // The original entry is untouched.
        assert_eq!(
            ingestor.registry().defining_path("orders"),
            Some(first.as_path())
        );
    }

    #[tokio::test]
    async fn test_reingesting_same_name_repoints_registry() {
        let dir = drop_dir();
        let first = csv_file(dir.path(), "orders.csv", "id,name\n1,widget\n");
        let warehouse = Arc::new(RecordingWarehouse::new());
        let mut ingestor = engine(&warehouse);
        ingestor.ingest(&first).await;

        // Same candidate name from another directory, different header:
        // exact-name match, mismatch, recreate under the same name with the
        // new file as definition.
        let sub = dir.path().join("resend");
        std::fs::create_dir(&sub).unwrap();
        let replacement = csv_file(&sub, "orders.csv", "sku,qty\nA,1\n");
        ingestor.ingest(&replacement).await;

        assert_eq!(ingestor.registry().len(), 1);
        assert_ne!(replacement, first);
        assert_eq!(
            ingestor.registry().defining_path("orders"),
            Some(replacement.as_path())
        );
    }

    #[tokio::test]
    async fn test_copy_failure_closes_session_and_next_file_proceeds() {
        let dir = drop_dir();
        let first = csv_file(dir.path(), "orders.csv", "id,name\n1,widget\n");
        let warehouse = Arc::new(RecordingWarehouse::new());
        let mut ingestor = engine(&warehouse);

        warehouse.fail_on("COPY INTO");
        ingestor.ingest(&first).await;

        // The failed provisioning never reached the registry update.
        assert!(ingestor.registry().is_empty());
        assert_eq!(warehouse.closed_sessions(), 1);

        warehouse.heal();
        let second = csv_file(dir.path(), "sales.csv", "day,total\nmon,5\n");
        ingestor.ingest(&second).await;

        assert_eq!(ingestor.registry().len(), 1);
        assert_eq!(warehouse.closed_sessions(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_file_closes_session() {
        let dir = drop_dir();
        let warehouse = Arc::new(RecordingWarehouse::new());
        let mut ingestor = engine(&warehouse);

        ingestor.ingest(&dir.path().join("ghost.csv")).await;

        assert!(ingestor.registry().is_empty());
        // Context statements ran, then the header read failed; the session
        // was still released.
        assert_eq!(warehouse.closed_sessions(), 1);
    }

    #[tokio::test]
    async fn test_undetectable_delimiter_aborts_after_stage() {
        let dir = drop_dir();
        let path = csv_file(dir.path(), "blob.csv", "abcdef\n");
        let warehouse = Arc::new(RecordingWarehouse::new());
        let mut ingestor = engine(&warehouse);

        ingestor.ingest(&path).await;

        let statements = warehouse.statements();
        // Stage creation precedes inference, so it runs; nothing after does.
        assert_eq!(
            statements.last().unwrap(),
            "CREATE OR REPLACE STAGE blob_stage"
        );
        assert!(ingestor.registry().is_empty());
        assert_eq!(warehouse.closed_sessions(), 1);
    }
}
