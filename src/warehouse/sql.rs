//! Statement text for the warehouse-side objects backing one table.
//!
//! Every table gets a deterministically named stage (`<t>_stage`) and file
//! format (`<t>_ff`); all statement builders derive those names from the
//! table name alone.

use std::path::Path;

pub fn stage_name(table: &str) -> String {
    format!("{table}_stage")
}

pub fn format_name(table: &str) -> String {
    format!("{table}_ff")
}

pub fn use_database(database: &str) -> String {
    format!("USE DATABASE {database}")
}

pub fn use_schema(schema: &str) -> String {
    format!("USE SCHEMA {schema}")
}

/// Destroys any prior stage under the same name.
pub fn create_stage(table: &str) -> String {
    format!("CREATE OR REPLACE STAGE {}", stage_name(table))
}

/// Destroys any prior table under the same name, data included.
pub fn create_table(table: &str, columns: &[String]) -> String {
    let columns: Vec<String> = columns.iter().map(|c| format!("\"{c}\" STRING")).collect();
    format!("CREATE OR REPLACE TABLE {} ({})", table, columns.join(","))
}

pub fn create_file_format(table: &str, delimiter: char) -> String {
    format!(
        "CREATE OR REPLACE FILE FORMAT {} TYPE = 'csv' FIELD_DELIMITER = '{}' SKIP_HEADER = 1",
        format_name(table),
        delimiter
    )
}

/// Upload statement for one local file into a named stage. Compression is
/// disabled so the staged bytes match what the file format was built for.
pub fn put_into_stage(local: &Path, stage: &str) -> String {
    let path = local.display().to_string().replace('\\', "/");
    format!("PUT 'file://{path}' @{stage} AUTO_COMPRESS = FALSE")
}

pub fn copy_into(table: &str) -> String {
    format!(
        "COPY INTO {} FROM @{} FILE_FORMAT = (format_name = {})",
        table,
        stage_name(table),
        format_name(table)
    )
}
