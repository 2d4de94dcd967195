use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WarehouseConfig {
    pub account: String,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Compute warehouse to run statements on.
    pub warehouse: String,
    #[serde(default = "WarehouseConfig::default_schema")]
    pub schema: String,
}

impl WarehouseConfig {
    fn default_schema() -> String {
        String::from("PUBLIC")
    }
}
