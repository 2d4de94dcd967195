use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Directory tree to watch for new CSV files.
    pub root: PathBuf,
    #[serde(default = "WatchConfig::default_recursive")]
    pub recursive: bool,
}

impl WatchConfig {
    fn default_recursive() -> bool {
        true
    }
}
