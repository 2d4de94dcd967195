use crate::{
    conf::{WarehouseConfig, WatchConfig},
    core::ChuteError::{self, ConfigParsingError},
};
use config::Config as CConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub warehouse: WarehouseConfig,
    pub watch: WatchConfig,
}

impl Config {
    pub fn from_str(toml_str: &str) -> Result<Config, ChuteError> {
        let config = CConfig::builder()
            .add_source(config::File::from_str(toml_str, config::FileFormat::Toml))
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))?;
        return Ok(config);
    }

    /// Loads the config file (if given) with CHUTE_* environment overrides
    /// on top, e.g. CHUTE_WAREHOUSE__PASSWORD.
    pub fn load(path: Option<&str>) -> Result<Config, ChuteError> {
        let mut builder = CConfig::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        let config = builder
            .add_source(config::Environment::with_prefix("CHUTE").separator("__"))
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))?;
        return Ok(config);
    }
}
