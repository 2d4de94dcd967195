mod config;
mod warehouse;
mod watch;

pub use config::Config;
pub use warehouse::WarehouseConfig;
pub use watch::WatchConfig;
