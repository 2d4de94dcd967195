pub mod conf;
pub mod core;
pub mod infer;
pub mod ingest;
pub mod registry;
pub mod warehouse;
pub mod watch;

#[cfg(feature = "testutil")]
pub mod testutil;
