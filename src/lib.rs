pub mod config;
pub mod core;
pub mod db;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

#[cfg(feature = "lambda")]
pub use config::lambda::LambdaConfig;
#[cfg(feature = "s3")]
pub use config::s3::S3Storage;

pub use config::{local::LocalStorage, storage::ConfiguredStorage, toml_config::ServiceConfig};
pub use core::{engine::ImportEngine, pipeline::IngestionPipeline};
pub use db::SqliteStore;
pub use utils::error::{ImportError, Result};
