pub mod local;
pub mod storage;
pub mod toml_config;

#[cfg(feature = "lambda")]
pub mod lambda;
#[cfg(feature = "s3")]
pub mod s3;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};

#[cfg(feature = "cli")]
mod cli {
    use crate::config::toml_config::ServiceConfig;
    use crate::utils::error::Result;
    use clap::{Parser, Subcommand};
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "csv-intake")]
    #[command(about = "Import customer CSV files into SQLite and report per-row errors")]
    pub struct CliConfig {
        /// TOML configuration file
        #[arg(long, global = true)]
        pub config: Option<PathBuf>,

        /// SQLite database path (overrides `[database] path`)
        #[arg(long, global = true)]
        pub database: Option<String>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Print results as JSON")]
        pub json: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Run the HTTP service
        Serve {
            /// Listen address (overrides `[server] bind`)
            #[arg(long)]
            bind: Option<String>,
        },
        /// Import a local CSV file
        Import { file: PathBuf },
        /// Write every stored record as CSV
        Export {
            /// Output file; stdout when omitted
            #[arg(short, long)]
            output: Option<PathBuf>,
        },
        /// Show the most recently imported records
        Recent {
            #[arg(short, long)]
            limit: Option<usize>,
        },
        /// Print the sample CSV
        Sample,
    }

    impl CliConfig {
        /// 合併配置來源：TOML 檔案 → 環境變數 → 命令列參數
        pub fn service_config(&self) -> Result<ServiceConfig> {
            let mut config = match &self.config {
                Some(path) => ServiceConfig::from_file(path)?,
                None => ServiceConfig::default(),
            };

            config.apply_env_overrides();

            if let Some(database) = &self.database {
                config.database.path = database.clone();
            }
            match &self.command {
                Command::Serve { bind: Some(bind) } => config.server.bind = bind.clone(),
                Command::Recent { limit: Some(limit) } => config.server.recent_limit = *limit,
                _ => {}
            }

            Ok(config)
        }
    }

}
