pub mod env;
pub mod job;

pub use job::{JobConfig, SinkConfig, SourceConfig, TransformConfig, TransformType};

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "relay-etl")]
#[command(about = "Move query results into an HTTP API or a database table")]
pub struct CliConfig {
    /// Path to the TOML job file
    #[arg(short, long, env = "RELAY_ETL_CONFIG", default_value = "etl-job.toml")]
    pub config: PathBuf,

    /// Credentials file loaded before the job file is read
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    /// Extract and transform, print the records, skip the load
    #[arg(long)]
    pub dry_run: bool,

    /// Log CPU and memory after each stage, whatever [monitoring] says
    #[arg(long, conflicts_with = "no_monitor")]
    pub monitor: bool,

    /// Turn stage statistics off even if the job file enables them
    #[arg(long)]
    pub no_monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// `None` leaves the decision to the job file.
    pub fn monitor_override(&self) -> Option<bool> {
        match (self.monitor, self.no_monitor) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
