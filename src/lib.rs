pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::{run_job, RunMode};
pub use config::JobConfig;
pub use core::{etl::EtlEngine, mapper::ColumnMapper, pipeline::EtlPipeline};
pub use domain::model::{PipelineState, Record, RunReport, TransformOptions};
pub use utils::error::{EtlError, Result};
