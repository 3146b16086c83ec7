pub mod etl;
pub mod mapper;
pub mod pipeline;
pub mod transforms;

pub use crate::domain::model::{
    LoadReport, PipelineState, Record, RunReport, TransformOptions,
};
pub use crate::domain::ports::{Pipeline, RecordSink, RecordSource, Transform};
pub use crate::utils::error::Result;
