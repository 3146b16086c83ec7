// App layer: wires a job file to concrete adapters and runs it.

pub mod runner;

pub use runner::{run_job, RunMode};
