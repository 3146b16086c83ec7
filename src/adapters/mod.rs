// Adapters layer: concrete sources and sinks for databases, Presto and HTTP.

pub mod console;
pub mod database;
pub mod http_sink;
pub mod http_source;
pub mod presto;
pub mod sql_source;
pub mod table_sink;

pub use console::ConsoleSink;
pub use database::{ConnectionContext, Database, Dialect};
pub use http_sink::HttpSink;
pub use http_source::HttpSource;
pub use presto::{PrestoSettings, PrestoSource};
pub use sql_source::SqlSource;
pub use table_sink::{CommitMode, TableSink};
