use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// One row. Field order is insertion order and drives positional INSERTs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.data.insert(field.into(), value);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Options honoured by every transform: renames first, then literal inserts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformOptions {
    #[serde(default)]
    pub rename_columns: BTreeMap<String, String>,
    #[serde(default)]
    pub insert_columns: Map<String, Value>,
}

impl TransformOptions {
    pub fn is_empty(&self) -> bool {
        self.rename_columns.is_empty() && self.insert_columns.is_empty()
    }

    /// Renaming keeps the field in place; an absent source field is skipped.
    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        if self.is_empty() {
            return records;
        }

        records
            .into_iter()
            .map(|record| {
                let mut data: Map<String, Value> = record
                    .data
                    .into_iter()
                    .map(|(field, value)| match self.rename_columns.get(&field) {
                        Some(renamed) => (renamed.clone(), value),
                        None => (field, value),
                    })
                    .collect();

                for (field, value) in &self.insert_columns {
                    data.insert(field.clone(), value.clone());
                }

                Record { data }
            })
            .collect()
    }
}

/// `Idle → Extracting → Transforming → Loading → Done`, or `Failed` from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Extracting,
    Transforming,
    Loading,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Extracting => "extracting",
            PipelineState::Transforming => "transforming",
            PipelineState::Loading => "loading",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub destination: String,
    pub records_written: usize,
    /// JSON body returned by an HTTP destination, if any.
    pub response: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub destination: String,
    pub records_extracted: usize,
    pub records_loaded: usize,
    pub response: Option<Value>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}
