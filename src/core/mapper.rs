use crate::core::{Record, Transform, TransformOptions};
use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_MATCH_LITERAL: &str = "MATCH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagStyle {
    /// `true` / `false`
    #[default]
    Bool,
    /// `1` / `0`
    Int,
}

impl FlagStyle {
    fn flag(self, matched: bool) -> Value {
        match self {
            FlagStyle::Bool => Value::Bool(matched),
            FlagStyle::Int => Value::from(u8::from(matched)),
        }
    }
}

/// Turns a status column into a flag: set only when the value is exactly the
/// literal string (case-sensitive, untrimmed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanRecast {
    /// Destination field name.
    pub field: String,
    #[serde(default = "default_match_literal")]
    pub literal: String,
    #[serde(default)]
    pub style: FlagStyle,
}

fn default_match_literal() -> String {
    DEFAULT_MATCH_LITERAL.to_string()
}

impl BooleanRecast {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            literal: default_match_literal(),
            style: FlagStyle::Bool,
        }
    }

    pub fn with_style(mut self, style: FlagStyle) -> Self {
        self.style = style;
        self
    }

    pub fn recast(&self, value: &Value) -> Value {
        let matched = matches!(value, Value::String(s) if *s == self.literal);
        self.style.flag(matched)
    }
}

/// Selects and renames a fixed set of source columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapper {
    pub columns: Vec<ColumnRename>,
    #[serde(default)]
    pub recast: Option<BooleanRecast>,
}

impl ColumnMapper {
    pub fn new<I, F, T>(columns: I) -> Self
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<String>,
        T: Into<String>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|(from, to)| ColumnRename {
                    from: from.into(),
                    to: to.into(),
                })
                .collect(),
            recast: None,
        }
    }

    pub fn with_recast(mut self, recast: BooleanRecast) -> Self {
        self.recast = Some(recast);
        self
    }

    /// Output rows carry exactly the mapped fields, in mapping order.
    pub fn map_records(&self, data: Vec<Record>) -> Result<Vec<Record>> {
        data.into_iter()
            .enumerate()
            .map(|(row, record)| {
                let mut mapped = Map::with_capacity(self.columns.len());

                for column in &self.columns {
                    let value = record.data.get(&column.from).cloned().ok_or_else(|| {
                        EtlError::MissingColumnError {
                            column: column.from.clone(),
                            row,
                        }
                    })?;

                    let value = match &self.recast {
                        Some(recast) if recast.field == column.to => recast.recast(&value),
                        _ => value,
                    };
                    mapped.insert(column.to.clone(), value);
                }

                Ok(Record { data: mapped })
            })
            .collect()
    }
}

impl Transform for ColumnMapper {
    fn transform(&self, data: Vec<Record>, options: &TransformOptions) -> Result<Vec<Record>> {
        let mapped = self.map_records(data)?;
        tracing::debug!(
            "Mapped {} records onto {} fields",
            mapped.len(),
            self.columns.len()
        );
        Ok(options.apply(mapped))
    }
}
