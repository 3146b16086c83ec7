use crate::core::{Record, Transform, TransformOptions};
use crate::utils::error::Result;
use serde_json::Value;

/// Forwards records unchanged apart from the transform options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Transform for Passthrough {
    fn transform(&self, data: Vec<Record>, options: &TransformOptions) -> Result<Vec<Record>> {
        Ok(options.apply(data))
    }
}

/// Uppercases every string value; other values are kept as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct UppercaseText;

impl Transform for UppercaseText {
    fn transform(&self, data: Vec<Record>, options: &TransformOptions) -> Result<Vec<Record>> {
        let upper = data
            .into_iter()
            .map(|record| {
                record
                    .data
                    .into_iter()
                    .map(|(field, value)| match value {
                        Value::String(s) => (field, Value::String(s.to_uppercase())),
                        other => (field, other),
                    })
                    .collect::<Record>()
            })
            .collect();
        Ok(options.apply(upper))
    }
}
