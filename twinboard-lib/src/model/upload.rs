//! Uploaded machine datasets.

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::UploadError;

/// A time-series dataset exported from a machine.
///
/// Only the fields the dashboard reads are typed; anything else in the
/// upload is kept in `extra` so it reaches the data-science service intact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub fields: Vec<MachineField>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nums: Vec<Measurement>,
}

/// A single sample of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(deserialize_with = "lenient_number")]
    pub value: f64,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl MachineData {
    /// Parses an uploaded file.
    ///
    /// The bytes must be valid JSON. A document that is valid JSON but does
    /// not look like a machine export is accepted as an empty dataset.
    pub fn parse(bytes: &[u8]) -> Result<Self, UploadError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Ok(Self::from_value(value))
    }

    /// Reads a dataset out of an arbitrary JSON value.
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value(value) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("upload is not a machine export, treating as empty: {}", e);
                Self::default()
            }
        }
    }

    /// Number of samples in the first field.
    pub fn data_points(&self) -> usize {
        self.fields.first().map(|f| f.nums.len()).unwrap_or(0)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("number out of range")),
        Value::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!(
            "expected a number, found {}",
            other
        ))),
    }
}
