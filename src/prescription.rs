//! Prescription analysis: the structured result of one upload.
//!
//! Field names follow the camelCase JSON the client renders. Every field
//! tolerates absence, null and loose scalar types so a partially filled
//! model reply still loads.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One medication identified on the prescription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Medicine {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub dosage: String,
    #[serde(deserialize_with = "lenient_string")]
    pub frequency: String,
    #[serde(deserialize_with = "lenient_list")]
    pub side_effects: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub warnings: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub interactions: Vec<String>,
}

/// Analysis of a whole prescription, as held in the analysis store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrescriptionAnalysis {
    #[serde(deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(deserialize_with = "lenient_medicines")]
    pub medicines: Vec<Medicine>,
    #[serde(deserialize_with = "lenient_string")]
    pub overall_risk_level: String,
    #[serde(deserialize_with = "lenient_list")]
    pub recommendations: Vec<String>,
    pub file_name: String,
    /// RFC 3339 timestamp stamped by the server.
    pub upload_date: String,
}

/// Scalar text from a value of any shape. Null and containers become empty.
fn scalar_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

/// A list, a single item, or null. Blank items are dropped.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(values) => values.into_iter().map(scalar_text).collect(),
        other => vec![scalar_text(other)],
    };
    Ok(items.into_iter().filter(|s| !s.trim().is_empty()).collect())
}

/// Medicines as a list or null. Entries that are not objects are skipped.
fn lenient_medicines<'de, D>(deserializer: D) -> Result<Vec<Medicine>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Value::deserialize(deserializer)? {
        Value::Array(values) => values,
        Value::Object(map) => vec![Value::Object(map)],
        _ => Vec::new(),
    };
    values
        .into_iter()
        .filter(Value::is_object)
        .map(|v| serde_json::from_value(v).map_err(<D::Error as serde::de::Error>::custom))
        .collect()
}

/// Overall interaction/side-effect risk. Free text from the model is kept
/// as-is in the analysis; this is the parsed view used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Unknown,
}

impl RiskLevel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => RiskLevel::Low,
            "moderate" | "medium" => RiskLevel::Moderate,
            "high" => RiskLevel::High,
            _ => RiskLevel::Unknown,
        }
    }

    /// RGB colour used for the risk label in reports.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            RiskLevel::Low => (0x28, 0xa7, 0x45),
            RiskLevel::Moderate => (0xfd, 0x7e, 0x14),
            RiskLevel::High => (0xdc, 0x35, 0x45),
            RiskLevel::Unknown => (0x33, 0x33, 0x33),
        }
    }
}

impl PrescriptionAnalysis {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::parse(&self.overall_risk_level)
    }

    /// Record where and when the analysis came from.
    pub fn stamp(&mut self, file_name: &str, uploaded_at: chrono::DateTime<chrono::Utc>) {
        self.file_name = file_name.to_string();
        self.upload_date = uploaded_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    }
}
