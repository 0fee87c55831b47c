//! Dataset payloads returned by the analytics backend

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned dataset identifier
pub type DatasetId = u64;

/// One entry of the upload history (also the body returned by an upload)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: DatasetId,
    #[serde(with = "timestamp")]
    pub uploaded_at: DateTime<Utc>,
    /// Stored file path echoed back by the server
    #[serde(default)]
    pub file: Option<String>,
}

impl DatasetRecord {
    pub fn formatted_date(&self) -> String {
        format_date(&self.uploaded_at)
    }
}

/// Full summary for a single dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDetail {
    #[serde(default)]
    pub dataset_id: Option<DatasetId>,
    #[serde(with = "timestamp")]
    pub uploaded_at: DateTime<Utc>,
    pub summary: AggregateStats,
    #[serde(default)]
    pub data: Vec<EquipmentRow>,
}

impl DatasetDetail {
    pub fn imported_date(&self) -> String {
        format_date(&self.uploaded_at)
    }
}

/// Aggregate statistics computed server-side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_count: u64,
    pub flowrate: ParameterStats,
    pub pressure: ParameterStats,
    pub temperature: ParameterStats,
    #[serde(default)]
    pub type_distribution: Vec<TypeCount>,
}

/// min / avg / max of one parameter; all absent when the dataset has no rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterStats {
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ParameterStats {
    /// Average rounded to two decimals, "-" when missing
    pub fn avg_label(&self) -> String {
        self.avg
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn range_label(&self) -> String {
        format!(
            "Min: {} • Max: {}",
            format_reading(self.min),
            format_reading(self.max)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    pub equipment_type: String,
    pub count: u64,
}

/// A single parsed CSV row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRow {
    pub id: u64,
    pub equipment_name: String,
    pub equipment_type: String,
    pub flowrate: Option<f64>,
    pub pressure: Option<f64>,
    pub temperature: Option<f64>,
}

impl EquipmentRow {
    /// Table cells with a 1-based row number in front
    pub fn cells(&self, row_number: usize) -> Vec<String> {
        vec![
            row_number.to_string(),
            self.equipment_name.clone(),
            self.equipment_type.clone(),
            format_reading(self.flowrate),
            format_reading(self.pressure),
            format_reading(self.temperature),
        ]
    }
}

/// Render an optional reading without trailing zeros noise
pub fn format_reading(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", v as i64),
        Some(v) => format!("{}", v),
        None => "-".to_string(),
    }
}

/// Local calendar date of a server timestamp
pub fn format_date(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

/// Accepts RFC 3339 timestamps and the naive form Django emits with USE_TZ off
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| D::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
    }
}
