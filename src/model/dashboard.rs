//! Dashboard state for the selected dataset
//!
//! Holds the summary load state plus the derived presentation data (stat
//! cards, chart series, table preview) shared by the terminal view and the
//! PDF report.

use super::dataset::{AggregateStats, DatasetDetail, DatasetId, EquipmentRow};
use crate::services::api::ApiError;

pub const LOAD_FAILED: &str = "Failed to load dataset summary.";

/// Column headers of the on-screen preview
pub const PREVIEW_HEADERS: [&str; 6] = [
    "ID",
    "Equipment Name",
    "Type",
    "Flowrate",
    "Pressure",
    "Temperature",
];

#[derive(Debug, Clone, PartialEq)]
pub enum SummaryState {
    Loading,
    Failed(String),
    Ready(Box<DatasetDetail>),
}

/// Summary fetch state of one selected dataset
#[derive(Debug)]
pub struct DashboardState {
    dataset_id: DatasetId,
    ticket: u64,
    summary: SummaryState,
}

impl DashboardState {
    /// Fresh state for a selection whose summary request carries `ticket`
    pub fn loading(dataset_id: DatasetId, ticket: u64) -> Self {
        Self {
            dataset_id,
            ticket,
            summary: SummaryState::Loading,
        }
    }

    pub fn dataset_id(&self) -> DatasetId {
        self.dataset_id
    }

    pub fn summary(&self) -> &SummaryState {
        &self.summary
    }

    pub fn detail(&self) -> Option<&DatasetDetail> {
        match &self.summary {
            SummaryState::Ready(detail) => Some(detail),
            _ => None,
        }
    }

    /// Apply a summary response; ignored unless it answers the current request
    pub fn apply(
        &mut self,
        dataset_id: DatasetId,
        ticket: u64,
        result: Result<DatasetDetail, ApiError>,
    ) -> bool {
        if dataset_id != self.dataset_id || ticket != self.ticket {
            return false;
        }
        self.summary = match result {
            Ok(detail) => SummaryState::Ready(Box::new(detail)),
            Err(_) => SummaryState::Failed(LOAD_FAILED.to_string()),
        };
        true
    }
}

/// One summary tile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    /// "Min: x • Max: y" line under parameter averages
    pub range: Option<String>,
}

pub fn stat_cards(stats: &AggregateStats) -> [StatCard; 4] {
    [
        StatCard {
            label: "Total Count",
            value: stats.total_count.to_string(),
            range: None,
        },
        StatCard {
            label: "Avg Flowrate",
            value: stats.flowrate.avg_label(),
            range: Some(stats.flowrate.range_label()),
        },
        StatCard {
            label: "Avg Pressure",
            value: stats.pressure.avg_label(),
            range: Some(stats.pressure.range_label()),
        },
        StatCard {
            label: "Avg Temp",
            value: stats.temperature.avg_label(),
            range: Some(stats.temperature.range_label()),
        },
    ]
}

/// (equipment type, count) pairs in server order
pub fn type_bars(stats: &AggregateStats) -> Vec<(String, u64)> {
    stats
        .type_distribution
        .iter()
        .map(|t| (t.equipment_type.clone(), t.count))
        .collect()
}

/// Flowrate and pressure across the leading rows of a dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendSeries {
    /// Equipment names, one per sampled row
    pub labels: Vec<String>,
    pub flowrate: Vec<(f64, f64)>,
    pub pressure: Vec<(f64, f64)>,
}

impl TrendSeries {
    /// Sample the first `limit` rows; missing readings leave gaps
    pub fn from_rows(rows: &[EquipmentRow], limit: usize) -> Self {
        let mut series = TrendSeries::default();
        for (i, row) in rows.iter().take(limit).enumerate() {
            let x = i as f64;
            series.labels.push(row.equipment_name.clone());
            if let Some(v) = row.flowrate {
                series.flowrate.push((x, v));
            }
            if let Some(v) = row.pressure {
                series.pressure.push((x, v));
            }
        }
        series
    }

    pub fn is_empty(&self) -> bool {
        self.flowrate.is_empty() && self.pressure.is_empty()
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        [0.0, self.labels.len().saturating_sub(1).max(1) as f64]
    }

    /// Value range covering both series, always including zero
    pub fn y_bounds(&self) -> [f64; 2] {
        let values = self.flowrate.iter().chain(self.pressure.iter()).map(|p| p.1);
        let (lo, hi) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if hi - lo < f64::EPSILON {
            [lo, lo + 1.0]
        } else {
            [lo, hi * 1.1]
        }
    }
}

/// Leading rows for the on-screen table
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub rows: Vec<Vec<String>>,
    pub total: usize,
}

impl Preview {
    pub fn from_rows(rows: &[EquipmentRow], limit: usize) -> Self {
        Self {
            rows: rows
                .iter()
                .take(limit)
                .enumerate()
                .map(|(i, row)| row.cells(i + 1))
                .collect(),
            total: rows.len(),
        }
    }

    /// "Showing n of N rows" when some rows are left out
    pub fn omitted_note(&self) -> Option<String> {
        (self.total > self.rows.len())
            .then(|| format!("Showing {} of {} rows", self.rows.len(), self.total))
    }
}
