//! Snapshot of the user's recent uploads

use super::dataset::{DatasetId, DatasetRecord};

/// Shown in place of a display number for datasets not in the snapshot
pub const MISSING_NUMBER: &str = "-";

/// Newest-first list of datasets as last reported by the server
#[derive(Debug, Default)]
pub struct DatasetHistory {
    records: Vec<DatasetRecord>,
    /// Ticket of the newest refresh applied so far
    applied_ticket: u64,
}

impl DatasetHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[DatasetRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DatasetRecord> {
        self.records.get(index)
    }

    pub fn contains(&self, id: DatasetId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: DatasetId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// Apply the result of a refresh issued with `ticket`.
    ///
    /// Returns false (and leaves the snapshot alone) when a newer refresh has
    /// already been applied.
    pub fn apply(&mut self, ticket: u64, records: Vec<DatasetRecord>) -> bool {
        if ticket < self.applied_ticket {
            return false;
        }
        self.applied_ticket = ticket;
        self.records = records;
        true
    }

    /// 1-based number counted from the oldest visible dataset
    pub fn display_number(&self, id: DatasetId) -> Option<usize> {
        self.position(id).map(|index| self.records.len() - index)
    }

    pub fn display_label(&self, id: DatasetId) -> String {
        self.display_number(id)
            .map(|n| n.to_string())
            .unwrap_or_else(|| MISSING_NUMBER.to_string())
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.applied_ticket = 0;
    }
}
