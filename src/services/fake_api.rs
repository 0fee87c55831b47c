//! Scripted in-memory `DashboardApi` used by unit tests

use crate::model::dataset::{
    AggregateStats, DatasetDetail, DatasetId, DatasetRecord, EquipmentRow, ParameterStats,
    TypeCount,
};
use crate::model::session::Session;
use crate::services::api::{ApiError, DashboardApi};
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

struct Script {
    login: Result<Session, ApiError>,
    register: Result<(), ApiError>,
    upload: Result<DatasetRecord, ApiError>,
    history: Result<Vec<DatasetRecord>, ApiError>,
    summaries: HashMap<DatasetId, Result<DatasetDetail, ApiError>>,
    delete: Result<(), ApiError>,
}

/// Returns canned responses and records every call by operation name
pub struct ScriptedApi {
    script: Mutex<Script>,
    calls: Mutex<Vec<String>>,
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self {
            script: Mutex::new(Script {
                login: Ok(Session {
                    access: "access-1".to_string(),
                    refresh: "refresh-1".to_string(),
                }),
                register: Ok(()),
                upload: Ok(record(1)),
                history: Ok(Vec::new()),
                summaries: HashMap::new(),
                delete: Ok(()),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == op).count()
    }

    pub fn set_login(&self, result: Result<Session, ApiError>) {
        self.script.lock().unwrap().login = result;
    }

    pub fn set_register(&self, result: Result<(), ApiError>) {
        self.script.lock().unwrap().register = result;
    }

    pub fn set_upload(&self, result: Result<DatasetRecord, ApiError>) {
        self.script.lock().unwrap().upload = result;
    }

    pub fn set_history(&self, result: Result<Vec<DatasetRecord>, ApiError>) {
        self.script.lock().unwrap().history = result;
    }

    pub fn set_summary(&self, id: DatasetId, result: Result<DatasetDetail, ApiError>) {
        self.script.lock().unwrap().summaries.insert(id, result);
    }

    pub fn set_delete(&self, result: Result<(), ApiError>) {
        self.script.lock().unwrap().delete = result;
    }

    fn record_call(&self, op: &str) {
        self.calls.lock().unwrap().push(op.to_string());
    }
}

impl DashboardApi for ScriptedApi {
    fn login(&self, _username: &str, _password: &str) -> Result<Session, ApiError> {
        self.record_call("login");
        self.script.lock().unwrap().login.clone()
    }

    fn register(&self, _username: &str, _password: &str) -> Result<(), ApiError> {
        self.record_call("register");
        self.script.lock().unwrap().register.clone()
    }

    fn upload(&self, _path: &Path) -> Result<DatasetRecord, ApiError> {
        self.record_call("upload");
        self.script.lock().unwrap().upload.clone()
    }

    fn list_history(&self) -> Result<Vec<DatasetRecord>, ApiError> {
        self.record_call("list_history");
        self.script.lock().unwrap().history.clone()
    }

    fn fetch_summary(&self, id: DatasetId) -> Result<DatasetDetail, ApiError> {
        self.record_call("fetch_summary");
        self.script
            .lock()
            .unwrap()
            .summaries
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Ok(detail(3)))
    }

    fn delete_dataset(&self, _id: DatasetId) -> Result<(), ApiError> {
        self.record_call("delete_dataset");
        self.script.lock().unwrap().delete.clone()
    }
}

/// History record whose upload time increases with its id
pub fn record(id: DatasetId) -> DatasetRecord {
    DatasetRecord {
        id,
        uploaded_at: Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap()
            + chrono::Duration::hours(id as i64),
        file: Some(format!("uploads/dataset_{}.csv", id)),
    }
}

/// Newest-first history for the given ids
pub fn history(ids: &[DatasetId]) -> Vec<DatasetRecord> {
    ids.iter().map(|id| record(*id)).collect()
}

/// Summary with `rows` synthetic equipment rows
pub fn detail(rows: usize) -> DatasetDetail {
    let data: Vec<EquipmentRow> = (0..rows)
        .map(|i| EquipmentRow {
            id: i as u64 + 100,
            equipment_name: format!("Unit-{}", i + 1),
            equipment_type: if i % 2 == 0 { "Pump" } else { "Valve" }.to_string(),
            flowrate: Some(100.0 + i as f64),
            pressure: Some(5.0 + i as f64 / 10.0),
            temperature: if i == 0 { None } else { Some(90.0 + i as f64) },
        })
        .collect();
    let pumps = data.iter().filter(|r| r.equipment_type == "Pump").count() as u64;

    DatasetDetail {
        dataset_id: Some(1),
        uploaded_at: record(1).uploaded_at,
        summary: AggregateStats {
            total_count: rows as u64,
            flowrate: ParameterStats {
                avg: Some(101.5),
                min: Some(100.0),
                max: Some(103.0),
            },
            pressure: ParameterStats {
                avg: Some(5.15),
                min: Some(5.0),
                max: Some(5.3),
            },
            temperature: ParameterStats::default(),
            type_distribution: vec![
                TypeCount {
                    equipment_type: "Pump".to_string(),
                    count: pumps,
                },
                TypeCount {
                    equipment_type: "Valve".to_string(),
                    count: rows as u64 - pumps,
                },
            ],
        },
        data,
    }
}
