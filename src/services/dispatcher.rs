//! Background request dispatcher
//!
//! Runs API calls and report exports on short-lived worker threads and hands
//! their results back to the UI thread, which drains them on every tick.
//! Responses carry whatever tag (epoch, ticket, dataset id) the caller needs
//! to recognise stale results.

use crate::model::dataset::{DatasetDetail, DatasetId, DatasetRecord};
use crate::model::session::Session;
use crate::services::api::{ApiError, DashboardApi};
use crate::services::report::{self, ReportError, ReportJob, ReportOutcome};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

/// Work the UI thread can hand off
#[derive(Debug, Clone)]
pub enum Request {
    Login { username: String, password: String },
    Register { username: String, password: String },
    Upload { epoch: u64, path: PathBuf },
    ListHistory { epoch: u64, ticket: u64 },
    FetchSummary { epoch: u64, dataset_id: DatasetId, ticket: u64 },
    DeleteDataset { epoch: u64, dataset_id: DatasetId },
    ExportReport(Box<ReportJob>),
}

impl Request {
    fn name(&self) -> &'static str {
        match self {
            Request::Login { .. } => "login",
            Request::Register { .. } => "register",
            Request::Upload { .. } => "upload",
            Request::ListHistory { .. } => "list_history",
            Request::FetchSummary { .. } => "fetch_summary",
            Request::DeleteDataset { .. } => "delete_dataset",
            Request::ExportReport(_) => "export_report",
        }
    }
}

/// Result of a finished request
#[derive(Debug)]
pub enum Response {
    LoggedIn(Result<Session, ApiError>),
    Registered(Result<(), ApiError>),
    Uploaded {
        epoch: u64,
        result: Result<DatasetRecord, ApiError>,
    },
    HistoryLoaded {
        epoch: u64,
        ticket: u64,
        result: Result<Vec<DatasetRecord>, ApiError>,
    },
    SummaryLoaded {
        epoch: u64,
        dataset_id: DatasetId,
        ticket: u64,
        result: Result<DatasetDetail, ApiError>,
    },
    Deleted {
        epoch: u64,
        dataset_id: DatasetId,
        result: Result<(), ApiError>,
    },
    ReportFinished(Result<ReportOutcome, ReportError>),
}

/// Monotonic counter shared between the UI thread and the history poller
#[derive(Debug, Clone, Default)]
pub struct TicketCounter(Arc<AtomicU64>);

impl TicketCounter {
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// One worker thread per request
    Threaded,
    /// Run on the calling thread; results still arrive through the channel
    #[cfg_attr(not(test), allow(dead_code))]
    Inline,
}

pub struct Dispatcher {
    api: Arc<dyn DashboardApi>,
    sender: Sender<Response>,
    receiver: Receiver<Response>,
    tickets: TicketCounter,
    mode: Mode,
}

impl Dispatcher {
    pub fn threaded(api: Arc<dyn DashboardApi>) -> Self {
        Self::with_mode(api, Mode::Threaded)
    }

    /// Deterministic dispatcher for tests: `submit` completes before returning
    #[cfg(test)]
    pub fn inline(api: Arc<dyn DashboardApi>) -> Self {
        Self::with_mode(api, Mode::Inline)
    }

    fn with_mode(api: Arc<dyn DashboardApi>, mode: Mode) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            api,
            sender,
            receiver,
            tickets: TicketCounter::default(),
            mode,
        }
    }

    pub fn api(&self) -> Arc<dyn DashboardApi> {
        Arc::clone(&self.api)
    }

    /// Channel end for other producers (the history poller)
    pub fn sender(&self) -> Sender<Response> {
        self.sender.clone()
    }

    pub fn tickets(&self) -> TicketCounter {
        self.tickets.clone()
    }

    pub fn next_ticket(&self) -> u64 {
        self.tickets.next()
    }

    pub fn submit(&self, request: Request) {
        tracing::debug!("dispatching {}", request.name());
        let api = Arc::clone(&self.api);
        let sender = self.sender.clone();
        match self.mode {
            Mode::Threaded => {
                thread::spawn(move || {
                    let response = execute(api.as_ref(), request);
                    // receiver gone means the app is shutting down
                    let _ = sender.send(response);
                });
            }
            Mode::Inline => {
                let _ = sender.send(execute(api.as_ref(), request));
            }
        }
    }

    /// Collect every response that has arrived so far
    pub fn drain(&self) -> Vec<Response> {
        let mut responses = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(response) => responses.push(response),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        responses
    }
}

fn execute(api: &dyn DashboardApi, request: Request) -> Response {
    match request {
        Request::Login { username, password } => Response::LoggedIn(api.login(&username, &password)),
        Request::Register { username, password } => {
            Response::Registered(api.register(&username, &password))
        }
        Request::Upload { epoch, path } => Response::Uploaded {
            epoch,
            result: api.upload(&path),
        },
        Request::ListHistory { epoch, ticket } => Response::HistoryLoaded {
            epoch,
            ticket,
            result: api.list_history(),
        },
        Request::FetchSummary {
            epoch,
            dataset_id,
            ticket,
        } => Response::SummaryLoaded {
            epoch,
            dataset_id,
            ticket,
            result: api.fetch_summary(dataset_id),
        },
        Request::DeleteDataset { epoch, dataset_id } => Response::Deleted {
            epoch,
            dataset_id,
            result: api.delete_dataset(dataset_id),
        },
        Request::ExportReport(job) => Response::ReportFinished(report::generate(&job)),
    }
}
