//! Periodic history refresh
//!
//! One poller lives for exactly one authenticated epoch. It sleeps on its stop
//! channel, so dropping the poller wakes the thread and ends it at once;
//! whatever it fetched last is tagged with its epoch and ignored afterwards.

use crate::services::api::DashboardApi;
use crate::services::dispatcher::{Response, TicketCounter};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct HistoryPoller {
    epoch: u64,
    /// Dropping this ends the polling thread
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl HistoryPoller {
    /// Start polling every `interval`. The first fetch happens after one
    /// interval; the caller issues the immediate refresh itself.
    pub fn start(
        api: Arc<dyn DashboardApi>,
        responses: Sender<Response>,
        tickets: TicketCounter,
        epoch: u64,
        interval: Duration,
    ) -> Self {
        let (stop, stopped) = mpsc::channel::<()>();

        let handle = thread::spawn(move || loop {
            match stopped.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {}
                // explicit stop or the poller was dropped
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
            let ticket = tickets.next();
            let result = api.list_history();
            if let Err(e) = &result {
                tracing::debug!("history poll failed: {}", e);
            }
            let response = Response::HistoryLoaded {
                epoch,
                ticket,
                result,
            };
            if responses.send(response).is_err() {
                break;
            }
        });

        tracing::debug!("history poller started for epoch {}", epoch);
        Self {
            epoch,
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread to end without waiting for it
    pub fn stop(&mut self) {
        if self.stop.take().is_some() {
            tracing::debug!("history poller stopped for epoch {}", self.epoch);
        }
    }
}

impl Drop for HistoryPoller {
    fn drop(&mut self) {
        self.stop();
        // a thread that already ended can be joined without blocking
        if let Some(handle) = self.handle.take() {
            if handle.is_finished() && handle.join().is_err() {
                tracing::warn!("history poller for epoch {} panicked", self.epoch);
            }
        }
    }
}
