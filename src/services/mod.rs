//! External service interactions
//!
//! This module contains services for interacting with external systems:
//! - The analytics REST backend
//! - Durable token storage
//! - Background request dispatch and history polling
//! - Chart rasterisation and PDF report export

pub mod api;
pub mod chart_render;
pub mod dispatcher;
#[cfg(test)]
pub mod fake_api;
pub mod poller;
pub mod report;
pub mod token_store;

pub use api::{ApiError, HttpApi};
pub use dispatcher::{Dispatcher, Request, Response};
pub use poller::HistoryPoller;
pub use token_store::TokenStore;
