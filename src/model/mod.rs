//! Model layer - centralized state management
//!
//! This module contains all state-related types:
//! - `dataset` - Payloads returned by the backend
//! - `session` - Authentication state and token persistence
//! - `history` - Newest-first dataset snapshot
//! - `upload` / `dashboard` - Per-view state
//! - `view` / `modal` - Navigation and overlays

pub mod dashboard;
pub mod dataset;
pub mod history;
pub mod modal;
pub mod session;
pub mod upload;
pub mod view;

// Re-export commonly used types
pub use dataset::DatasetId;
pub use history::DatasetHistory;
pub use session::AuthSession;
pub use view::{AuthScreen, View};
