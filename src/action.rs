//! Action enum - All possible application actions
//!
//! Actions are discrete operations that the application can perform.
//! Components emit Actions in response to events, and the App processes
//! them to update state.

use crate::model::dataset::DatasetId;
use std::fmt;

/// All possible actions in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ─────────────────────────────────────────────────────────────────────────
    // App Lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    /// Regular tick; drains finished background requests
    Tick,
    /// Terminal was resized
    Resize(u16, u16),
    /// Force quit without confirmation
    ForceQuit,

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────
    /// Move to next item in the history list
    NextItem,
    /// Move to previous item in the history list
    PrevItem,
    /// Jump to first item
    FirstItem,
    /// Jump to last item
    LastItem,

    // ─────────────────────────────────────────────────────────────────────────
    // Scrolling
    // ─────────────────────────────────────────────────────────────────────────
    /// Scroll dashboard table up one line
    ScrollUp,
    /// Scroll dashboard table down one line
    ScrollDown,
    /// Scroll dashboard table up one page
    PageUp,
    /// Scroll dashboard table down one page
    PageDown,

    // ─────────────────────────────────────────────────────────────────────────
    // Modals
    // ─────────────────────────────────────────────────────────────────────────
    /// Open quit confirmation dialog
    OpenQuitDialog,
    /// Open help dialog showing all keyboard shortcuts
    OpenHelp,
    /// Close the current modal
    CloseModal,
    /// Confirm the current modal action
    ConfirmModal,

    // ─────────────────────────────────────────────────────────────────────────
    // Authentication
    // ─────────────────────────────────────────────────────────────────────────
    /// Submit the login form
    SubmitLogin { username: String, password: String },
    /// Submit the registration form
    SubmitRegister {
        username: String,
        password: String,
        confirm: String,
    },
    /// Switch to the login form
    ShowLogin,
    /// Switch to the registration form
    ShowRegister,
    /// Drop credentials and return to login
    Logout,

    // ─────────────────────────────────────────────────────────────────────────
    // Datasets
    // ─────────────────────────────────────────────────────────────────────────
    /// Show the dashboard for a dataset
    SelectDataset(DatasetId),
    /// Show the dashboard for the highlighted history entry
    SelectHighlighted,
    /// Ask to delete the highlighted history entry
    RequestDelete,
    /// Return to the upload view
    NewUpload,
    /// Refresh the history list now
    RefreshHistory,

    // ─────────────────────────────────────────────────────────────────────────
    // Upload
    // ─────────────────────────────────────────────────────────────────────────
    /// Start typing a file path
    EnterPathMode,
    /// Stop typing a file path
    ExitPathMode,
    /// Offer a file (typed or dropped) for upload
    OfferFile(String),
    /// Send the pending file
    SubmitUpload,

    // ─────────────────────────────────────────────────────────────────────────
    // Report
    // ─────────────────────────────────────────────────────────────────────────
    /// Export the selected dataset as a PDF report
    ExportPdf,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Tick => write!(f, "Tick"),
            Action::Resize(w, h) => write!(f, "Resize({}, {})", w, h),
            Action::ForceQuit => write!(f, "ForceQuit"),
            Action::NextItem => write!(f, "NextItem"),
            Action::PrevItem => write!(f, "PrevItem"),
            Action::FirstItem => write!(f, "FirstItem"),
            Action::LastItem => write!(f, "LastItem"),
            Action::ScrollUp => write!(f, "ScrollUp"),
            Action::ScrollDown => write!(f, "ScrollDown"),
            Action::PageUp => write!(f, "PageUp"),
            Action::PageDown => write!(f, "PageDown"),
            Action::OpenQuitDialog => write!(f, "OpenQuitDialog"),
            Action::OpenHelp => write!(f, "OpenHelp"),
            Action::CloseModal => write!(f, "CloseModal"),
            Action::ConfirmModal => write!(f, "ConfirmModal"),
            // credentials stay out of logs
            Action::SubmitLogin { username, .. } => write!(f, "SubmitLogin({})", username),
            Action::SubmitRegister { username, .. } => write!(f, "SubmitRegister({})", username),
            Action::ShowLogin => write!(f, "ShowLogin"),
            Action::ShowRegister => write!(f, "ShowRegister"),
            Action::Logout => write!(f, "Logout"),
            Action::SelectDataset(id) => write!(f, "SelectDataset({})", id),
            Action::SelectHighlighted => write!(f, "SelectHighlighted"),
            Action::RequestDelete => write!(f, "RequestDelete"),
            Action::NewUpload => write!(f, "NewUpload"),
            Action::RefreshHistory => write!(f, "RefreshHistory"),
            Action::EnterPathMode => write!(f, "EnterPathMode"),
            Action::ExitPathMode => write!(f, "ExitPathMode"),
            Action::OfferFile(path) => write!(f, "OfferFile({})", path),
            Action::SubmitUpload => write!(f, "SubmitUpload"),
            Action::ExportPdf => write!(f, "ExportPdf"),
        }
    }
}
