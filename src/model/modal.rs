//! Modal stack for managing overlays
//!
//! Confirmation prompts and notices are layered on top of the current view;
//! only the top modal receives input.

use super::dataset::DatasetId;

/// A modal overlay displayed on top of the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    /// Quit confirmation dialog
    QuitConfirm,
    /// Confirm deletion of a dataset
    ConfirmDelete { dataset_id: DatasetId, label: String },
    /// Dismissable notice
    Alert { title: String, message: String },
    /// Keyboard shortcuts
    Help,
}

impl Modal {
    pub fn alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        Modal::Alert {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// A stack of modal overlays
#[derive(Debug, Default)]
pub struct ModalStack {
    stack: Vec<Modal>,
}

impl ModalStack {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push(&mut self, modal: Modal) {
        self.stack.push(modal);
    }

    pub fn pop(&mut self) -> Option<Modal> {
        self.stack.pop()
    }

    pub fn top(&self) -> Option<&Modal> {
        self.stack.last()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Drop every overlay that refers to a dataset
    pub fn dismiss_dataset_prompts(&mut self) {
        self.stack
            .retain(|m| !matches!(m, Modal::ConfirmDelete { .. }));
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}
