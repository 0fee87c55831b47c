//! Top-level screens of the application

use crate::model::dataset::DatasetId;

/// Which form is shown while logged out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScreen {
    Login,
    Register,
}

/// The screen currently on display
///
/// The selected dataset lives inside `Dashboard`, so there is no way to be on
/// the dashboard without a selection or to hold a selection while logged out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    LoggedOut(AuthScreen),
    Upload,
    Dashboard { dataset_id: DatasetId },
}

impl View {
    /// Initial view for the given authentication state
    pub fn initial(authenticated: bool) -> Self {
        if authenticated {
            View::Upload
        } else {
            View::LoggedOut(AuthScreen::Login)
        }
    }

    pub fn selected_dataset(&self) -> Option<DatasetId> {
        match self {
            View::Dashboard { dataset_id } => Some(*dataset_id),
            _ => None,
        }
    }

    pub fn is_logged_out(&self) -> bool {
        matches!(self, View::LoggedOut(_))
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::LoggedOut(AuthScreen::Login) => "Welcome Back",
            View::LoggedOut(AuthScreen::Register) => "Create Account",
            View::Upload => "Upload Equipment Data",
            View::Dashboard { .. } => "Analytics Overview",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_view() {
        assert_eq!(View::initial(false), View::LoggedOut(AuthScreen::Login));
        assert_eq!(View::initial(true), View::Upload);
    }

    #[test]
    fn test_selection_only_on_dashboard() {
        assert_eq!(View::Dashboard { dataset_id: 4 }.selected_dataset(), Some(4));
        assert_eq!(View::Upload.selected_dataset(), None);
        assert_eq!(View::LoggedOut(AuthScreen::Register).selected_dataset(), None);
    }
}
