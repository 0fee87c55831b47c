//! UI Components
//!
//! Each component encapsulates its own state, event handling, and rendering logic.
//! Components communicate through Actions rather than direct state mutation.

pub mod dashboard;
pub mod dialogs;
pub mod help_dialog;
pub mod layout;
pub mod login;
pub mod register;
pub mod sidebar;
pub mod table;
pub mod text_field;
pub mod upload;

pub use dashboard::DashboardComponent;
pub use dialogs::{AlertDialog, ConfirmDeleteDialog, QuitDialog};
pub use help_dialog::HelpDialog;
pub use layout::{calculate_main_layout, centered_popup, help_bar};
pub use login::LoginComponent;
pub use register::RegisterComponent;
pub use sidebar::SidebarComponent;
pub use upload::UploadComponent;
