//! Login form

use crate::action::Action;
use crate::component::Component;
use crate::components::layout::calculate_auth_layout;
use crate::components::text_field::TextField;
use crate::components::help_bar;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub const LOGIN_FAILED: &str = "Login failed. Check credentials.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Username,
    Password,
}

pub struct LoginComponent {
    username: TextField,
    password: TextField,
    focus: Field,
    /// Inline error under the fields
    pub error: Option<String>,
    busy: bool,
}

impl Default for LoginComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginComponent {
    pub fn new() -> Self {
        Self {
            username: TextField::new(),
            password: TextField::masked(),
            focus: Field::Username,
            error: None,
            busy: false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn begin(&mut self) {
        self.busy = true;
        self.error = None;
    }

    pub fn fail(&mut self, message: String) {
        self.busy = false;
        self.error = Some(message);
    }

    /// Forget everything typed, e.g. after a successful login or a logout
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn focused_field(&mut self) -> &mut TextField {
        match self.focus {
            Field::Username => &mut self.username,
            Field::Password => &mut self.password,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Field::Username => Field::Password,
            Field::Password => Field::Username,
        };
    }

    fn submit(&self) -> Option<Action> {
        if self.busy {
            return None;
        }
        Some(Action::SubmitLogin {
            username: self.username.value.trim().to_string(),
            password: self.password.value.clone(),
        })
    }
}

impl Component for LoginComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(match key.code {
                KeyCode::Char('r') => Some(Action::ShowRegister),
                _ => None,
            });
        }
        let action = match key.code {
            KeyCode::Esc => Some(Action::OpenQuitDialog),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.toggle_focus();
                None
            }
            KeyCode::Enter => match self.focus {
                Field::Username => {
                    self.focus = Field::Password;
                    None
                }
                Field::Password => self.submit(),
            },
            KeyCode::Backspace => {
                self.focused_field().pop();
                None
            }
            KeyCode::Char(c) => {
                self.focused_field().push(c);
                None
            }
            _ => None,
        };
        Ok(action)
    }

    fn handle_paste_event(&mut self, text: &str) -> Result<Option<Action>> {
        self.focused_field().push_str(text);
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        frame.render_widget(Clear, area);
        let (card, help) = calculate_auth_layout(area, 12);

        let mut lines = vec![
            Line::from(Span::styled(
                "Sign in to continue to Chem.Vis",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            self.username.line("Username", self.focus == Field::Username),
            self.password.line("Password", self.focus == Field::Password),
            Line::from(""),
        ];

        if self.busy {
            lines.push(Line::from(Span::styled(
                "Signing in...",
                Style::default().fg(Color::Yellow),
            )));
        } else if let Some(ref error) = self.error {
            lines.push(Line::from(Span::styled(
                format!("Error: {}", error),
                Style::default().fg(Color::Red),
            )));
        }

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Welcome Back ")
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
                .border_style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(paragraph, card);

        frame.render_widget(
            help_bar(&[
                ("Enter", "Sign in"),
                ("Tab", "Next field"),
                ("Ctrl+r", "Create account"),
                ("Esc", "Quit"),
            ]),
            help,
        );
        Ok(())
    }
}
