//! Registration form

use crate::action::Action;
use crate::component::Component;
use crate::components::help_bar;
use crate::components::layout::calculate_auth_layout;
use crate::components::text_field::TextField;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub const REGISTER_FAILED: &str = "Registration failed";
pub const REGISTERED: &str = "Registration successful! Please login.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Username,
    Password,
    Confirm,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Field::Username => Field::Password,
            Field::Password => Field::Confirm,
            Field::Confirm => Field::Username,
        }
    }

    fn prev(self) -> Self {
        match self {
            Field::Username => Field::Confirm,
            Field::Password => Field::Username,
            Field::Confirm => Field::Password,
        }
    }
}

pub struct RegisterComponent {
    username: TextField,
    password: TextField,
    confirm: TextField,
    focus: Field,
    pub error: Option<String>,
    busy: bool,
}

impl Default for RegisterComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterComponent {
    pub fn new() -> Self {
        Self {
            username: TextField::new(),
            password: TextField::masked(),
            confirm: TextField::masked(),
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

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn focused_field(&mut self) -> &mut TextField {
        match self.focus {
            Field::Username => &mut self.username,
            Field::Password => &mut self.password,
            Field::Confirm => &mut self.confirm,
        }
    }

    fn submit(&self) -> Option<Action> {
        if self.busy {
            return None;
        }
        Some(Action::SubmitRegister {
            username: self.username.value.trim().to_string(),
            password: self.password.value.clone(),
            confirm: self.confirm.value.clone(),
        })
    }
}

impl Component for RegisterComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(match key.code {
                KeyCode::Char('l') => Some(Action::ShowLogin),
                _ => None,
            });
        }
        let action = match key.code {
            KeyCode::Esc => Some(Action::ShowLogin),
            KeyCode::Tab | KeyCode::Down => {
                self.focus = self.focus.next();
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = self.focus.prev();
                None
            }
            KeyCode::Enter => match self.focus {
                Field::Confirm => self.submit(),
                other => {
                    self.focus = other.next();
                    None
                }
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
        let (card, help) = calculate_auth_layout(area, 13);

        let mut lines = vec![
            Line::from(Span::styled(
                "Create an account to start analysing equipment data",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            self.username.line("Username", self.focus == Field::Username),
            self.password.line("Password", self.focus == Field::Password),
            self.confirm.line("Confirm", self.focus == Field::Confirm),
            Line::from(""),
        ];

        if self.busy {
            lines.push(Line::from(Span::styled(
                "Creating account...",
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
                .title(" Create Account ")
                .title_style(
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )
                .border_style(Style::default().fg(Color::Green)),
        );
        frame.render_widget(paragraph, card);

        frame.render_widget(
            help_bar(&[
                ("Enter", "Register"),
                ("Tab", "Next field"),
                ("Esc", "Back to login"),
            ]),
            help,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(form: &mut RegisterComponent, code: KeyCode) -> Option<Action> {
        form.handle_key_event(KeyEvent::from(code)).unwrap()
    }

    #[test]
    fn test_submit_from_confirm_field() {
        let mut form = RegisterComponent::new();
        for c in "bob".chars() {
            press(&mut form, KeyCode::Char(c));
        }
        press(&mut form, KeyCode::Enter);
        press(&mut form, KeyCode::Char('a'));
        press(&mut form, KeyCode::Enter);
        press(&mut form, KeyCode::Char('b'));
        assert_eq!(
            press(&mut form, KeyCode::Enter),
            Some(Action::SubmitRegister {
                username: "bob".to_string(),
                password: "a".to_string(),
                confirm: "b".to_string(),
            })
        );
    }

    #[test]
    fn test_escape_returns_to_login() {
        let mut form = RegisterComponent::new();
        assert_eq!(press(&mut form, KeyCode::Esc), Some(Action::ShowLogin));
    }
}
