//! Upload view
//!
//! A file is picked either by dropping it on the terminal (which pastes its
//! path) or by typing the path. It stays pending until it is explicitly sent.

use crate::action::Action;
use crate::component::Component;
use crate::model::upload::{UploadForm, REQUIRED_COLUMNS};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

#[derive(Default)]
pub struct UploadComponent {
    pub form: UploadForm,
    /// Typing a path; every key goes to the input
    pub path_mode: bool,
}

impl UploadComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.form.reset();
        self.path_mode = false;
    }

    fn handle_path_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => Some(Action::ExitPathMode),
            KeyCode::Enter => Some(Action::OfferFile(self.form.input.clone())),
            KeyCode::Backspace => {
                self.form.input.pop();
                None
            }
            KeyCode::Char(c) => {
                self.form.input.push(c);
                None
            }
            _ => None,
        }
    }
}

impl Component for UploadComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.path_mode {
            return Ok(self.handle_path_key(key));
        }
        let action = match key.code {
            KeyCode::Char('o') => Some(Action::EnterPathMode),
            KeyCode::Char('u') => Some(Action::SubmitUpload),
            _ => None,
        };
        Ok(action)
    }

    fn handle_paste_event(&mut self, text: &str) -> Result<Option<Action>> {
        Ok(Some(Action::OfferFile(text.to_string())))
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::EnterPathMode => {
                self.path_mode = true;
            }
            Action::ExitPathMode => {
                self.path_mode = false;
                self.form.input.clear();
            }
            Action::OfferFile(raw) => {
                if self.form.offer(&raw) {
                    self.path_mode = false;
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Drop a CSV file onto this terminal, or press o to type its path.",
                Style::default().fg(Color::White),
            )),
            Line::from(vec![
                Span::styled("Required columns: ", Style::default().fg(Color::DarkGray)),
                Span::styled(REQUIRED_COLUMNS, Style::default().fg(Color::Cyan)),
            ]),
            Line::from(""),
        ];

        if self.path_mode {
            lines.push(Line::from(vec![
                Span::styled("> ", Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("{}_", &self.form.input),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
            lines.push(Line::from(""));
        }

        match self.form.pending_name() {
            Some(name) => {
                lines.push(Line::from(vec![
                    Span::styled("Selected: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        name,
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    ),
                ]));
                if self.form.is_uploading() {
                    lines.push(Line::from(Span::styled(
                        "Uploading...",
                        Style::default().fg(Color::Yellow),
                    )));
                } else {
                    lines.push(Line::from(Span::styled(
                        "Press u to upload and analyze.",
                        Style::default().fg(Color::Yellow),
                    )));
                }
            }
            None => lines.push(Line::from(Span::styled(
                "No file selected.",
                Style::default().fg(Color::DarkGray),
            ))),
        }

        if let Some(error) = self.form.error() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Error: {}", error),
                Style::default().fg(Color::Red),
            )));
        }

        let border = if self.path_mode {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Upload CSV ")
                    .border_style(Style::default().fg(border)),
            );
        frame.render_widget(paragraph, area);
        Ok(())
    }
}
