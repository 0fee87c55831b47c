//! Confirmation and notice dialogs

use crate::action::Action;
use crate::component::Component;
use crate::components::centered_popup;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this dataset?";

fn yes_no_line(yes: &str, no: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            " y ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("{}  ", yes)),
        Span::styled(
            " n/Esc ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::raw(no.to_string()),
    ])
}

fn dialog_block(title: &str, color: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {} ", title))
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
}

fn confirm_keys(key: KeyEvent, on_yes: Action) -> Option<Action> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => Some(on_yes),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Action::CloseModal),
        _ => None,
    }
}

/// Quit confirmation dialog
#[derive(Default)]
pub struct QuitDialog;

impl Component for QuitDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        Ok(confirm_keys(key, Action::ForceQuit))
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let popup_area = centered_popup(area, 40, 7);
        frame.render_widget(Clear, popup_area);

        let content = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Are you sure you want to quit?",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            yes_no_line("Yes, quit", "No, cancel"),
        ];

        let paragraph = Paragraph::new(content)
            .block(dialog_block("Quit?", Color::Yellow))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, popup_area);
        Ok(())
    }
}

/// Asks before a dataset is deleted
#[derive(Default)]
pub struct ConfirmDeleteDialog;

impl ConfirmDeleteDialog {
    pub fn draw_with_label(&self, frame: &mut Frame, area: Rect, label: &str) {
        let popup_area = centered_popup(area, 52, 8);
        frame.render_widget(Clear, popup_area);

        let content = vec![
            Line::from(""),
            Line::from(Span::styled(
                DELETE_PROMPT,
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                label.to_string(),
                Style::default().fg(Color::Cyan),
            )),
            Line::from(""),
            yes_no_line("Delete", "Keep"),
        ];

        let paragraph = Paragraph::new(content)
            .block(dialog_block("Delete dataset", Color::Red))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, popup_area);
    }
}

impl Component for ConfirmDeleteDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        Ok(confirm_keys(key, Action::ConfirmModal))
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        self.draw_with_label(frame, area, "");
        Ok(())
    }
}

/// Dismissable notice or error
#[derive(Default)]
pub struct AlertDialog;

impl AlertDialog {
    pub fn draw_with_message(&self, frame: &mut Frame, area: Rect, title: &str, message: &str) {
        let width = (message.chars().count() as u16 + 6).clamp(36, 72);
        let height = if message.chars().count() as u16 > width.saturating_sub(4) {
            9
        } else {
            7
        };
        let popup_area = centered_popup(area, width, height);
        frame.render_widget(Clear, popup_area);

        let color = if title == "Error" {
            Color::Red
        } else {
            Color::Cyan
        };
        let content = vec![
            Line::from(""),
            Line::from(Span::styled(
                message.to_string(),
                Style::default().fg(Color::White),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    " Enter/Esc ",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("OK"),
            ]),
        ];

        let paragraph = Paragraph::new(content)
            .block(dialog_block(title, color))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }
}

impl Component for AlertDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => Some(Action::CloseModal),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        self.draw_with_message(frame, area, "Notice", "");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char) -> KeyEvent {
        KeyEvent::from(KeyCode::Char(c))
    }

    #[test]
    fn test_quit_dialog_keys() {
        let mut dialog = QuitDialog;
        assert_eq!(dialog.handle_key_event(key('y')).unwrap(), Some(Action::ForceQuit));
        assert_eq!(dialog.handle_key_event(key('n')).unwrap(), Some(Action::CloseModal));
        assert_eq!(dialog.handle_key_event(key('x')).unwrap(), None);
    }

    #[test]
    fn test_delete_dialog_confirms() {
        let mut dialog = ConfirmDeleteDialog;
        assert_eq!(dialog.handle_key_event(key('Y')).unwrap(), Some(Action::ConfirmModal));
        assert_eq!(
            dialog.handle_key_event(KeyEvent::from(KeyCode::Esc)).unwrap(),
            Some(Action::CloseModal)
        );
    }

    #[test]
    fn test_alert_dismisses_on_enter() {
        let mut dialog = AlertDialog;
        assert_eq!(
            dialog.handle_key_event(KeyEvent::from(KeyCode::Enter)).unwrap(),
            Some(Action::CloseModal)
        );
    }
}
