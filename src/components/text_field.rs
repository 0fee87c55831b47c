//! Single-line text input shared by the auth forms and the upload path

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

#[derive(Debug, Default, Clone)]
pub struct TextField {
    pub value: String,
    masked: bool,
}

impl TextField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field whose contents render as asterisks
    pub fn masked() -> Self {
        Self {
            value: String::new(),
            masked: true,
        }
    }

    pub fn push(&mut self, c: char) {
        self.value.push(c);
    }

    pub fn push_str(&mut self, text: &str) {
        // pasted newlines would submit nothing useful
        self.value
            .extend(text.chars().filter(|c| *c != '\n' && *c != '\r'));
    }

    pub fn pop(&mut self) {
        self.value.pop();
    }

    fn shown(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    /// "> value_" with a cursor when focused
    pub fn line(&self, label: &str, focused: bool) -> Line<'static> {
        let marker = if focused { "> " } else { "  " };
        let value_style = if focused {
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let cursor = if focused { "_" } else { "" };
        Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Cyan)),
            Span::styled(
                format!("{:10}", label),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(format!("{}{}", self.shown(), cursor), value_style),
        ])
    }
}
