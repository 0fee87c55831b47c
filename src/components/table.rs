//! Table component for the dataset preview
//!
//! Renders tabular data with headers, rows, and column alignment.

use crate::action::Action;
use crate::component::Component;
use anyhow::Result;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Widest a single column may grow
const MAX_COLUMN_WIDTH: usize = 32;

/// Scrollable table of string cells
pub struct TableComponent {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    /// Shown under the rows, e.g. "Showing 10 of 25 rows"
    note: Option<String>,
    scroll: usize,
}

impl Default for TableComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl TableComponent {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
            rows: Vec::new(),
            note: None,
            scroll: 0,
        }
    }

    /// Set the table data (headers and rows)
    pub fn set_data(&mut self, headers: Vec<String>, rows: Vec<Vec<String>>, note: Option<String>) {
        self.headers = headers;
        self.rows = rows;
        self.note = note;
        self.scroll = 0;
    }

    pub fn clear(&mut self) {
        self.set_data(Vec::new(), Vec::new(), None);
    }

    /// Build table lines from headers and rows
    pub fn build_table_lines(headers: &[String], rows: &[Vec<String>]) -> Vec<Line<'static>> {
        if headers.is_empty() {
            return vec![Line::from("No rows")];
        }

        let mut col_widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i < col_widths.len() {
                    col_widths[i] = col_widths[i].max(cell.width());
                }
            }
        }
        for width in &mut col_widths {
            *width = (*width).min(MAX_COLUMN_WIDTH);
        }

        let mut lines = Vec::with_capacity(rows.len() + 2);

        let header_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        lines.push(row_line(headers, &col_widths, header_style));

        let separator: String = col_widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─");
        lines.push(Line::from(Span::styled(
            separator,
            Style::default().fg(Color::DarkGray),
        )));

        for row in rows {
            lines.push(row_line(row, &col_widths, Style::default().fg(Color::White)));
        }

        lines
    }
}

fn row_line(cells: &[String], col_widths: &[usize], style: Style) -> Line<'static> {
    let spans: Vec<Span<'static>> = col_widths
        .iter()
        .enumerate()
        .flat_map(|(i, width)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            [
                Span::styled(pad(&truncate(cell, *width), *width), style),
                Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
            ]
        })
        .collect();
    Line::from(spans)
}

/// Cut `text` to at most `width` columns, marking the cut with "..."
fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let budget = width.saturating_sub(3);
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

impl Component for TableComponent {
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let max_scroll = self.rows.len().saturating_sub(1);
        match action {
            Action::ScrollDown => {
                if self.scroll < max_scroll {
                    self.scroll += 1;
                }
            }
            Action::ScrollUp => {
                self.scroll = self.scroll.saturating_sub(1);
            }
            Action::PageDown => {
                self.scroll = (self.scroll + 10).min(max_scroll);
            }
            Action::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
            }
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let mut content = Self::build_table_lines(&self.headers, &self.rows);
        if let Some(ref note) = self.note {
            content.push(Line::from(""));
            content.push(Line::from(Span::styled(
                note.clone(),
                Style::default().fg(Color::Yellow),
            )));
        }
        let visible_height = area.height.saturating_sub(2) as usize;
        let total = content.len();

        let paragraph = Paragraph::new(content)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Raw Data Preview ")
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .scroll((self.scroll as u16, 0));

        frame.render_widget(paragraph, area);

        // Render scrollbar if content exceeds visible area
        if total > visible_height {
            let mut scrollbar_state =
                ScrollbarState::new(total.saturating_sub(visible_height)).position(self.scroll);

            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("↑"))
                    .end_symbol(Some("↓")),
                area.inner(ratatui::layout::Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_columns_are_aligned() {
        let headers = vec!["ID".to_string(), "Type".to_string()];
        let rows = vec![
            vec!["1".to_string(), "Pump".to_string()],
            vec!["10".to_string(), "Heat Exchanger".to_string()],
        ];
        let lines = TableComponent::build_table_lines(&headers, &rows);
        assert_eq!(lines.len(), 4);
        assert_eq!(text(&lines[0]), "ID │ Type           │ ");
        assert_eq!(text(&lines[2]), "1  │ Pump           │ ");
    }

    #[test]
    fn test_truncate_respects_display_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
        // wide glyphs take two columns each
        assert_eq!(truncate("日本語テキスト", 7), "日本...");
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut table = TableComponent::new();
        table.set_data(
            vec!["ID".to_string()],
            vec![vec!["1".to_string()], vec!["2".to_string()]],
            None,
        );
        table.update(Action::PageDown).unwrap();
        assert_eq!(table.scroll, 1);
        table.update(Action::ScrollUp).unwrap();
        table.update(Action::ScrollUp).unwrap();
        assert_eq!(table.scroll, 0);
    }
}
