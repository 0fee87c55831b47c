//! History sidebar
//!
//! Lists the user's datasets newest first as "Dataset #n". The highlighted
//! entry is what Enter opens and `d` deletes; the entry on the dashboard is
//! marked separately.

use crate::action::Action;
use crate::component::Component;
use crate::model::dataset::DatasetId;
use crate::model::history::DatasetHistory;
use anyhow::Result;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

#[derive(Default)]
pub struct SidebarComponent {
    list_state: ListState,
    /// Entries currently in the list; kept in step with the history snapshot
    len: usize,
}

impl SidebarComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn highlighted(&self, history: &DatasetHistory) -> Option<DatasetId> {
        self.list_state
            .selected()
            .and_then(|i| history.get(i))
            .map(|r| r.id)
    }

    /// Keep the highlight inside a list of `len` entries
    pub fn sync(&mut self, len: usize) {
        self.len = len;
        let selected = match (self.list_state.selected(), len) {
            (_, 0) => None,
            (None, _) => Some(0),
            (Some(i), len) => Some(i.min(len - 1)),
        };
        self.list_state.select(selected);
    }

    /// Highlight the entry for `id`, if listed
    pub fn highlight(&mut self, history: &DatasetHistory, id: DatasetId) {
        if let Some(index) = history.records().iter().position(|r| r.id == id) {
            self.list_state.select(Some(index));
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn draw_with_history(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        history: &DatasetHistory,
        selected: Option<DatasetId>,
        focused: bool,
    ) {
        let border = if focused { Color::Cyan } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" History ")
            .border_style(Style::default().fg(border));

        if history.is_empty() {
            let empty = Paragraph::new(Line::from(Span::styled(
                "No history yet.",
                Style::default().fg(Color::DarkGray),
            )))
            .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = history
            .records()
            .iter()
            .map(|record| {
                let on_dashboard = selected == Some(record.id);
                let marker = if on_dashboard { "● " } else { "  " };
                let name_style = if on_dashboard {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(marker, Style::default().fg(Color::Cyan)),
                        Span::styled(
                            format!("Dataset #{}", history.display_label(record.id)),
                            name_style,
                        ),
                    ]),
                    Line::from(Span::styled(
                        format!("  {}", record.formatted_date()),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶");

        frame.render_stateful_widget(list, area, &mut self.list_state);
    }
}

impl Component for SidebarComponent {
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        if self.len == 0 {
            return Ok(None);
        }
        let last = self.len - 1;
        let current = self.list_state.selected().unwrap_or(0);
        let next = match action {
            Action::NextItem => (current + 1).min(last),
            Action::PrevItem => current.saturating_sub(1),
            Action::FirstItem => 0,
            Action::LastItem => last,
            _ => return Ok(None),
        };
        self.list_state.select(Some(next));
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        self.draw_with_history(frame, area, &DatasetHistory::new(), None, false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fake_api::history;

    fn snapshot(ids: &[DatasetId]) -> DatasetHistory {
        let mut h = DatasetHistory::new();
        h.apply(1, history(ids));
        h
    }

    #[test]
    fn test_navigation_is_clamped() {
        let h = snapshot(&[3, 2, 1]);
        let mut sidebar = SidebarComponent::new();
        sidebar.sync(h.len());
        assert_eq!(sidebar.highlighted(&h), Some(3));

        sidebar.update(Action::PrevItem).unwrap();
        assert_eq!(sidebar.highlighted(&h), Some(3));
        sidebar.update(Action::LastItem).unwrap();
        sidebar.update(Action::NextItem).unwrap();
        assert_eq!(sidebar.highlighted(&h), Some(1));
    }

    #[test]
    fn test_sync_after_shrink() {
        let mut sidebar = SidebarComponent::new();
        sidebar.sync(3);
        sidebar.update(Action::LastItem).unwrap();
        sidebar.sync(2);
        assert_eq!(sidebar.list_state.selected(), Some(1));
        sidebar.sync(0);
        assert_eq!(sidebar.list_state.selected(), None);
    }

    #[test]
    fn test_highlight_by_id() {
        let h = snapshot(&[5, 4, 3]);
        let mut sidebar = SidebarComponent::new();
        sidebar.sync(h.len());
        sidebar.highlight(&h, 3);
        assert_eq!(sidebar.list_state.selected(), Some(2));
    }
}
