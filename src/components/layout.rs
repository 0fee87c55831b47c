//! Layout calculations for the UI

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

/// Width of the history sidebar
const SIDEBAR_WIDTH: u16 = 30;

/// Authenticated screen layout areas
pub struct MainLayout {
    pub sidebar: Rect,
    pub header: Rect,
    pub content: Rect,
    pub status: Option<Rect>,
    pub help: Rect,
}

/// Calculate centered popup area
pub fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let popup_x = area.x + (area.width.saturating_sub(width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect::new(
        popup_x,
        popup_y,
        width.min(area.width),
        height.min(area.height),
    )
}

/// Calculate the authenticated screen layout
pub fn calculate_main_layout(area: Rect, has_status: bool) -> MainLayout {
    // Main vertical layout: content + (optional status) + help bar
    let main_chunks = if has_status {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(area)
    } else {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(area)
    };

    let horizontal_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(main_chunks[0]);

    // Right panel: view title + view body
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(horizontal_chunks[1]);

    let (status_area, help_area) = if has_status {
        (Some(main_chunks[1]), main_chunks[2])
    } else {
        (None, main_chunks[1])
    };

    MainLayout {
        sidebar: horizontal_chunks[0],
        header: right_chunks[0],
        content: right_chunks[1],
        status: status_area,
        help: help_area,
    }
}

/// Split the logged-out screen into the form card and the help bar
pub fn calculate_auth_layout(area: Rect, form_height: u16) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);
    (centered_popup(chunks[0], 56, form_height), chunks[1])
}

/// Key hint bar: highlighted key followed by its label
pub fn help_bar(hints: &[(&str, &str)]) -> Paragraph<'static> {
    let spans: Vec<Span<'static>> = hints
        .iter()
        .flat_map(|(key, label)| {
            [
                Span::styled(
                    format!(" {} ", key),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("{} ", label)),
            ]
        })
        .collect();

    Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_popup_fits_small_area() {
        let popup = centered_popup(Rect::new(0, 0, 20, 5), 40, 7);
        assert_eq!(popup, Rect::new(0, 0, 20, 5));

        let popup = centered_popup(Rect::new(0, 0, 100, 50), 40, 10);
        assert_eq!(popup, Rect::new(30, 20, 40, 10));
    }

    #[test]
    fn test_main_layout_with_status() {
        let layout = calculate_main_layout(Rect::new(0, 0, 120, 40), true);
        assert_eq!(layout.sidebar.width, SIDEBAR_WIDTH);
        assert_eq!(layout.help.height, 3);
        assert_eq!(layout.status.map(|s| s.height), Some(1));
        assert_eq!(layout.header.height, 3);
        assert_eq!(layout.content.height, 40 - 3 - 1 - 3);
    }
}
