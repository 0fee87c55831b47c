//! Dashboard view for the selected dataset
//!
//! Shows four stat cards, the equipment-type bar chart, the flowrate and
//! pressure trend, and a preview of the leading rows.

use crate::action::Action;
use crate::component::Component;
use crate::components::table::TableComponent;
use crate::model::dashboard::{
    stat_cards, type_bars, Preview, StatCard, SummaryState, TrendSeries, PREVIEW_HEADERS,
};
use crate::model::dataset::DatasetDetail;
use crate::services::chart_render::{bar_color, flow_color, pressure_color};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

/// What the dashboard currently has to show
enum Content {
    Empty,
    Loading,
    Failed(String),
    Ready {
        cards: [StatCard; 4],
        bars: Vec<(String, u64)>,
        trend: TrendSeries,
    },
}

pub struct DashboardComponent {
    content: Content,
    table: TableComponent,
    trend_rows: usize,
    preview_rows: usize,
}

impl DashboardComponent {
    pub fn new(trend_rows: usize, preview_rows: usize) -> Self {
        Self {
            content: Content::Empty,
            table: TableComponent::new(),
            trend_rows,
            preview_rows,
        }
    }

    /// Mirror the summary state of the current selection
    pub fn show(&mut self, summary: &SummaryState) {
        match summary {
            SummaryState::Loading => {
                self.content = Content::Loading;
                self.table.clear();
            }
            SummaryState::Failed(message) => {
                self.content = Content::Failed(message.clone());
                self.table.clear();
            }
            SummaryState::Ready(detail) => self.load(detail),
        }
    }

    fn load(&mut self, detail: &DatasetDetail) {
        let preview = Preview::from_rows(&detail.data, self.preview_rows);
        let note = preview.omitted_note();
        self.table.set_data(
            PREVIEW_HEADERS.iter().map(|h| h.to_string()).collect(),
            preview.rows,
            note,
        );
        self.content = Content::Ready {
            cards: stat_cards(&detail.summary),
            bars: type_bars(&detail.summary),
            trend: TrendSeries::from_rows(&detail.data, self.trend_rows),
        };
    }

    pub fn clear(&mut self) {
        self.content = Content::Empty;
        self.table.clear();
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

fn message(frame: &mut Frame, area: Rect, text: &str, color: Color) {
    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(text.to_string(), Style::default().fg(color))),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(paragraph, area);
}

fn draw_cards(frame: &mut Frame, area: Rect, cards: &[StatCard; 4]) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (card, chunk) in cards.iter().zip(chunks.iter()) {
        let mut lines = vec![
            Line::from(Span::styled(card.label, Style::default().fg(Color::DarkGray))),
            Line::from(Span::styled(
                card.value.clone(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        if let Some(ref range) = card.range {
            lines.push(Line::from(Span::styled(
                range.clone(),
                Style::default().fg(Color::DarkGray),
            )));
        }
        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(paragraph, *chunk);
    }
}

fn draw_distribution(frame: &mut Frame, area: Rect, bars: &[(String, u64)]) {
    let bar_items: Vec<Bar> = bars
        .iter()
        .enumerate()
        .map(|(i, (label, count))| {
            Bar::default()
                .value(*count)
                .label(Line::from(label.clone()))
                .style(Style::default().fg(rgb(bar_color(i))))
        })
        .collect();

    // share the width between bars, leaving a gap of one column each
    let inner = area.width.saturating_sub(2) as usize;
    let bar_width = (inner / bars.len().max(1)).saturating_sub(1).clamp(3, 12) as u16;

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Equipment Types ")
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .data(BarGroup::default().bars(&bar_items))
        .bar_width(bar_width)
        .bar_gap(1)
        .value_style(Style::default().fg(Color::Black).add_modifier(Modifier::BOLD));
    frame.render_widget(chart, area);
}

fn draw_trend(frame: &mut Frame, area: Rect, trend: &TrendSeries) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Flowrate & Pressure ")
        .border_style(Style::default().fg(Color::DarkGray));
    if trend.is_empty() {
        message(frame, area, "No readings to plot", Color::DarkGray);
        return;
    }

    let datasets = vec![
        Dataset::default()
            .name("Flowrate")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(rgb(flow_color())))
            .data(&trend.flowrate),
        Dataset::default()
            .name("Pressure")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(rgb(pressure_color())))
            .data(&trend.pressure),
    ];

    let [x_min, x_max] = trend.x_bounds();
    let [y_min, y_max] = trend.y_bounds();
    let first = trend.labels.first().cloned().unwrap_or_default();
    let last = trend.labels.last().cloned().unwrap_or_default();

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([x_min, x_max])
                .labels(vec![Span::raw(first), Span::raw(last)]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.0}", y_min)),
                    Span::raw(format!("{:.0}", (y_min + y_max) / 2.0)),
                    Span::raw(format!("{:.0}", y_max)),
                ]),
        );
    frame.render_widget(chart, area);
}

impl Component for DashboardComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('e') => Some(Action::ExportPdf),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::PageDown)
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::PageUp)
            }
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::Char('J') => Some(Action::ScrollDown),
            KeyCode::Char('K') => Some(Action::ScrollUp),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::ScrollUp | Action::ScrollDown | Action::PageUp | Action::PageDown => {
                self.table.update(action)
            }
            _ => Ok(None),
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let (cards, bars, trend) = match &self.content {
            Content::Empty => {
                message(frame, area, "No dataset selected", Color::DarkGray);
                return Ok(());
            }
            Content::Loading => {
                message(frame, area, "Loading dataset summary...", Color::Yellow);
                return Ok(());
            }
            Content::Failed(text) => {
                message(frame, area, text, Color::Red);
                return Ok(());
            }
            Content::Ready { cards, bars, trend } => (cards, bars, trend),
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Percentage(45),
                Constraint::Min(6),
            ])
            .split(area);
        let charts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[1]);

        draw_cards(frame, rows[0], cards);
        draw_distribution(frame, charts[0], bars);
        draw_trend(frame, charts[1], trend);
        self.table.draw(frame, rows[2])?;
        Ok(())
    }
}
