use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use super::app::{App, Focus, Overlay};
use crate::error::ErrorKind;
use crate::format::{format_number, rating_band, rating_bar, score_band, Band};
use crate::models::{HistoryItem, Recommendation};
use crate::storage::KeyValueStore;
use crate::view::View;

const ACCENT: Color = Color::Cyan;
const DIM: Color = Color::DarkGray;
const ERROR_COLOR: Color = Color::Red;
const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn render<S: KeyValueStore>(frame: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(8),    // Main + history
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[1]);

    render_header(frame, app, chunks[0]);
    render_main(frame, app, body[0]);
    render_history(frame, app, body[1]);
    render_footer(frame, app, chunks[2]);

    match app.overlay {
        Overlay::About => render_about_overlay(frame),
        Overlay::ClearConfirm => render_clear_overlay(frame, app.pipeline.history().len()),
        Overlay::None => {}
    }
}

fn band_color(band: Band) -> Color {
    match band {
        Band::Good => Color::Green,
        Band::Fair => Color::Yellow,
        Band::Poor => Color::Red,
    }
}

fn recommendation_color(recommendation: Recommendation) -> Color {
    match recommendation {
        Recommendation::RecommendedForRadio => Color::Green,
        Recommendation::NeedsWork => Color::Yellow,
        Recommendation::NotRecommended => Color::Red,
    }
}

fn bordered(title: &str, focused: bool) -> Block<'_> {
    let color = if focused { ACCENT } else { DIM };
    Block::default()
        .title(Span::styled(
            title,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

fn render_header<S: KeyValueStore>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let text = vec![Line::from(vec![
        Span::styled(
            "Is your mix radio-ready?",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("Model: ", Style::default().fg(DIM)),
        Span::styled(app.model.as_str(), Style::default().fg(DIM)),
    ])];

    let paragraph = Paragraph::new(text).block(bordered(" Radio Check ", true));
    frame.render_widget(paragraph, area);
}

fn render_main<S: KeyValueStore>(frame: &mut Frame, app: &App<S>, area: Rect) {
    match app.pipeline.view() {
        View::Upload => render_upload(frame, app, area),
        View::Loading => render_loading(frame, app, area),
        View::Error(kind) => render_error(frame, kind, area),
        View::Single(item) => render_result(frame, item, app.detail_scroll, area, " Analysis "),
        View::Comparison(older, newer) => {
            let halves = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(area);
            render_result(frame, older, app.detail_scroll, halves[0], " Older ");
            render_result(frame, newer, app.detail_scroll, halves[1], " Newer ");
        }
    }
}

fn render_upload<S: KeyValueStore>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let focused = app.focus == Focus::Upload;
    let block = bordered(" Upload ", focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Intro
            Constraint::Length(3), // Path input
            Constraint::Min(1),    // Hint / message
        ])
        .split(inner);

    let intro = Paragraph::new(vec![
        Line::from(Span::styled(
            "Get Instant Feedback on Your Mix",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Type the path to your track, or drag and drop it onto this window.",
            Style::default().fg(DIM),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    frame.render_widget(intro, rows[0]);

    let width = rows[1].width.saturating_sub(2) as usize;
    let scroll = app.input.visual_scroll(width);
    let input = Paragraph::new(app.input.value())
        .scroll((0, scroll as u16))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if focused { ACCENT } else { DIM })),
        );
    frame.render_widget(input, rows[1]);
    if focused {
        let cursor_x = app.input.visual_cursor().saturating_sub(scroll) as u16;
        frame.set_cursor_position((rows[1].x + 1 + cursor_x, rows[1].y + 1));
    }

    let hint = match app.input_message {
        Some(ref msg) => Line::from(Span::styled(msg.as_str(), Style::default().fg(ERROR_COLOR))),
        None => Line::from(Span::styled("WAV, MP3, or AIFF files", Style::default().fg(DIM))),
    };
    frame.render_widget(Paragraph::new(hint).alignment(Alignment::Center), rows[2]);
}

fn render_loading<S: KeyValueStore>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let spinner = SPINNER[app.tick % SPINNER.len()];
    let name = app.pending_file.as_deref().unwrap_or("your track");
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("{} Analyzing {}", spinner, name),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Our AI mastering engineer is listening closely...",
            Style::default().fg(DIM),
        )),
    ];
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(bordered(" Analyzing ", true));
    frame.render_widget(paragraph, area);
}

fn render_error(frame: &mut Frame, kind: ErrorKind, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            kind.message(),
            Style::default().fg(ERROR_COLOR).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("[r] Try Again", Style::default().fg(ACCENT))),
    ];
    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ERROR_COLOR));
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_result(frame: &mut Frame, item: &HistoryItem, scroll: u16, area: Rect, title: &str) {
    let result = &item.result;
    let mut text = vec![
        Line::from(vec![
            Span::styled("Analysis for: ", Style::default().fg(DIM)),
            Span::styled(
                item.file_name.as_str(),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(item.timestamp.as_str(), Style::default().fg(DIM))),
        Line::from(""),
        Line::from(vec![
            Span::styled("Overall Score  ", Style::default().fg(DIM)),
            Span::styled(
                format_number(result.overall_score),
                Style::default()
                    .fg(band_color(score_band(result.overall_score)))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" / 100", Style::default().fg(DIM)),
        ]),
        Line::from(vec![
            Span::styled("Verdict        ", Style::default().fg(DIM)),
            Span::styled(
                result.recommendation.as_str(),
                Style::default()
                    .fg(recommendation_color(result.recommendation))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(result.summary.as_str()),
        Line::from(""),
        Line::from(Span::styled(
            "Detailed Metrics",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
    ];

    for metric in &result.metrics {
        text.push(Line::from(""));
        text.push(Line::from(vec![
            Span::styled(
                metric.name.as_str(),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(metric.value.as_str(), Style::default().fg(Color::White)),
        ]));
        text.push(Line::from(vec![
            Span::styled(
                rating_bar(metric.rating),
                Style::default().fg(band_color(rating_band(metric.rating))),
            ),
            Span::styled(
                format!(" {}/10", format_number(metric.rating)),
                Style::default().fg(DIM),
            ),
        ]));
        text.push(Line::from(Span::styled(
            metric.explanation.as_str(),
            Style::default().fg(DIM),
        )));
    }

    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(bordered(title, true));
    frame.render_widget(paragraph, area);
}

fn render_history<S: KeyValueStore>(frame: &mut Frame, app: &mut App<S>, area: Rect) {
    // 2 for borders, 1 for hint
    let inner_height = area.height.saturating_sub(3) as usize;
    app.visible_rows = inner_height;

    let history_len = app.pipeline.history().len();
    let title = if history_len > 1 {
        format!(" Analysis History \u{00b7} {} ", app.sort.label())
    } else {
        " Analysis History ".to_string()
    };
    let block = bordered(&title, app.focus == Focus::History);

    if history_len == 0 {
        let paragraph = Paragraph::new("Your past analyses will appear here.")
            .style(Style::default().fg(DIM))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Select up to two tracks to compare.").style(Style::default().fg(DIM)),
    ])
    .height(1);

    let rows = app.history_rows();
    let end = (app.scroll_offset + inner_height).min(rows.len());
    let visible = rows.get(app.scroll_offset..end).unwrap_or(&[]);
    let focused = app.focus == Focus::History;

    let table_rows: Vec<Row> = visible
        .iter()
        .enumerate()
        .map(|(vi, row)| {
            let index = app.scroll_offset + vi;
            let marker = if row.selected { "[x]" } else { "[ ]" };
            let score = row.item.result.overall_score;

            let mut style = Style::default();
            if !row.enabled {
                style = style.fg(DIM).add_modifier(Modifier::DIM);
            } else if row.selected {
                style = style.add_modifier(Modifier::BOLD);
            }
            if focused && index == app.cursor {
                style = style.bg(Color::DarkGray);
            }

            Row::new(vec![
                Cell::from(marker),
                Cell::from(Line::from(vec![
                    Span::raw(row.item.file_name.as_str()),
                    Span::styled(
                        format!("  {}", row.item.timestamp),
                        Style::default().fg(DIM),
                    ),
                ])),
                Cell::from(format_number(score)).style(if row.enabled {
                    Style::default().fg(band_color(score_band(score)))
                } else {
                    Style::default().fg(DIM)
                }),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Min(12),
        Constraint::Length(4),
    ];

    let table = Table::new(table_rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn render_footer<S: KeyValueStore>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let keys = match (app.overlay, app.pipeline.view()) {
        (Overlay::ClearConfirm, _) => "[y] clear  [n] cancel",
        (Overlay::About, _) => "[Esc] close",
        (_, View::Loading) => "[Tab] history  [Ctrl-C] quit",
        (_, View::Error(_)) => "[r] try again  [Tab] history  [q] quit",
        (_, View::Upload) if app.focus == Focus::Upload => {
            "[Enter] analyze  [Tab] history  [Esc] leave input  [Ctrl-C] quit"
        }
        _ => "[space] select  [s]ort  [c]lear  [n] analyze another  [Tab] upload  [a]bout  [q]uit",
    };
    let footer = Paragraph::new(keys)
        .style(Style::default().fg(DIM))
        .alignment(Alignment::Center);
    frame.render_widget(footer, area);
}

fn render_about_overlay(frame: &mut Frame) {
    let area = centered_rect(52, 10, frame.area());
    frame.render_widget(Clear, area);

    let text = vec![
        Line::from(Span::styled(
            "Radio Check",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Version {}", env!("CARGO_PKG_VERSION"))),
        Line::from(""),
        Line::from("Radio-readiness critique from a generative model."),
        Line::from("Only the file name is sent; audio is never read."),
        Line::from(""),
        Line::from(Span::styled("[Esc] close", Style::default().fg(DIM))),
    ];

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(bordered(" About ", true));
    frame.render_widget(paragraph, area);
}

fn render_clear_overlay(frame: &mut Frame, count: usize) {
    let area = centered_rect(48, 7, frame.area());
    frame.render_widget(Clear, area);

    let text = vec![
        Line::from(Span::styled(
            format!("Clear all {} analyses?", count),
            Style::default().fg(ERROR_COLOR).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("This cannot be undone."),
        Line::from(""),
        Line::from(Span::styled("[y] clear  [n] cancel", Style::default().fg(DIM))),
    ];

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(bordered(" Clear History ", true));
    frame.render_widget(paragraph, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
