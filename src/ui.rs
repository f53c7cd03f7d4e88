// ui.rs

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Wrap,
        canvas::{Canvas, Line as CanvasLine, Map, MapResolution},
    },
};

use trisk_map::Rgb;
use trisk_map::render::{chart_ranges, exterior_rings};

use crate::app::{App, CurrentScreen, WIDGETS, Widget};

pub fn render(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Notification
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    let notification = Paragraph::new(app.notification.clone())
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(notification, main_layout[0]);

    match app.current_screen {
        CurrentScreen::Dashboard => render_dashboard(frame, app, main_layout[1]),
        CurrentScreen::Help => render_help_screen(frame, app, main_layout[1]),
    }

    render_footer(frame, app, main_layout[2]);
}

fn render_help_screen(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Help Screen ")
        .title_style(Style::default().fg(Color::Yellow).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let mut lines: Vec<Line> = vec![Line::from("Keybinds:"), Line::from("")];
    lines.extend(app.help_keybinds.iter().map(|s| Line::from(format!("  {s}"))));
    lines.push(Line::from(""));
    lines.push(Line::from(
        "Rows whose country has no member-state boundary are left off the map.",
    ));
    lines.push(Line::from("Press any key to return."));

    let help_text = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::LightGreen));
    frame.render_widget(help_text, area);
}

fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2 * (WIDGETS.len() as u16 - 1) + 2), // Selectors
            Constraint::Min(0),                                      // Hover data
        ])
        .split(columns[0]);

    render_selectors(frame, app, left[0]);
    render_hover_fields(frame, app, left[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)])
        .split(columns[1]);

    render_map(frame, app, right[0]);
    render_legend(frame, app, right[1]);
}

fn render_selectors(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    for (i, widget) in WIDGETS.iter().enumerate() {
        let (label, value) = match widget {
            Widget::Metric => ("Weighting", app.metric.to_string()),
            Widget::Field(field) => (
                field.label(),
                app.selection
                    .get(*field)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "(none)".to_string()),
            ),
            Widget::HoverFields => continue,
        };
        let count = match widget {
            Widget::Field(field) => format!(" ({} options)", app.options.get(*field).len()),
            _ => String::new(),
        };
        let mut value_style = Style::default().fg(Color::White);
        if i == app.focus {
            value_style = value_style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
        }
        lines.push(Line::from(vec![
            Span::styled(format!("{label}{count}"), Style::default().fg(Color::LightCyan)),
        ]));
        lines.push(Line::from(vec![
            Span::raw("  ◀ "),
            Span::styled(value, value_style),
            Span::raw(" ▶"),
        ]));
    }

    let selectors = Paragraph::new(lines).block(
        Block::default()
            .title(" T-risk ")
            .title_style(Style::default().fg(Color::Cyan).bold())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)),
    );
    frame.render_widget(selectors, area);
}

fn render_hover_fields(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focused() == Widget::HoverFields;
    let lines: Vec<Line> = app
        .metric_order
        .iter()
        .enumerate()
        .map(|(i, metric)| {
            let marker = if app.hover_fields.contains(metric) {
                "[x]"
            } else {
                "[ ]"
            };
            let mut style = Style::default().fg(Color::White);
            if focused && i == app.hover_cursor {
                style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
            }
            Line::from(Span::styled(format!("{marker} {metric}"), style))
        })
        .collect();

    let border = if focused {
        Color::LightYellow
    } else {
        Color::Gray
    };
    let hover = Paragraph::new(lines).block(
        Block::default()
            .title(" Hover data ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(hover, area);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Map ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightBlue));

    let Some(outcome) = &app.outcome else {
        frame.render_widget(Paragraph::new("Loading...").block(block), area);
        return;
    };
    let artifact = &outcome.artifact;
    let (x_range, y_range) = chart_ranges(artifact.bbox());

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([x_range.start, x_range.end])
        .y_bounds([y_range.start, y_range.end])
        .paint(|ctx| {
            ctx.draw(&Map {
                resolution: MapResolution::Low,
                color: Color::DarkGray,
            });
            ctx.layer();
            for feature in artifact.features() {
                let color = terminal_color(feature.style.fill_color);
                for ring in exterior_rings(&feature.geometry) {
                    for pair in ring.windows(2) {
                        ctx.draw(&CanvasLine {
                            x1: pair[0].0,
                            y1: pair[0].1,
                            x2: pair[1].0,
                            y2: pair[1].1,
                            color,
                        });
                    }
                }
            }
        });
    frame.render_widget(canvas, area);
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Legend ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightYellow));

    let lines = match app.outcome.as_ref() {
        Some(outcome) => {
            let counts = Line::from(format!(
                "{} rows matched, {} on the map, {} codes without boundary",
                outcome.filtered_rows,
                outcome.joined_rows,
                outcome.dropped_codes.len()
            ));
            match &outcome.artifact.legend {
                Some(legend) => {
                    let mut spans = vec![Span::raw(format!("{:.2} ", legend.vmin))];
                    spans.extend(
                        legend
                            .colors
                            .iter()
                            .map(|c| Span::styled("█", Style::default().fg(terminal_color(*c)))),
                    );
                    spans.push(Span::raw(format!(" {:.2}  {}", legend.vmax, legend.label)));
                    vec![Line::from(spans), counts]
                }
                None => vec![Line::from("No data for this selection.").fg(Color::Gray), counts],
            }
        }
        None => vec![Line::from("No map rendered.").fg(Color::Gray)],
    };
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn terminal_color(c: Rgb) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}

/// Renders a common footer area.
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let current_screen_name = match app.current_screen {
        CurrentScreen::Dashboard => "Dashboard",
        CurrentScreen::Help => "Help",
    };

    let footer_text = Line::from(vec![
        Span::raw("Screen: "),
        Span::styled(
            current_screen_name,
            Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Press "),
        Span::styled(
            "q",
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Red),
        ),
        Span::raw(" to quit "),
        Span::raw(" | Press "),
        Span::styled(
            "?",
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Green),
        ),
        Span::raw(" for Help "),
    ]);

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));

    let footer = Paragraph::new(footer_text)
        .alignment(Alignment::Center)
        .block(block)
        .style(Style::default().fg(Color::Gray));

    frame.render_widget(footer, area);
}
