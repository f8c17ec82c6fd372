//! TUI layout and widget rendering.

use std::collections::VecDeque;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Sparkline, Table};

use super::runtime::App;
use super::style;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(8),    // devices and links
            Constraint::Length(4), // event density
            Constraint::Length(3), // scrub gauge
            Constraint::Length(8), // event log
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);

    render_header(frame, app, chunks[0]);
    render_devices(frame, app, body[0]);
    render_links(frame, app, body[1]);
    render_density(frame, app, chunks[2]);
    render_scrub(frame, app, chunks[3]);
    render_logs(frame, app, chunks[4]);
    render_footer(frame, chunks[5]);
}

/// Header bar: log name, clock, progress, pacing, run state.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let s = &app.session;
    let reverse = if app.scheduler.is_reversed() { " ◀" } else { "" };
    let header = Line::from(vec![
        Span::styled(
            " LPDM REPLAY ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(&s.log().name, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            " │ {} │ {}/{} │ {}s/step │ {}ms │ {}{} ",
            s.clock,
            s.cursor.next_event_index,
            s.total_events(),
            app.scheduler.seconds_per_step(),
            app.step_delay_ms(),
            app.state_label(),
            reverse,
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn render_devices(frame: &mut Frame, app: &App, area: Rect) {
    let last = app.renderer.last_device.as_deref();
    let rows: Vec<Row> = app
        .session
        .model
        .devices()
        .map(|d| {
            let row = Row::new(vec![
                Cell::from(d.id.clone()),
                Cell::from(d.kind.label().to_string()),
                Cell::from(d.summary()),
            ]);
            if Some(d.id.as_str()) == last {
                row.style(Style::default().fg(style::HIGHLIGHT))
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(16),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["device", "kind", "state"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().title(" Devices ").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn render_links(frame: &mut Frame, app: &App, area: Rect) {
    let last = app.renderer.last_link.as_ref();
    let rows: Vec<Row> = app
        .session
        .model
        .links()
        .map(|l| {
            let (a, b) = &l.endpoints;
            let from_first = l.power_source.as_deref() != Some(b.as_str());
            let arrow = if from_first { "→" } else { "←" };
            let touched = last.is_some_and(|(x, y)| (x == a && y == b) || (x == b && y == a));
            let color = if touched {
                style::HIGHLIGHT
            } else {
                style::flow_color(l.state.power, from_first)
            };
            Row::new(vec![
                Cell::from(format!("{a} {arrow} {b}")),
                Cell::from(style::watts(l.state.power)),
                Cell::from(style::watts(l.state.requested_power)),
                Cell::from(style::watts(l.state.allocated_power)),
            ])
            .style(Style::default().fg(color))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(
        Row::new(vec!["link", "power", "request", "allocate"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().title(" Links ").borders(Borders::ALL));
    frame.render_widget(table, area);
}

/// Power and price event counts per timeline slot.
fn render_density(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let slot = match app.density.slot_seconds / 3600 {
        0 | 1 => "h".to_string(),
        n => format!("{n}h"),
    };

    let power = Sparkline::default()
        .block(
            Block::default()
                .title(format!(" Power events/{slot} "))
                .borders(Borders::ALL),
        )
        .style(Style::default().fg(style::POWER_COLOR))
        .data(&app.density.power_per_slot);
    frame.render_widget(power, chunks[0]);

    let price = Sparkline::default()
        .block(
            Block::default()
                .title(format!(" Price events/{slot} "))
                .borders(Borders::ALL),
        )
        .style(Style::default().fg(style::PRICE_COLOR))
        .data(&app.density.price_per_slot);
    frame.render_widget(price, chunks[1]);
}

fn render_scrub(frame: &mut Frame, app: &App, area: Rect) {
    let position = app.session.scrub_position();
    let gauge = Gauge::default()
        .block(Block::default().title(" Timeline ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(style::SCRUB_COLOR))
        .ratio(position)
        .label(format!("{:.0}%", position * 100.0));
    frame.render_widget(gauge, area);
}

/// Recent events beside recent price messages.
fn render_logs(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);
    let visible = usize::from(area.height.saturating_sub(2));

    let events = Paragraph::new(tail(&app.renderer.events, visible))
        .block(Block::default().title(" Events ").borders(Borders::ALL));
    frame.render_widget(events, chunks[0]);

    let messages = Paragraph::new(tail(&app.renderer.messages, visible))
        .block(Block::default().title(" Price messages ").borders(Borders::ALL));
    frame.render_widget(messages, chunks[1]);
}

/// The last `visible` entries of a log.
fn tail(log: &VecDeque<String>, visible: usize) -> Vec<Line<'static>> {
    let skip = log.len().saturating_sub(visible);
    log.iter().skip(skip).map(|e| Line::from(e.clone())).collect()
}

/// Footer with keybinding hints.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        " q:Quit  Space:Play/Pause  s:Stop  +/-:Speed  t:Step  ←/→:Seek  0-9:Jump  r:Reverse",
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}
