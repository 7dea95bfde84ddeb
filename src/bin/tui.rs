//! Station TUI - live weather station dashboard
//!
//! Shows the current reading (date, time, temperature, humidity) and a
//! temperature trend chart over the configured window. `r` requests a
//! refresh outside the regular interval, `q` quits. The refreshing
//! indicator resets when the cycle reports back, whatever its outcome.

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use parking_lot::Mutex;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use weatherstation::domain::display;
use weatherstation::domain::types::MeasurementBatch;
use weatherstation::infra::{Config, Metrics};
use weatherstation::io::StationClient;
use weatherstation::services::{RefreshOutcome, Refresher};

/// Station TUI - dashboard for the weather station client
#[derive(Parser, Debug)]
#[command(name = "station-tui", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

/// Dashboard state shared between the outcome consumer and the draw loop.
/// The batch is owned here, replaced wholesale per successful cycle.
#[derive(Default)]
struct App {
    batch: MeasurementBatch,
    refreshing: bool,
    cycles: u64,
    last_error: Option<String>,
}

impl App {
    fn apply(&mut self, outcome: RefreshOutcome) {
        self.refreshing = false;
        self.cycles += 1;
        match outcome {
            RefreshOutcome::Updated(batch) => {
                self.batch = batch;
                self.last_error = None;
            }
            RefreshOutcome::NoData => {
                // Keep showing the previous batch
            }
            RefreshOutcome::Failed(cause) => {
                self.last_error = Some(cause);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    let metrics = Arc::new(Metrics::new());
    let client = StationClient::new(config.station_config())?;
    let (refresher, refresh_handle) =
        Refresher::new(client, config.refresh_interval_secs(), metrics);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (updates_tx, mut updates_rx) = mpsc::channel(8);

    tokio::spawn(refresher.run(updates_tx, shutdown_rx));

    let app = Arc::new(Mutex::new(App { refreshing: true, ..App::default() }));

    // Consume per-cycle outcomes into the shared dashboard state
    let consumer_app = app.clone();
    tokio::spawn(async move {
        while let Some(outcome) = updates_rx.recv().await {
            consumer_app.lock().apply(outcome);
        }
    });

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let hours = config.station_hours();
    loop {
        terminal.draw(|f| ui(f, &app.lock(), hours))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Char('r') => {
                            if refresh_handle.trigger() {
                                app.lock().refreshing = true;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    let _ = shutdown_tx.send(true);
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

fn ui(f: &mut Frame, app: &App, hours: u32) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(10), Constraint::Length(3)])
        .split(f.area());

    draw_cards(f, app, rows[0]);
    draw_chart(f, app, rows[1], hours);
    draw_status(f, app, rows[2]);
}

fn draw_cards(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let latest = app.batch.latest();
    let values = [
        ("Date", latest.map(display::format_date).unwrap_or_else(|| "--".to_string())),
        ("Time", latest.map(display::format_time).unwrap_or_else(|| "--:--".to_string())),
        (
            "Temperature",
            latest.map(display::format_temperature).unwrap_or_else(|| "--".to_string()),
        ),
        ("Humidity", latest.map(display::format_humidity).unwrap_or_else(|| "--".to_string())),
    ];

    for (i, (title, value)) in values.into_iter().enumerate() {
        let card = Paragraph::new(Line::from(Span::styled(
            value,
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(card, cards[i]);
    }
}

fn draw_chart(f: &mut Frame, app: &App, area: ratatui::layout::Rect, hours: u32) {
    let title = format!("Temperature, last {} h", hours);

    if app.batch.is_empty() {
        let placeholder = Paragraph::new("waiting for data...")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(placeholder, area);
        return;
    }

    // X axis in hours relative to the oldest reading
    let first_ms = app.batch.first().map(|m| m.timestamp_ms).unwrap_or(0);
    let points: Vec<(f64, f64)> = app
        .batch
        .temperature_points()
        .into_iter()
        .map(|(ts_ms, temp)| ((ts_ms - first_ms as f64) / 3_600_000.0, temp))
        .collect();

    let x_max = points.last().map(|p| p.0).unwrap_or(0.0).max(0.1);
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;
    for &(_, temp) in &points {
        y_min = y_min.min(temp);
        y_max = y_max.max(temp);
    }
    y_min -= 1.0;
    y_max += 1.0;

    let x_labels = vec![
        app.batch.first().map(display::format_time).unwrap_or_default(),
        app.batch.latest().map(display::format_time).unwrap_or_default(),
    ];
    let y_labels = vec![format!("{:.1}", y_min), format!("{:.1}", y_max)];

    let datasets = vec![Dataset::default()
        .name("°C")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points)];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(
            Axis::default()
                .title("Time")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("°C")
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(y_labels),
        );

    f.render_widget(chart, area);
}

fn draw_status(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let mut spans = vec![Span::raw("r refresh  q quit  ")];

    if app.refreshing {
        spans.push(Span::styled("refreshing...", Style::default().fg(Color::Yellow)));
    } else if let Some(cause) = &app.last_error {
        spans.push(Span::styled(
            format!("last refresh failed: {}", cause),
            Style::default().fg(Color::Red),
        ));
    } else {
        spans.push(Span::styled(
            format!("cycles: {}  points: {}", app.cycles, app.batch.len()),
            Style::default().fg(Color::Green),
        ));
    }

    let status = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, area);
}
