use anyhow::Result;
use autopilot_core::Direction as SignalDirection;
use autopilot_core::{ControlAction, HeartbeatFreshness};
use autopilot_status_store::{RelayTransport, StatusStore, StorePhase, StoreView};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;

struct App {
    store: Arc<StatusStore>,
    messages: Vec<String>,
}

impl App {
    fn new(store: Arc<StatusStore>) -> Self {
        Self {
            store,
            messages: vec!["Dashboard started. Press 's' to start, 'x' to stop, 'q' to quit".to_string()],
        }
    }

    fn add_message(&mut self, msg: String) {
        self.messages.push(msg);
        if self.messages.len() > 5 {
            self.messages.remove(0);
        }
    }
}

pub async fn run(relay_url: &str, poll_interval_secs: u64) -> Result<()> {
    let transport = Arc::new(RelayTransport::new(relay_url)?);
    let store = Arc::new(StatusStore::new(
        transport,
        Duration::from_secs(poll_interval_secs),
    ));
    store.start();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store.clone());
    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    store.stop();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        let view = app.store.view();
        terminal.draw(|f| ui(f, &view, &app.messages))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Char('s') => submit(app, ControlAction::Start).await,
                    KeyCode::Char('x') => submit(app, ControlAction::Stop).await,
                    KeyCode::Char('r') => submit(app, ControlAction::Refresh).await,
                    _ => {}
                }
            }
        }
    }
}

async fn submit(app: &mut App, action: ControlAction) {
    // Presentation-layer policy: no new commands while one is in flight.
    if app.store.is_saving() {
        app.add_message(format!("Ignored {action}: command in flight"));
        return;
    }

    let store = app.store.clone();
    match store.send_control(action).await {
        Ok(()) => app.add_message(format!("Sent {action}")),
        Err(e) => app.add_message(format!("Command failed: {e}")),
    }
}

fn ui(f: &mut Frame, view: &StoreView, messages: &[String]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Min(8),
            Constraint::Length(7),
            Constraint::Length(3),
        ])
        .split(f.area());

    // Title with run state and heartbeat freshness
    let status = &view.snapshot;
    let freshness = HeartbeatFreshness::classify(status.last_heartbeat, Utc::now());
    let (state_label, state_color) = match view.phase {
        StorePhase::Loading => ("LOADING", Color::Yellow),
        StorePhase::Ready if status.running => ("RUNNING", Color::Green),
        StorePhase::Ready => ("STOPPED", Color::Red),
    };
    let mut title_spans = vec![
        Span::styled(
            state_label,
            Style::default().fg(state_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  heartbeat: {freshness}")),
    ];
    if view.saving {
        title_spans.push(Span::styled(
            "  saving...",
            Style::default().fg(Color::Yellow),
        ));
    }
    let title = Paragraph::new(Line::from(title_spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("FX Autopilot"));
    f.render_widget(title, chunks[0]);

    // Account and risk figures
    let account_lines = vec![
        Line::from(format!(
            "Symbol: {}   Open positions: {}",
            status.active_symbol.as_deref().unwrap_or("-"),
            status.open_positions
        )),
        Line::from(format!(
            "Balance: {}   Equity: {}   Today PnL: {}",
            status.account_balance, status.account_equity, status.today_pnl
        )),
        Line::from(format!(
            "Risk: {:.2}%/trade   Max trades: {}   Max drawdown: {:.2}%",
            status.risk_per_trade * 100.0,
            status.max_concurrent_trades,
            status.max_daily_drawdown * 100.0
        )),
    ];
    let account = Paragraph::new(account_lines)
        .block(Block::default().borders(Borders::ALL).title("Account"));
    f.render_widget(account, chunks[1]);

    // Signal feed, most recent first as the agent sends it
    let signals: Vec<ListItem> = status
        .recent_signals
        .iter()
        .map(|signal| {
            let color = match signal.direction {
                SignalDirection::Buy => Color::Green,
                SignalDirection::Sell => Color::Red,
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:?} ", signal.direction),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    "{} ({:.0}%) {}",
                    signal.symbol,
                    signal.confidence * 100.0,
                    signal.reason
                )),
            ]))
        })
        .collect();
    let signal_list =
        List::new(signals).block(Block::default().borders(Borders::ALL).title("Signals"));
    f.render_widget(signal_list, chunks[2]);

    // Agent notes and local messages
    let mut feed: Vec<ListItem> = status
        .notes
        .iter()
        .map(|note| ListItem::new(note.as_str()))
        .collect();
    feed.extend(
        messages
            .iter()
            .map(|m| ListItem::new(m.as_str()).style(Style::default().fg(Color::Cyan))),
    );
    let feed_widget = List::new(feed).block(Block::default().borders(Borders::ALL).title("Notes"));
    f.render_widget(feed_widget, chunks[3]);

    // Help / error line
    let footer = if let Some(error) = &view.last_error {
        Line::from(Span::styled(
            format!("Error: {error}"),
            Style::default().fg(Color::Red),
        ))
    } else {
        Line::from(vec![
            Span::raw("Press "),
            Span::styled("s", Style::default().fg(Color::Green)),
            Span::raw(" to start, "),
            Span::styled("x", Style::default().fg(Color::Red)),
            Span::raw(" to stop, "),
            Span::styled("r", Style::default().fg(Color::Yellow)),
            Span::raw(" to refresh, "),
            Span::styled("q", Style::default().fg(Color::Red)),
            Span::raw(" to quit"),
        ])
    };
    let help = Paragraph::new(footer).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, chunks[4]);
}
