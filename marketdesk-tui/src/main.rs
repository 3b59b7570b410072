//! Marketdesk admin console binary.

use crossterm::{
    event::{self, Event as CrosstermEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use marketdesk_client::{AuthSession, RestClient, Transport};
use marketdesk_tui::config::ConsoleConfig;
use marketdesk_tui::error::TuiError;
use marketdesk_tui::events::TuiEvent;
use marketdesk_tui::persistence;
use marketdesk_tui::state::App;
use marketdesk_tui::views::render_view;
use marketdesk_tui::logging;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const TICK_RATE: Duration = Duration::from_millis(1000);

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = ConsoleConfig::load()?;
    logging::init(&config)?;

    let auth = AuthSession::restore(&config.token_path)?;
    let transport: Arc<dyn Transport> =
        Arc::new(RestClient::new(&config.client_settings(), auth.clone())?);

    let persisted = match persistence::load(&config.persistence_path) {
        Ok(state) => state,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring unreadable UI state");
            None
        }
    };

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(256);
    let mut auth_rx = auth.subscribe();
    let mut app = App::new(config, auth, transport, event_tx.clone(), persisted);

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard {};

    spawn_input_reader(event_tx.clone());
    app.start();

    let mut ticker = tokio::time::interval(TICK_RATE);

    loop {
        terminal.draw(|f| render_view(f, &app))?;

        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = app.auth.reload_from_storage() {
                    tracing::warn!(error = %err, "could not re-read token file");
                }
            }
            changed = auth_rx.changed() => {
                if changed.is_ok() {
                    let state = auth_rx.borrow_and_update().clone();
                    app.on_auth_changed(state);
                }
            }
            Some(event) = event_rx.recv() => {
                if handle_event(&mut app, event) {
                    break;
                }
            }
        }
    }

    if let Err(err) = persistence::save(&app.config.persistence_path, &app.persisted_state()) {
        tracing::warn!(error = %err, "could not save UI state");
    }
    tracing::info!("console closed");

    Ok(())
}

fn handle_event(app: &mut App, event: TuiEvent) -> bool {
    match event {
        TuiEvent::Input(key) => return app.handle_key(key),
        TuiEvent::Settled => app.drain_screens(),
        TuiEvent::LoginFinished(result) => app.on_login_finished(result),
        TuiEvent::Resize(..) => {}
    }
    false
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<TuiEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                let sent = match evt {
                    CrosstermEvent::Key(key) => sender.blocking_send(TuiEvent::Input(key)),
                    CrosstermEvent::Resize(width, height) => {
                        sender.blocking_send(TuiEvent::Resize(width, height))
                    }
                    _ => Ok(()),
                };
                if sent.is_err() {
                    break;
                }
            }
        }
    });
}
