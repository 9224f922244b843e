//! Async event loop for the terminal editor.

use std::fs;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use tokio::sync::mpsc;

use super::{
    app::{Action, App},
    events::TuiEvent,
    ui::render_ui,
};
use crate::{
    api::{Outcome, PlotClient, PlotRecord, SaveReply},
    config::Config,
    session::{Effect, Session, SubmitKind},
};

/// Run the terminal editor. When `open_id` is set the saved plot is loaded
/// first and run if it holds no error.
pub async fn run_tui_editor(
    cfg: &Config,
    client: PlotClient,
    session: Session,
    open_id: Option<String>,
) -> Result<()> {
    if !io::IsTerminal::is_terminal(&io::stdout()) {
        return Err(anyhow!("the editor requires a proper terminal environment"));
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (event_tx, event_rx) = mpsc::unbounded_channel::<TuiEvent>();
    let dispatcher = Dispatcher { client, tx: event_tx.clone(), focus_delay: cfg.focus_delay() };

    let mut app = App::new(session);
    set_title(app.session.location());
    if let Some(id) = open_id {
        app.status_message = format!("Loading {}...", id);
        dispatcher.hydrate(id);
    }

    let stop = Arc::new(AtomicBool::new(false));
    spawn_input_reader(event_tx, stop.clone());

    let result = run_app(&mut terminal, &mut app, &dispatcher, event_rx).await;
    stop.store(true, Ordering::Relaxed);

    // Restore terminal
    disable_raw_mode()?;
    terminal.backend_mut().execute(DisableBracketedPaste)?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Forward terminal input to the event channel until `stop` is set.
fn spawn_input_reader(tx: mpsc::UnboundedSender<TuiEvent>, stop: Arc<AtomicBool>) {
    tokio::task::spawn_blocking(move || {
        while !stop.load(Ordering::Relaxed) {
            if !event::poll(Duration::from_millis(100)).unwrap_or(false) {
                continue;
            }
            let forwarded = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => tx.send(TuiEvent::Key(key)),
                Ok(Event::Paste(text)) => tx.send(TuiEvent::Paste(text)),
                Ok(Event::Resize(..)) => tx.send(TuiEvent::Resize),
                _ => Ok(()),
            };
            if forwarded.is_err() {
                break; // Channel closed
            }
        }
    });
}

/// Main application loop
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    dispatcher: &Dispatcher,
    mut event_rx: mpsc::UnboundedReceiver<TuiEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render_ui(frame, app))?;

        let Some(first) = event_rx.recv().await else {
            return Ok(());
        };
        let mut pending = vec![first];
        while let Ok(next) = event_rx.try_recv() {
            pending.push(next);
        }

        for tui_event in pending {
            if !handle_event(app, dispatcher, tui_event) {
                return Ok(());
            }
        }
    }
}

/// Apply one event. Returns false when the user asked to quit.
fn handle_event(app: &mut App, dispatcher: &Dispatcher, tui_event: TuiEvent) -> bool {
    match tui_event {
        TuiEvent::Key(key) => match app.on_key(key) {
            Action::Quit => return false,
            Action::Dispatch(effect) => dispatcher.dispatch(effect),
            Action::ExportSvg => export_svg(app),
            Action::Noop => {}
        },
        TuiEvent::Paste(text) => app.on_paste(&text),
        TuiEvent::Resize => {}
        TuiEvent::Hydrated { id, record } => {
            if let Some(effect) = app.on_hydrated(&id, record) {
                dispatcher.dispatch(effect);
            }
            set_title(app.session.location());
        }
        TuiEvent::RunFinished { generation, outcome } => app.on_run_finished(generation, outcome),
        TuiEvent::SaveFinished { generation, reply } => {
            if let Some(effect) = app.on_save_finished(generation, reply) {
                dispatcher.dispatch(effect);
            }
        }
        TuiEvent::Focus(tab) => app.focus_tab(tab),
    }
    true
}

fn export_svg(app: &mut App) {
    let svg = app.session.svg();
    if svg.is_empty() {
        app.status_message = "No image to export yet".to_string();
        return;
    }
    let path = app.svg_export_path();
    app.status_message = match fs::write(&path, svg) {
        Ok(()) => format!("Wrote {}", path.display()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "svg export failed");
            format!("Could not write {}: {}", path.display(), e)
        }
    };
}

fn set_title(location: &str) {
    let _ = io::stdout().execute(SetTitle(format!("ggedit {}", location)));
}

/// Performs session effects off the event loop and reports back through the channel.
struct Dispatcher {
    client: PlotClient,
    tx: mpsc::UnboundedSender<TuiEvent>,
    focus_delay: Duration,
}

impl Dispatcher {
    fn dispatch(&self, effect: Effect) {
        match effect {
            Effect::Submit(sub) => {
                let client = self.client.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tracing::info!(kind = %sub.kind, generation = sub.generation, "submitting");
                    let event = match sub.kind {
                        SubmitKind::Run => {
                            let outcome = client.run(&sub.payload).await.unwrap_or_else(|e| {
                                tracing::warn!(error = %e, "run request failed");
                                Outcome::transport_failure(&e)
                            });
                            TuiEvent::RunFinished { generation: sub.generation, outcome }
                        }
                        SubmitKind::Save => {
                            let reply = client.save(&sub.payload).await.unwrap_or_else(|e| {
                                tracing::warn!(error = %e, "save request failed");
                                SaveReply::failed(&e)
                            });
                            TuiEvent::SaveFinished { generation: sub.generation, reply }
                        }
                    };
                    let _ = tx.send(event);
                });
            }
            Effect::FocusAfterDelay(tab) => {
                let tx = self.tx.clone();
                let delay = self.focus_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(TuiEvent::Focus(tab));
                });
            }
            Effect::PushLocation(location) => {
                tracing::info!(%location, "location changed");
                set_title(&location);
            }
        }
    }

    fn hydrate(&self, id: String) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let record = client.fetch_plot(&id).await.unwrap_or_else(|e| {
                tracing::warn!(%id, error = %e, "loading saved plot failed");
                PlotRecord::failed(&e)
            });
            let _ = tx.send(TuiEvent::Hydrated { id, record });
        });
    }
}
