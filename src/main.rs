use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange, Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use eqplayer::audio::SymphoniaDecoder;
use eqplayer::config::{Cli, Settings};
use eqplayer::controller::AppController;
use eqplayer::logging;
use eqplayer::resolver::DirectoryResolver;
use eqplayer::view::AppView;
use eqplayer::{Command, PlaybackOrchestrator, PlaybackState};

const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load(Cli::parse())?;

    if let Err(e) = logging::init_logging(&settings.log) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }
    tracing::info!(
        music_dir = %settings.music_dir.display(),
        tracks = settings.playlist.len(),
        headless = settings.headless,
        "=== eqplayer starting ==="
    );

    let orchestrator = PlaybackOrchestrator::spawn(
        settings.playlist.clone(),
        Arc::new(DirectoryResolver::new(&settings.music_dir)),
        Arc::new(SymphoniaDecoder),
        settings.player.clone(),
    )
    .context("Failed to start the player")?;

    let res = if settings.headless {
        run_headless(orchestrator.clone(), &settings).await
    } else {
        run_tui(orchestrator.clone(), &settings).await
    };

    orchestrator.shutdown().await?;
    if let Err(err) = &res {
        tracing::error!(error = ?err, "Application error");
    }
    tracing::info!("eqplayer shutting down");
    res
}

/// Load the first track and start the poller.
async fn start_playback(orchestrator: &PlaybackOrchestrator, settings: &Settings) -> eqplayer::Result<()> {
    if let Some(first) = settings.playlist.first() {
        orchestrator.load_track(first.clone()).await?;
    }
    orchestrator.start_polling().await
}

async fn run_tui(orchestrator: PlaybackOrchestrator, settings: &Settings) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let controller = AppController::new(orchestrator.clone(), settings.pause_on_focus_lost);
    let res = run_app(&mut terminal, &orchestrator, &controller, settings).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    orchestrator: &PlaybackOrchestrator,
    controller: &AppController,
    settings: &Settings,
) -> Result<()> {
    if let Err(e) = start_playback(orchestrator, settings).await {
        tracing::error!(error = %e, "Initial load failed");
        controller.report(Err(e)).await;
    }

    let mut events = EventStream::new();
    let mut state_rx = orchestrator.subscribe();
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);

    loop {
        let state = state_rx.borrow_and_update().clone();
        let ui_state = controller.observe_state(&state).await;
        if ui_state.should_quit {
            break;
        }

        terminal.draw(|f| AppView::render(f, &state, &ui_state))?;

        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => controller.handle_key_event(key).await?,
                Some(Ok(Event::FocusLost)) => controller.handle_focus_lost().await,
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            changed = state_rx.changed() => {
                if changed.is_err() {
                    tracing::warn!("State channel closed");
                    break;
                }
            }
            _ = redraw.tick() => {}
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct StateLine<'a> {
    at: String,
    #[serde(flatten)]
    state: &'a PlaybackState,
}

#[derive(Serialize)]
struct ErrorLine<'a> {
    at: String,
    command: &'a str,
    error: String,
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::error!(error = %e, "Failed to serialize output line"),
    }
}

/// Line-oriented front-end: commands on stdin, state snapshots as JSON on stdout.
async fn run_headless(orchestrator: PlaybackOrchestrator, settings: &Settings) -> Result<()> {
    let mut state_rx = orchestrator.subscribe();
    if let Err(e) = start_playback(&orchestrator, settings).await {
        print_json(&ErrorLine { at: now(), command: "start", error: e.to_string() });
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line.eq_ignore_ascii_case("quit") {
                    break;
                }
                let result = match line.parse::<Command>() {
                    Ok(command) => orchestrator.send(command).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = result {
                    print_json(&ErrorLine { at: now(), command: line, error: e.to_string() });
                }
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                print_json(&StateLine { at: now(), state: &state });
            }
        }
    }
    Ok(())
}
