//! Spindle - terminal turntable
//!
//! One virtual deck: drop a record, play it, scratch it with the mouse.

use std::fs::{self, OpenOptions};
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    widgets::{Block, Clear},
    Terminal,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use spindle_audio::{preferred_sample_rate, EchoSettings, EffectGraph, SamplePlayer};
use spindle_core::Turntable;
use spindle_input::{Command, InputHandler, PlatterArea};
use spindle_library::{Config, LoadError, LoadedTrack, TrackLoader};
use spindle_tui::{
    platter_rect, App, AppState, DeckWidget, HelpWidget, PlatterWidget, StatusBarWidget, Theme,
};

type Deck = Turntable<SamplePlayer, EffectGraph>;
type PendingLoad = Receiver<Result<LoadedTrack, LoadError>>;

fn main() -> anyhow::Result<()> {
    if let Err(err) = init_logging() {
        eprintln!("spindle: logging disabled: {err}");
    }

    let config = Config::load();
    let first_track = std::env::args_os().nth(1).map(PathBuf::from);

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &config, first_track);

    // Cleanup
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

/// Log to a file under the data dir; the terminal belongs to the UI.
///
/// Level comes from `SPINDLE_LOG` (e.g. `SPINDLE_LOG=debug`), default info.
fn init_logging() -> anyhow::Result<()> {
    let dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spindle");
    fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("spindle.log"))?;

    let filter = EnvFilter::try_from_env("SPINDLE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
    first_track: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut app = App::new();
    if let Some(theme) = Theme::by_name(&config.theme) {
        app.state.theme = theme;
    }
    let mut input_handler = InputHandler::new().with_tempo_step(config.tempo_step);

    let player = SamplePlayer::new();
    let graph = EffectGraph::new(
        player.voice(),
        EchoSettings {
            time_ms: config.echo_time_ms,
            feedback: config.echo_feedback,
        },
    );
    let mut deck: Deck = Turntable::with_rpm(player, graph, config.default_rpm);
    deck.set_tempo_range(config.tempo_range);

    let loader = TrackLoader::with_sample_rate(preferred_sample_rate());
    let mut pending: Option<PendingLoad> = None;

    info!(
        sample_rate = loader.target_sample_rate(),
        rpm = config.default_rpm.label(),
        "spindle started"
    );

    match first_track {
        Some(path) => start_load(&mut app, &loader, &mut pending, config, path),
        None => app
            .state
            .set_message("Spindle | :load <path> to drop a record, ? for help"),
    }

    let frame_duration = Duration::from_secs_f64(1.0 / config.fps.max(1) as f64);
    let start = Instant::now();
    let mut last_frame = Instant::now();

    while !app.should_quit {
        // Advance the engine
        if let Err(err) = deck.frame(start.elapsed()) {
            warn!(%err, "frame");
            app.state.set_error(err.user_message());
        }

        // Finished background load
        let outcome = pending.as_ref().map(|rx| rx.try_recv());
        match outcome {
            Some(Ok(result)) => {
                pending = None;
                finish_load(&mut app, &mut deck, result);
            }
            Some(Err(TryRecvError::Disconnected)) => {
                pending = None;
                app.state.loading = false;
                app.state.set_error("Track loader stopped unexpectedly");
            }
            Some(Err(TryRecvError::Empty)) | None => {}
        }

        app.state.turntable = deck.state();

        // Render
        let mut platter = Rect::default();
        terminal.draw(|frame| {
            platter = render_ui(frame, &app.state);
        })?;
        let center = input_handler.set_platter_area(PlatterArea {
            x: platter.x,
            y: platter.y,
            width: platter.width,
            height: platter.height,
        });
        deck.set_platter_center(center);

        // Handle input; drain everything queued so drags stay responsive
        let mut timeout = frame_duration.saturating_sub(last_frame.elapsed());
        while event::poll(timeout)? {
            timeout = Duration::ZERO;
            let cmd = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    input_handler.handle_key(key)
                }
                Event::Mouse(mouse) => input_handler.handle_mouse(mouse, start.elapsed()),
                _ => None,
            };
            if let Some(cmd) = cmd {
                handle_command(&mut app, &mut deck, &loader, &mut pending, config, cmd);
            }

            app.state.set_mode(input_handler.mode());
            app.state.command_buffer = input_handler.command_buffer().to_string();
            if app.should_quit {
                break;
            }
        }

        // Maintain frame rate
        let elapsed = last_frame.elapsed();
        if elapsed < frame_duration {
            thread::sleep(frame_duration - elapsed);
        }
        last_frame = Instant::now();
    }

    info!("spindle stopped");
    Ok(())
}

fn handle_command(
    app: &mut App,
    deck: &mut Deck,
    loader: &TrackLoader,
    pending: &mut Option<PendingLoad>,
    config: &Config,
    cmd: Command,
) {
    match cmd {
        Command::Engine(engine_cmd) => {
            if let Err(err) = deck.handle_command(engine_cmd) {
                warn!(%err, command = ?engine_cmd, "command failed");
                app.state.set_error(err.user_message());
            }
        }
        Command::LoadTrack(path) => start_load(app, loader, pending, config, path),
        Command::ScrollHelp(lines) => {
            app.state.scroll_help(lines);
            app.state.help_scroll = app.state.help_scroll.min(HelpWidget::line_count());
        }
        Command::SetTheme(name) => app.state.set_theme(&name),
        Command::ExecuteCommand(line) => {
            app.state.set_warning(format!("Unknown command: {}", line));
        }
        Command::Cancel => app.state.clear_message(),
        Command::Quit => app.quit(),
        // Mode changes are picked up from the input handler after dispatch
        Command::EnterCommandMode | Command::EnterNormalMode | Command::ToggleHelp => {}
    }
}

/// Decode on a background thread; the result is picked up by the frame loop
fn start_load(
    app: &mut App,
    loader: &TrackLoader,
    pending: &mut Option<PendingLoad>,
    config: &Config,
    path: PathBuf,
) {
    let path = resolve_track_path(&path, config.track_dir.as_deref());
    info!(path = %path.display(), "loading track");
    app.state.loading = true;
    app.state
        .set_message(format!("Loading {}...", path.display()));
    *pending = Some(loader.spawn_load(path));
}

fn finish_load(
    app: &mut App,
    deck: &mut Deck,
    result: Result<LoadedTrack, LoadError>,
) {
    app.state.loading = false;
    match result {
        Ok(track) => {
            let title = track.metadata.display_name();
            deck.playback().load(track.samples.clone(), track.sample_rate);
            deck.media_ready();
            info!(
                title = %title,
                duration = track.duration(),
                "track loaded"
            );

            app.state
                .set_success(format!("Loaded: {} (space to play)", title));
            app.state.track_title = Some(title);
        }
        Err(err) => {
            warn!(%err, "track load failed");
            app.state.set_error(format!("Could not load track: {}", err));
        }
    }
}

/// Expand `~/` and fall back to the configured track directory for bare names
fn resolve_track_path(path: &Path, track_dir: Option<&Path>) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path.is_relative() && !path.exists() {
        if let Some(candidate) = track_dir.map(|dir| dir.join(path)) {
            if candidate.exists() {
                return candidate;
            }
        }
    }
    path.to_path_buf()
}

/// Draw one frame; returns where the platter went
fn render_ui(frame: &mut ratatui::Frame, state: &AppState) -> Rect {
    let area = frame.area();
    let theme = &state.theme;

    // Clear with background
    frame.render_widget(Block::default().style(theme.normal()), area);

    let chunks = Layout::vertical([
        Constraint::Length(1), // Title
        Constraint::Min(8),    // Platter
        Constraint::Length(6), // Deck readout
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    render_title(frame, chunks[0], theme);

    let platter = platter_rect(chunks[1]);
    frame.render_widget(PlatterWidget::new(&state.turntable, theme), platter);

    frame.render_widget(
        DeckWidget::new(&state.turntable, theme)
            .title(state.track_title.as_deref())
            .loading(state.loading),
        chunks[2],
    );

    frame.render_widget(
        StatusBarWidget::new(state.mode, &state.command_buffer, theme)
            .message(state.message.as_deref(), state.message_type),
        chunks[3],
    );

    if state.show_help {
        let help_area = centered_rect(HelpWidget::WIDTH + 2, area.height.saturating_sub(2), area);
        frame.render_widget(Clear, help_area);
        frame.render_widget(HelpWidget::new(theme).scroll(state.help_scroll), help_area);
    }

    platter
}

fn render_title(frame: &mut ratatui::Frame, area: Rect, theme: &Theme) {
    use ratatui::text::{Line, Span};
    use ratatui::widgets::Paragraph;

    let title_text = " SPINDLE ";
    let width = area.width as usize;
    let padding = width.saturating_sub(title_text.len()) / 2;
    let rest = width.saturating_sub(padding + title_text.len());
    let padded = format!("{}{}{}", "═".repeat(padding), title_text, "═".repeat(rest));

    let line = Line::from(Span::styled(padded, theme.title()));
    frame.render_widget(Paragraph::new(line), area);
}

/// Create a centered rectangle
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
