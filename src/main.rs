//! synthpanel - A terminal control surface for a synthesizer engine.
//!
//! The panel shows the engine's status, a row of envelope and effect
//! sliders, and a two-octave keyboard that follows the note the engine is
//! playing. Every slider change is sent to the engine as a named event.
//!
//! # Usage
//!
//! ```bash
//! cargo run                        # Panel with the built-in loopback host
//! cargo run -- --config synth.toml # Use a specific config file
//! cargo run -- --no-host           # Panel only; wait for an external engine
//! ```

use synthpanel::app::App;
use synthpanel::bridge::{EventBus, LoopbackHost};
use synthpanel::config::Config;
use synthpanel::ui;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::fs::File;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// Slider steps moved by PageUp/PageDown.
const COARSE_STEP: i32 = 10;

/// Command-line options for the application.
struct CliOptions {
    /// Config file to load instead of the default location.
    config: Option<PathBuf>,
    /// Skip the loopback host.
    no_host: bool,
    /// Write logs to this file instead of stderr.
    log_file: Option<PathBuf>,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `--config <path>` or `-c <path>`: Load a specific config file
    /// - `--no-host`: Do not start the loopback host
    /// - `--log <path>`: Write logs to a file
    /// - `--help` or `-h`: Print help and exit
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut config = None;
        let mut no_host = false;
        let mut log_file = None;
        let mut i = 1;

        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    i += 1;
                    let path = args
                        .get(i)
                        .context("--config requires a path argument")?;
                    config = Some(PathBuf::from(path));
                }
                "--log" => {
                    i += 1;
                    let path = args.get(i).context("--log requires a path argument")?;
                    log_file = Some(PathBuf::from(path));
                }
                "--no-host" => no_host = true,
                "--help" | "-h" => {
                    eprintln!("synthpanel - Terminal control surface for a synth engine");
                    eprintln!();
                    eprintln!(
                        "Usage: {} [OPTIONS]",
                        args.first().map(String::as_str).unwrap_or("synthpanel")
                    );
                    eprintln!();
                    eprintln!("Options:");
                    eprintln!("  -c, --config PATH  Load a config file (default: <config dir>/synthpanel/config.toml)");
                    eprintln!("      --no-host      Do not start the built-in loopback host");
                    eprintln!("      --log PATH     Write logs to PATH (filter with RUST_LOG)");
                    eprintln!("  -h, --help         Print this help message");
                    std::process::exit(0);
                }
                other => {
                    anyhow::bail!("Unknown option: {} (use --help for usage)", other);
                }
            }
            i += 1;
        }

        Ok(Self {
            config,
            no_host,
            log_file,
        })
    }
}

/// Installs the tracing subscriber.
///
/// The panel owns the terminal, so logs go to a file when one is given.
fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env());

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

/// Main entry point.
fn main() -> Result<()> {
    // Parse CLI options first (before any terminal setup)
    let cli = CliOptions::parse()?;
    init_logging(cli.log_file.as_ref())?;

    if let Some(path) = &cli.config {
        anyhow::ensure!(path.exists(), "Config file not found: {}", path.display());
    }
    let config = match cli.config.or_else(Config::default_path) {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            Config::load(&path).context("Failed to load configuration")?
        }
        None => Config::default(),
    };

    let bus = EventBus::new();
    let host = if cli.no_host {
        None
    } else {
        Some(
            LoopbackHost::spawn(bus.clone(), config.host.clone())
                .context("Failed to start loopback host")?,
        )
    };

    let mut app = App::mount(bus, &config).context("Failed to mount panel")?;

    let mut terminal = setup_terminal().context("Failed to setup terminal")?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal).context("Failed to restore terminal")?;

    // Unmount before the host goes away so no event reaches a dead view.
    app.unmount();
    drop(host);

    result
}

/// Sets up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main draw/input loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.pump_events();
        app.clear_expired_status();

        terminal.draw(|frame| ui::render(frame, app))?;

        // Short timeout so inbound events show up promptly
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Routes a key press to the panel.
fn handle_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true
        }
        KeyCode::Tab | KeyCode::Down | KeyCode::Char('j') => app.focus_next(),
        KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k') => app.focus_prev(),
        KeyCode::Right | KeyCode::Char('l') => app.adjust_focused(1),
        KeyCode::Left | KeyCode::Char('h') => app.adjust_focused(-1),
        KeyCode::PageUp => app.adjust_focused(COARSE_STEP),
        KeyCode::PageDown => app.adjust_focused(-COARSE_STEP),
        KeyCode::Enter | KeyCode::Char(' ') => app.activate(),
        _ => {}
    }
}
