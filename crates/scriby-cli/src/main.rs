use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, Event, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
        supports_keyboard_enhancement,
    },
};
use ratatui::{Terminal, backend::CrosstermBackend};
use scriby_config::Config;
use scriby_engine::{JsonFileStore, Session, SessionOptions};
use std::{
    env,
    fs::{self, OpenOptions},
    io::{Stdout, stdout},
    path::{Path, PathBuf},
    process,
    time::{Duration, Instant},
};

mod app;
mod editor;
mod ui;

use app::App;

const LOG_FILE_NAME: &str = "scriby.log";
/// Upper bound on how long the loop sleeps when no timer is pending
const IDLE_POLL: Duration = Duration::from_secs(1);

/// Log to a file beside the data file; the terminal belongs to the UI.
fn init_logging(data_path: &Path) -> Result<()> {
    let log_path = data_path.with_file_name(LOG_FILE_NAME);
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    // Determine the data file from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let mut config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", config_path.display());
            process::exit(1);
        }
    };

    match args.len() {
        1 => {}
        2 => config.data_path = PathBuf::from(&args[1]),
        _ => {
            eprintln!("Usage: {} [data-file]", args[0]);
            process::exit(1);
        }
    }

    init_logging(&config.data_path)?;
    log::info!("scriby starting with data file {}", config.data_path.display());

    let options = SessionOptions {
        autosave_delay: config.autosave_delay(),
        saving_indicator: config.saving_indicator(),
        toast_duration: config.toast_duration(),
    };
    let session = Session::open(JsonFileStore::new(&config.data_path), options);
    let mut app = App::new(session, config.export_dir());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let enhanced_keys = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced_keys {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    if enhanced_keys {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("Exited with error: {err:?}");
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App<JsonFileStore>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let now = Instant::now();
        let timeout = app
            .session
            .next_deadline()
            .map_or(IDLE_POLL, |deadline| deadline.saturating_duration_since(now));

        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.handle_key(key, Instant::now());
        }
        app.session.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }

    // Flush edits still waiting on the autosave debounce
    if app.session.is_dirty() {
        app.session
            .save_now(Instant::now())
            .context("Failed to save workspace on exit")?;
    }
    log::info!("scriby exiting");
    Ok(())
}
