use std::io::stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, KeyEventKind, MouseButton, MouseEventKind,
};
use crossterm::execute;

use taskwatch::action::Action;
use taskwatch::app::App;
use taskwatch::config::{self, Config, config_path, load_config_from_path};
use taskwatch::event::{Event, EventHandler};
use taskwatch::system::actions::{OsProcessControl, relaunch_elevated};
use taskwatch::system::collector::Collector;
use taskwatch::system::sampler;
use taskwatch::{logging, ui};

#[derive(Parser)]
#[command(
    name = "taskwatch",
    about = "Responsive TUI task manager with a live memory summary and filterable process table"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// How often the UI asks for fresh data, in milliseconds
    #[arg(long)]
    refresh_rate: Option<u64>,

    /// Background sampling interval in milliseconds
    #[arg(long)]
    sample_interval: Option<u64>,

    /// Theme: light, dark, modern
    #[arg(long)]
    theme: Option<String>,

    /// Log file (JSON lines). Defaults to the user cache directory.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(&cli);

    let (config, path) = load_config_for_cli(&cli)?;

    let mut terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // The sampler recovers from its own panics; keep the terminal.
        if std::thread::current().name() == Some(sampler::THREAD_NAME) {
            tracing::error!(panic = %panic_info, "sampler cycle panicked");
            return;
        }
        let _ = execute!(std::io::stdout(), DisableMouseCapture);
        ratatui::restore();
        original_hook(panic_info);
    }));

    let result = run(&mut terminal, config, path).await;

    execute!(stdout(), DisableMouseCapture)?;
    ratatui::restore();

    if result? {
        relaunch_elevated().wrap_err("failed to relaunch with elevated privileges")?;
    }
    Ok(())
}

fn init_logging(cli: &Cli) {
    let Some(path) = cli.log_file.clone().or_else(logging::default_log_path) else {
        return;
    };
    // Logging is best effort; the monitor runs without it.
    if let Err(err) = logging::init(&path, &cli.log_level) {
        eprintln!("taskwatch: logging disabled: {err}");
    }
}

/// Runs until quit. Returns `true` when the user asked for an elevated
/// restart.
async fn run(
    terminal: &mut ratatui::DefaultTerminal,
    config: Config,
    config_path: Option<PathBuf>,
) -> Result<bool> {
    let tick_rate = Duration::from_millis(config.general.refresh_rate_ms);
    let mut events = EventHandler::new(tick_rate);

    let snapshots = events.sender();
    let sampler = sampler::spawn(
        Collector::new(&config.sampler),
        config.sampler.interval(),
        move |snapshot| snapshots.send(Event::Snapshot(snapshot)).is_ok(),
    )?;

    let mut app = App::new(config, config_path, Box::new(OsProcessControl));
    tracing::info!("taskwatch started");

    terminal.draw(|frame| ui::draw(frame, &mut app))?;

    while app.running {
        let deadline = app.next_deadline();
        tokio::select! {
            maybe_event = events.next() => {
                let Some(event) = maybe_event else {
                    break;
                };
                handle_event(&mut app, event);
            }
            _ = sleep_until(deadline) => {}
        }

        app.on_timers(Instant::now());
        if app.take_fetch_request() {
            sampler.trigger_fetch();
        }
        if app.paint_enabled() && app.take_needs_draw() {
            terminal.draw(|frame| ui::draw(frame, &mut app))?;
        }
    }

    sampler.join();
    tracing::info!("taskwatch stopped");
    Ok(app.relaunch_requested())
}

fn handle_event(app: &mut App, event: Event) {
    let now = Instant::now();
    match event {
        Event::Key(key) => {
            if key.kind == KeyEventKind::Press {
                let action = app.map_key(key);
                app.dispatch_at(action, now);
            }
        }
        Event::Mouse(mouse) => {
            let action = match mouse.kind {
                MouseEventKind::ScrollDown => Action::Scroll(3),
                MouseEventKind::ScrollUp => Action::Scroll(-3),
                MouseEventKind::Down(MouseButton::Left) => Action::SelectAt(mouse.column, mouse.row),
                _ => Action::None,
            };
            app.dispatch_at(action, now);
        }
        Event::Tick => app.request_fetch(),
        Event::Resize => app.on_resize(now),
        Event::Snapshot(snapshot) => app.on_snapshot(snapshot, now),
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

fn load_config_for_cli(cli: &Cli) -> Result<(Config, Option<PathBuf>)> {
    let path = cli.config.clone().or_else(config_path);
    let mut config = match &path {
        Some(path) => load_config_from_path(path),
        None => Config::default(),
    };

    if let Some(rate) = cli.refresh_rate {
        if rate == 0 {
            return Err(eyre!("--refresh-rate must be greater than 0"));
        }
        config.general.refresh_rate_ms = rate;
    }
    if let Some(interval) = cli.sample_interval {
        if interval == 0 {
            return Err(eyre!("--sample-interval must be greater than 0"));
        }
        config.sampler.interval_ms = interval;
    }
    if let Some(ref theme) = cli.theme {
        config.general.theme = theme.clone();
    }
    config::validate(&mut config);

    Ok((config, path))
}
