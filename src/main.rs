#![forbid(unsafe_code)]

//! `debugger-session`: interactive front-end driving a debugger backend.
//!
//! Loads configuration, starts the driver for the selected backend, launches
//! the backend against the target and relays its output. Interactive
//! commands read from stdin are routed through the session controller so
//! the breakpoint registry stays authoritative.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use debugger_session::breakpoints::RemoveMode;
use debugger_session::channel::{
    ChannelEvent, ChannelOptions, ChannelSlot, ProcessChannel, StreamTag,
};
use debugger_session::driver::{Dialect, DriverRegistry};
use debugger_session::observer::TracingObserver;
use debugger_session::session::command::parse_location;
use debugger_session::session::{SessionController, UserCommand};
use debugger_session::{AppError, GlobalConfig, Result};

/// Exit code reported when the backend was killed by a signal.
const SIGNALLED_EXIT_CODE: i32 = 1;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "debugger-session", about = "Drive a debugger backend over pipes", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend token (gdb, cdb, msvctk or a configured alias).
    #[arg(long)]
    backend: Option<String>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Breakpoint to set before the run, as FILE:LINE.
    #[arg(long = "break", value_name = "FILE:LINE")]
    breaks: Vec<String>,

    /// One-shot breakpoint to set before the run, as FILE:LINE.
    #[arg(long = "tbreak", value_name = "FILE:LINE")]
    tbreaks: Vec<String>,

    /// Program to debug.
    target: String,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    let exit_code = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))?;

    std::process::exit(exit_code)
}

async fn run(args: Cli) -> Result<i32> {
    // ── Load configuration ──────────────────────────────
    let config = load_config(args.config.as_deref())?;
    info!(working_dir = %config.working_dir.display(), "configuration loaded");

    // ── Build the session ───────────────────────────────
    let observer = TracingObserver::shared();
    let mut session = SessionController::new(DriverRegistry::from_config(&config), observer.clone());
    seed_breakpoints(&mut session, &args)?;
    session.start(args.backend.as_deref())?;

    let command_line = {
        let driver = session
            .driver()
            .ok_or_else(|| AppError::Driver("no live driver after start".into()))?;
        let dialect = Dialect::from_token(driver.name())
            .unwrap_or_else(|| config.effective_default_dialect());
        let backend = config.backend(dialect);
        driver.command_line(&backend.executable, &backend.args, &args.target)
    };

    // ── Launch the backend ──────────────────────────────
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let channel = ProcessChannel::launch(
        &command_line,
        ChannelOptions::from_config("backend", &config),
        event_tx,
        observer,
    )?;
    let mut slot = ChannelSlot::default();
    slot.install(channel);

    if let Some(driver) = session.driver_mut() {
        driver.prepare();
    }
    session.apply_breakpoints();
    if let Some(driver) = session.driver_mut() {
        driver.run();
    }
    flush(&mut session, &mut slot);

    // ── Event loop ──────────────────────────────────────
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;
    let mut idle = tokio::time::interval(config.idle_interval());

    let exit_code = loop {
        tokio::select! {
            Some(event) = event_rx.recv() => match event {
                ChannelEvent::Line { stream, text, has_eol, .. } => {
                    print_line(stream, &text, has_eol);
                    slot.pump();
                }
                ChannelEvent::Terminated { exit_code, .. } => break exit_code,
            },
            _ = idle.tick() => {
                slot.pump();
                flush(&mut session, &mut slot);
            }
            line = input.next_line(), if input_open => {
                let command = match line {
                    Ok(Some(line)) => UserCommand::parse(&line),
                    Ok(None) => {
                        input_open = false;
                        UserCommand::Quit
                    }
                    Err(err) => {
                        warn!(%err, "failed to read interactive input");
                        input_open = false;
                        UserCommand::Quit
                    }
                };
                execute(&mut session, &slot, command);
                flush(&mut session, &mut slot);
                slot.pump();
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    warn!(%err, "ctrl-c handler failed");
                } else {
                    execute(&mut session, &slot, UserCommand::Interrupt);
                }
            }
        }
    };

    session.clean_up();
    info!(?exit_code, "backend terminated");
    Ok(exit_code.unwrap_or(SIGNALLED_EXIT_CODE))
}

fn load_config(path: Option<&Path>) -> Result<GlobalConfig> {
    match path {
        Some(path) => GlobalConfig::load_from_path(path),
        None => {
            let mut config = GlobalConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Register the `--break` / `--tbreak` locations before the driver starts.
fn seed_breakpoints(session: &mut SessionController, args: &Cli) -> Result<()> {
    let initial = args
        .breaks
        .iter()
        .map(|location| (location, false))
        .chain(args.tbreaks.iter().map(|location| (location, true)));
    for (location, temporary) in initial {
        let (filename, line) = parse_location(location).ok_or_else(|| {
            AppError::Config(format!("invalid breakpoint location '{location}'"))
        })?;
        session.add_breakpoint(&filename, line, temporary, "");
    }
    Ok(())
}

/// Route one interactive command through the session.
fn execute(session: &mut SessionController, slot: &ChannelSlot, command: UserCommand) {
    match command {
        UserCommand::Break {
            filename,
            line,
            temporary,
        } => {
            let index = session.add_breakpoint(&filename, line, temporary, "");
            println!("breakpoint {index} at {filename}:{line}");
        }
        UserCommand::Delete { filename, line } => {
            match session.remove_breakpoint(&filename, line, RemoveMode::Detach) {
                Some(bp) => println!("deleted {bp}"),
                None => println!("no breakpoint at {filename}:{line}"),
            }
        }
        UserCommand::DeleteAll => {
            let removed = session.remove_all_breakpoints(None, RemoveMode::Detach);
            println!("deleted {} breakpoint(s)", removed.len());
        }
        UserCommand::List => {
            for bp in session.breakpoints() {
                println!("{bp}");
            }
        }
        UserCommand::Interrupt => {
            if let Some(channel) = slot.channel() {
                if let Err(err) = channel.interrupt() {
                    warn!(%err, "interrupt failed");
                }
            }
        }
        UserCommand::Empty => {}
        command => {
            let Some(driver) = session.driver_mut() else {
                warn!("no live driver, command ignored");
                return;
            };
            match command {
                UserCommand::Continue => driver.resume(),
                UserCommand::Step => driver.step(),
                UserCommand::Next => driver.next(),
                UserCommand::Quit => driver.quit(),
                UserCommand::Raw(text) => driver.send_raw(&text),
                _ => {}
            }
        }
    }
}

fn flush(session: &mut SessionController, slot: &mut ChannelSlot) {
    if let Some(channel) = slot.channel_mut() {
        session.flush_to(channel);
    }
}

fn print_line(stream: StreamTag, text: &str, has_eol: bool) {
    let end = if has_eol { "\n" } else { "" };
    match stream {
        StreamTag::Stdout => print!("{text}{end}"),
        StreamTag::Stderr => eprint!("{text}{end}"),
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
