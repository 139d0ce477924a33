//! slotshell - line-oriented front end for the slotshell engine
//!
//! Reads one command per line from stdin and runs each as a slot, printing
//! its output as it arrives. Ctrl-C kills the running slot's process tree.

use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};

use slotshell::{Config, ConfigLoader, Engine, InvocationState, ProcessHandle, ShellKind};

/// Application configuration
#[derive(Debug, Default, PartialEq)]
struct AppArgs {
    /// Configuration file path
    config_path: Option<PathBuf>,
    /// Enable debug mode
    debug: bool,
    /// Per-command timeout
    timeout: Option<Duration>,
    /// Initial shell kind
    shell: Option<ShellKind>,
    /// Print each result once complete instead of streaming
    batch: bool,
}

/// What the command line asked for
#[derive(Debug, PartialEq)]
enum Launch {
    Run(AppArgs),
    Help,
    Version,
}

impl AppArgs {
    /// Parse command line arguments (program name excluded)
    fn parse<I>(args: I) -> anyhow::Result<Launch>
    where
        I: IntoIterator<Item = String>,
    {
        let mut app_args = AppArgs::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().ok_or_else(|| anyhow!("Missing config file path"))?;
                    app_args.config_path = Some(PathBuf::from(path));
                }
                "--debug" | "-d" => {
                    app_args.debug = true;
                }
                "--timeout" | "-t" => {
                    let secs = args.next().ok_or_else(|| anyhow!("Missing timeout seconds"))?;
                    let secs: f64 = secs
                        .parse()
                        .with_context(|| format!("Invalid timeout '{}'", secs))?;
                    if !secs.is_finite() || secs <= 0.0 {
                        bail!("Timeout must be a positive number of seconds");
                    }
                    let timeout = Duration::try_from_secs_f64(secs)
                        .map_err(|e| anyhow!("Timeout '{}' out of range: {}", secs, e))?;
                    app_args.timeout = Some(timeout);
                }
                "--shell" | "-s" => {
                    let kind = args.next().ok_or_else(|| anyhow!("Missing shell kind"))?;
                    app_args.shell = Some(
                        ShellKind::from_string(&kind)
                            .ok_or_else(|| anyhow!("Unknown shell kind '{}'", kind))?,
                    );
                }
                "--batch" | "-b" => {
                    app_args.batch = true;
                }
                "--help" | "-?" | "-h" => return Ok(Launch::Help),
                "--version" | "-v" => return Ok(Launch::Version),
                other => bail!("Unknown option: {}", other),
            }
        }

        Ok(Launch::Run(app_args))
    }
}

/// Print help information
fn print_help() {
    println!("slotshell - run shell commands one slot at a time");
    println!();
    println!("USAGE:");
    println!("    slotshell [OPTIONS] < commands");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>     Path to configuration file");
    println!("    -d, --debug             Enable debug logging");
    println!("    -t, --timeout <SECS>    Kill each command after SECS seconds");
    println!("    -s, --shell <KIND>      primary (cmd/sh) or alternate (PowerShell)");
    println!("    -b, --batch             Print each result when the command finishes");
    println!("    -h, --help              Print this help message");
    println!("    -v, --version           Print version information");
    println!();
    println!("COMMANDS:");
    println!("    cd <dir>                Change the working directory of later slots");
    println!("    :shell <KIND>           Switch shell kind");
    println!("    :pwd                    Print the working directory");
    println!("    :quit                   Exit");
    println!();
    println!("ENVIRONMENT:");
    println!("    SLOTSHELL_CONFIG        Path to configuration file");
    println!("    SLOTSHELL_DEBUG         Enable debug logging (1 or true)");
    println!("    RUST_LOG                Logging filter (error, warn, info, debug, trace)");
}

/// Install the tracing subscriber. Logs go to stderr so they never mix
/// with command output.
fn init_logging(args: &AppArgs, config: &Config) {
    let debug_env = env::var("SLOTSHELL_DEBUG")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let level = if args.debug || debug_env {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };

    let env_filter = env::var("RUST_LOG").unwrap_or(level);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Load configuration from the explicit path or the default locations
fn load_configuration(args: &AppArgs) -> anyhow::Result<Config> {
    match &args.config_path {
        Some(path) => ConfigLoader::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(ConfigLoader::load().unwrap_or_else(|e| {
            eprintln!("Failed to load configuration: {}. Using defaults", e);
            Config::default()
        })),
    }
}

/// Handle a `:`-prefixed front-end command. Returns false to quit.
fn run_meta_command(engine: &Engine, line: &str) -> bool {
    let mut parts = line[1..].split_whitespace();
    match parts.next() {
        Some("quit") | Some("exit") => return false,
        Some("pwd") => println!("{}", engine.current_directory().display()),
        Some("shell") => match parts.next() {
            None => println!("{}", engine.shell_kind()),
            Some(kind) => match ShellKind::from_string(kind) {
                Some(kind) => engine.set_shell_kind(kind),
                None => eprintln!("Unknown shell kind '{}'", kind),
            },
        },
        _ => eprintln!("Unknown command '{}'", line),
    }
    true
}

/// Run one slot, streaming its lines to stdout
async fn run_streaming_slot(engine: &Engine, command: &str, timeout: Option<Duration>) {
    let current: Arc<Mutex<Option<ProcessHandle>>> = Arc::new(Mutex::new(None));
    let published = current.clone();

    let run = engine.run_streaming(
        command,
        |line| println!("{}", line),
        move |handle| {
            if let Ok(mut slot) = published.lock() {
                *slot = handle;
            }
        },
        timeout,
    );
    tokio::pin!(run);

    let mut interrupted = false;
    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                let handle = current.lock().ok().and_then(|slot| slot.clone());
                match handle {
                    Some(handle) => handle.terminate(),
                    None => debug!("Ctrl-C with no running process"),
                }
            }
        }
    };

    match result {
        Ok(InvocationState::KilledExternally) => println!("^C"),
        Ok(state) => debug!("Slot finished: {}", state.as_str()),
        Err(e) => eprintln!("{}", e),
    }
}

/// Run one slot and print its merged output once complete
async fn run_batch_slot(engine: &Engine, command: &str, timeout: Option<Duration>) {
    tokio::select! {
        result = engine.run_batch(command, timeout) => match result {
            Ok(outcome) if outcome.text.is_empty() => {}
            Ok(outcome) => println!("{}", outcome.text),
            Err(e) => eprintln!("{}", e),
        },
        // Dropping the run kills the process tree
        _ = tokio::signal::ctrl_c() => println!("^C"),
    }
}

fn print_prompt(engine: &Engine) {
    print!("{}> ", engine.current_directory().display());
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = match AppArgs::parse(env::args().skip(1)) {
        Ok(Launch::Run(args)) => args,
        Ok(Launch::Help) => {
            print_help();
            return Ok(());
        }
        Ok(Launch::Version) => {
            println!("slotshell v{}", slotshell::VERSION);
            return Ok(());
        }
        Err(e) => {
            eprintln!("{}", e);
            print_help();
            process::exit(1);
        }
    };

    let config = load_configuration(&args)?;
    init_logging(&args, &config);

    let engine = slotshell::init_with_config(&config);
    if let Some(kind) = args.shell {
        engine.set_shell_kind(kind);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt(&engine);
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read input: {}", e);
                break;
            }
        };

        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if command.starts_with(':') {
            if !run_meta_command(&engine, command) {
                break;
            }
            continue;
        }

        if args.batch {
            run_batch_slot(&engine, command, args.timeout).await;
        } else {
            run_streaming_slot(&engine, command, args.timeout).await;
        }
    }

    info!("slotshell exiting");
    Ok(())
}
