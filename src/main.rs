//! Binary entrypoint for the Lantern CLI.
//!
//! Commands:
//! - `play` (default) - interactive menu / adventure UI
//! - `send <action>` - play a single turn and type the reply to stdout
//! - `init [--force]` - write a starter `lantern.toml`
//! - `status` - print the effective configuration and the decoded host session data
//!
//! See the library crate docs for module-level details: `lantern::`.
use std::io::Write;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{error, info};

use lantern::adventure::host::HOST_WARNING;
use lantern::adventure::{HostSession, HttpBackend, RevealOutcome, StoryBackend, Typewriter};
use lantern::config::Config;
use lantern::logutil::redact;
use lantern::ui::plain::PlainTarget;

#[derive(Parser)]
#[command(name = "lantern")]
#[command(about = "Terminal client for the «Мир Теней и Огня» text adventure")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "lantern.toml", global = true)]
    config: String,

    /// Host session data (overrides the environment variable and the config file)
    #[arg(long, global = true)]
    init_data: Option<String>,

    /// Backend base URL (overrides LANTERN_BASE_URL and the config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive menu / adventure screen
    Play,
    /// Send one action and type the narrative reply to stdout
    Send {
        /// Player action; leave empty for the opening narrative
        #[arg(default_value = "")]
        action: String,
        /// Print the reply at once instead of typing it out
        #[arg(long)]
        instant: bool,
    },
    /// Write a starter configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show effective configuration and host session data
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Play);

    if let Commands::Init { force } = command {
        init_logging(&None, cli.verbose, true);
        if !force && tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
            return Err(anyhow!(
                "{} already exists (use --force to overwrite)",
                cli.config
            ));
        }
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let mut config = Config::load_or_default(&cli.config).await?;
    config.apply_env();
    if let Some(url) = cli.base_url.clone() {
        config.backend.base_url = url;
    }
    config.validate()?;

    let interactive = matches!(command, Commands::Play);
    init_logging(&Some(config.clone()), cli.verbose, !interactive);
    info!("Starting Lantern v{}", env!("CARGO_PKG_VERSION"));

    let host = HostSession::from_env(cli.init_data.as_deref(), &config.host);

    match command {
        Commands::Play => {
            let backend = HttpBackend::new(&config.backend)?;
            info!("Backend endpoint: {}", backend.endpoint());
            if let Ok(h) = &host {
                info!("Host session data: {}", redact(h.init_data()));
            }
            lantern::ui::run_interactive(&config, host, Arc::new(backend)).await?;
        }
        Commands::Send { action, instant } => {
            let host = match host {
                Ok(h) => h,
                Err(e) => {
                    for line in HOST_WARNING {
                        eprintln!("{}", line);
                    }
                    return Err(e.into());
                }
            };
            let backend = HttpBackend::new(&config.backend)?;
            let action = action.trim().to_string();
            if !action.is_empty() {
                println!("{}: {}", config.display.player_label, action);
            }
            match backend.step(host.init_data(), &action).await {
                Ok(text) => {
                    print!("{}: ", config.display.narrator_label);
                    let _ = std::io::stdout().flush();
                    if instant {
                        println!("{}", text);
                    } else {
                        let target = Arc::new(Mutex::new(PlainTarget::new(std::io::stdout())));
                        let outcome = Typewriter::new()
                            .reveal(target, text, config.display.typing_interval(), || {
                                println!()
                            })
                            .finished()
                            .await;
                        if let RevealOutcome::Superseded { steps } = outcome {
                            error!("Reveal stopped after {} characters", steps);
                        }
                    }
                }
                Err(e) => {
                    eprintln!("❌ {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Status => {
            println!("Config file:     {}", cli.config);
            println!("Endpoint:        {}", config.backend.endpoint_url());
            println!("Timeout:         {}s", config.backend.timeout_seconds);
            println!("Typing interval: {}ms", config.display.typing_interval_ms);
            match &host {
                Ok(h) => {
                    let data = h.data();
                    println!("initData:        {}", redact(h.init_data()));
                    println!(
                        "Player:          {}",
                        h.player_name().unwrap_or_else(|| "(unknown)".to_string())
                    );
                    if let Some(user) = &data.user {
                        println!("User id:         {}", user.id);
                    }
                    if let Some(at) = data.auth_date {
                        println!("Auth date:       {}", at.format("%Y-%m-%d %H:%M:%SZ"));
                    }
                    println!(
                        "Signed:          {}",
                        if data.is_signed() { "yes" } else { "no" }
                    );
                }
                Err(e) => {
                    println!("initData:        missing ({})", e);
                }
            }
        }
        Commands::Init { .. } => unreachable!("handled before config load"),
    }

    Ok(())
}

/// Configure env_logger. The full-screen UI owns the terminal, so `console` is false
/// for `play` and records only go to the log file.
fn init_logging(config: &Option<Config>, verbosity: u8, console: bool) {
    let mut builder = env_logger::Builder::new();
    // Base level from CLI verbosity overrides config
    let base_level = match (verbosity, config) {
        (0, Some(cfg)) => cfg.logging.level_filter(),
        (0, None) => log::LevelFilter::Info,
        (1, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file_path())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    match file {
        Some(f) => {
            let sink = Mutex::new(f);
            let echo = console && atty::is(atty::Stream::Stderr);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = sink.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if echo {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None if console => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
        None => {
            // No file and no console: keep the alternate screen clean.
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
}
