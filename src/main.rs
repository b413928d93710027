use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::time::Duration;
use tracing::info;

use sven_control::actuator::config::{ServerConfig, DEFAULT_PORT};
use sven_control::comms::local_api;
use sven_control::panel::{empty_cache, ControlPanel, StatePoller};
use sven_control::protocol::{Direction, MoveMode};
use sven_control::transport::{ClientConfig, SvenClient, API_HOST_ENV};
use sven_control::utils;

#[derive(Parser)]
#[command(name = "sven-control", version, about = "Sven lift column control")]
struct AppCli {
    /// API host of the command endpoint
    #[arg(long, env = API_HOST_ENV, global = true)]
    api_host: Option<String>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the command endpoint backed by a simulated actuator
    Serve {
        #[arg(long)]
        port: Option<u16>,
        /// JSON config file; defaults apply when omitted
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Send one command
    Move {
        #[arg(value_enum)]
        mode: ModeArg,
        /// ms (duration), cm (relative), mm (absolute) or preset index (position)
        value: i64,
        #[arg(long, value_enum, default_value_t = DirectionArg::Up)]
        direction: DirectionArg,
    },
    /// Print the current actuator state
    State,
    /// Poll the actuator state until interrupted
    Watch {
        #[arg(long, default_value_t = 10)]
        interval_secs: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Duration,
    Relative,
    Absolute,
    Position,
}

impl From<ModeArg> for MoveMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Duration => MoveMode::Duration,
            ModeArg::Relative => MoveMode::Relative,
            ModeArg::Absolute => MoveMode::Absolute,
            ModeArg::Position => MoveMode::Position,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for Direction {
    fn from(d: DirectionArg) -> Self {
        match d {
            DirectionArg::Up => Direction::Up,
            DirectionArg::Down => Direction::Down,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = AppCli::parse();
    utils::logging::init(&args.log_level);

    let client_config = ClientConfig::for_host(args.api_host.as_deref());

    match args.command {
        Commands::Serve { port, config } => {
            let mut cfg = match config {
                Some(path) => ServerConfig::from_file(&path)?,
                None => ServerConfig::default(),
            };
            cfg.port = port.unwrap_or(cfg.port);
            if cfg.port != DEFAULT_PORT {
                info!(port = cfg.port, "clients must set SVEN_API_PORT to reach this port");
            }
            local_api::serve(cfg).await?;
        }
        Commands::Move {
            mode,
            value,
            direction,
        } => {
            let panel = ControlPanel::new(&client_config);
            let mode = MoveMode::from(mode);
            panel.select_mode(mode);
            if mode.is_directional() {
                panel.choose_direction(direction.into());
            }
            let notification = panel.submit(value, None).await?;
            println!(
                "[{}] {}: {}",
                notification.timestamp,
                notification.title(),
                notification.text
            );
            if !notification.is_success() {
                bail!("command failed");
            }
        }
        Commands::State => {
            let state = SvenClient::new(&client_config).fetch_state().await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Commands::Watch { interval_secs } => {
            let client = SvenClient::new(&client_config);
            info!(url = %client.state_url(), interval_secs, "polling actuator state");
            let mut poller = StatePoller::spawn_with(
                move || {
                    let client = client.clone();
                    async move { client.fetch_state().await }
                },
                Duration::from_secs(interval_secs.max(1)),
                empty_cache(),
                |state| println!("{} mm ({})", state.height_mm, state.position),
            );
            tokio::signal::ctrl_c().await?;
            info!("shutdown signal received, stopping poller");
            poller.stop();
        }
    }

    Ok(())
}
