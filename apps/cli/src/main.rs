use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mibridge_core::{BridgeClient, BroadcastDiscovery, ClientConfig, Command, Discover};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "WiFi bridge V6 light control", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bridge IP address (skips broadcast discovery)
    #[arg(long)]
    bridge: Option<IpAddr>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Broadcast the discovery token and print the bridge that answers
    Discover,
    /// Switch lights on
    On,
    /// Switch lights off
    Off,
    /// Switch to white
    White,
    /// Set the hue (0-255)
    Color { hue: u8 },
    /// Set brightness in percent (clamped to 100)
    Brightness { level: u8 },
    /// Start a built-in animation
    Mode { mode: u8 },
    /// Slow down the running animation
    Slow,
    /// Speed up the running animation
    Fast,
    /// Flash: on, full brightness, alert animation
    Alert,
    /// Write the default configuration to a file
    InitConfig { path: PathBuf },
}

fn load_config(args: &Args) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if args.bridge.is_some() {
        config.bridge_ip = args.bridge;
    }
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    // `None` selects the scripted alert sequence.
    let command = match &args.command {
        Action::InitConfig { path } => {
            config.save_to_file(path)?;
            info!(path = %path.display(), "Configuration written");
            return Ok(());
        }
        Action::Discover => {
            let bridge = BroadcastDiscovery::new(config.discovery_bind, config.discovery_target)
                .discover(config.discovery_timeout())?;
            println!("{},{},{}", bridge.ip, bridge.mac, bridge.model);
            return Ok(());
        }
        Action::On => Some(Command::On),
        Action::Off => Some(Command::Off),
        Action::White => Some(Command::White),
        Action::Color { hue } => Some(Command::Color(*hue)),
        Action::Brightness { level } => Some(Command::Brightness(*level)),
        Action::Mode { mode } => Some(Command::Mode(*mode)),
        Action::Slow => Some(Command::ModeSlow),
        Action::Fast => Some(Command::ModeFast),
        Action::Alert => None,
    };

    let mut client = BridgeClient::connect(config)?;
    match command {
        Some(command) => client.send_reliable(command)?,
        None => client.alert()?,
    }
    client.close();
    Ok(())
}

fn main() {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if args.verbose {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::INFO.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(e) = run(args) {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
