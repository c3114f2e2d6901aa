//! FMJ Bridge Console
//!
//! Runs the receiver bridge headless against a simulated Arcam FMJ and
//! drives its zones from stdin. Usage:
//!
//! ```text
//! fmj-console [settings.json]
//! ```

mod commands;
mod host;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use commands::{describe, Command, HELP};
use fmj_bridge::{platform, CommandSink, LifecycleHook, Platform};
use fmj_protocol::Zone;
use fmj_sim::VirtualReceiver;
use host::LoggingHost;
use settings::Settings;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fmj_console=info,fmj_bridge=info,fmj_protocol=info,fmj_sim=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => Settings::load(&path)?,
        None => Settings::default(),
    };

    let link_id = settings.receiver.link_id();
    info!("Starting FMJ console for simulated receiver {}", link_id);

    let receiver = Arc::new(VirtualReceiver::from_config(
        link_id,
        settings.simulator.clone(),
    ));
    let host = Arc::new(LoggingHost::default());
    let platform = platform::setup(&settings.receiver, receiver.clone(), host)?;

    println!("{}", HELP);
    let result = run_console(&platform, &receiver).await;

    platform.shutdown().await;
    info!("Console stopped");
    result
}

/// Read commands from stdin until `quit`, end of input or Ctrl-C
async fn run_console(platform: &Platform, receiver: &VirtualReceiver) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut zone = platform
        .controllers()
        .first()
        .map(|controller| controller.zone())
        .unwrap_or(Zone::Main);

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                return Ok(());
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                warn!("{:#}", e);
                continue;
            }
        };

        match command {
            Command::Quit => return Ok(()),
            Command::Help => println!("{}", HELP),
            Command::Drop => receiver.drop_connection("dropped from console"),
            Command::SelectZone(selected) => {
                if platform.controllers().iter().any(|c| c.zone() == selected) {
                    zone = selected;
                    info!("Controlling zone {}", zone);
                } else {
                    warn!("Zone {} is not configured", selected);
                }
            }
            command => {
                if let Err(e) = execute(platform, zone, command).await {
                    warn!("{:#}", e);
                }
            }
        }
    }
}

/// Run a zone command against the selected controller
async fn execute(platform: &Platform, zone: Zone, command: Command) -> anyhow::Result<()> {
    let controller = platform
        .controllers()
        .iter()
        .find(|controller| controller.zone() == zone)
        .ok_or_else(|| anyhow::anyhow!("Zone {} is not configured", zone))?;

    match command {
        Command::PowerOn => controller.power_on().await?,
        Command::PowerOff => controller.power_off().await?,
        Command::Mute(mute) => controller.set_mute(mute).await?,
        Command::Volume(fraction) => controller.set_volume_fraction(fraction).await?,
        Command::VolumeUp => controller.volume_step_up().await?,
        Command::VolumeDown => controller.volume_step_down().await?,
        Command::Source(name) => controller.select_source(&name).await?,
        Command::SoundMode(name) => controller.select_sound_mode(&name).await?,
        Command::Refresh => controller.refresh().await?,
        Command::Status => {
            println!("{}", describe(controller.as_ref()));
            println!(
                "  link: {} ({:?})",
                controller.link_id(),
                platform.supervisor().state()
            );
        }
        Command::SelectZone(_) | Command::Drop | Command::Help | Command::Quit => {}
    }
    Ok(())
}
