//! Console commands

use anyhow::{anyhow, bail, Context};
use fmj_bridge::{MediaPlayerEntity, PowerState, ReadableState};
use fmj_protocol::Zone;

pub const HELP: &str = "\
Commands:
  zone <1|2>          select the zone the following commands act on
  on | off            power the zone on or off
  mute <on|off>       mute or unmute
  volume <0.0-1.0>    set the volume
  up | down           step the volume
  source <NAME>       select an input (e.g. CD, DAB, FM)
  mode <NAME>         select a decode mode (e.g. STEREO, DOLBY_PL)
  refresh             re-read the zone from the receiver
  status              print the zone state
  drop                make the simulated receiver drop the connection
  quit                shut down";

/// A parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SelectZone(Zone),
    PowerOn,
    PowerOff,
    Mute(bool),
    Volume(f64),
    VolumeUp,
    VolumeDown,
    Source(String),
    SoundMode(String),
    Refresh,
    Status,
    Drop,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("Empty command");
        };
        let arg = words.next();

        let command = match (verb.to_ascii_lowercase().as_str(), arg) {
            ("zone", Some(n)) => {
                let number: u8 = n.parse().with_context(|| format!("Invalid zone '{}'", n))?;
                let zone =
                    Zone::from_number(number).ok_or_else(|| anyhow!("No zone {}", number))?;
                Command::SelectZone(zone)
            }
            ("on", None) => Command::PowerOn,
            ("off", None) => Command::PowerOff,
            ("mute", Some("on")) => Command::Mute(true),
            ("mute", Some("off")) => Command::Mute(false),
            ("volume", Some(v)) => {
                let fraction: f64 = v.parse().with_context(|| format!("Invalid volume '{}'", v))?;
                if !(0.0..=1.0).contains(&fraction) {
                    bail!("Volume must be between 0.0 and 1.0");
                }
                Command::Volume(fraction)
            }
            ("up", None) => Command::VolumeUp,
            ("down", None) => Command::VolumeDown,
            ("source", Some(name)) => Command::Source(name.to_ascii_uppercase()),
            ("mode", Some(name)) => Command::SoundMode(name.to_string()),
            ("refresh", None) => Command::Refresh,
            ("status", None) => Command::Status,
            ("drop", None) => Command::Drop,
            ("help", None) => Command::Help,
            ("quit" | "exit", None) => Command::Quit,
            _ => bail!("Unknown command '{}', try 'help'", line.trim()),
        };

        if words.next().is_some() {
            bail!("Too many arguments for '{}'", verb);
        }
        Ok(command)
    }
}

/// Multi-line description of an entity's presentation state
pub fn describe(entity: &dyn MediaPlayerEntity) -> String {
    let power = match entity.power_state() {
        PowerState::On => "on",
        PowerState::Off => "off",
    };
    let volume = entity
        .volume_fraction()
        .map(|v| format!("{:.0}%", v * 100.0))
        .unwrap_or_else(|| "-".to_string());
    let muted = match entity.is_muted() {
        Some(true) => " (muted)",
        _ => "",
    };

    let mut lines = vec![
        format!("{}: {}", entity.name(), power),
        format!("  volume: {}{}", volume, muted),
        format!(
            "  source: {}",
            entity.current_source().as_deref().unwrap_or("-")
        ),
    ];
    if let Some(mode) = entity.current_sound_mode() {
        lines.push(format!("  sound mode: {}", mode));
    }
    if let Some(title) = entity.now_playing_title() {
        lines.push(format!("  playing: {}", title));
    }
    if let Some(artist) = entity.now_playing_artist_text() {
        lines.push(format!("  now: {}", artist));
    }
    lines.join("\n")
}
