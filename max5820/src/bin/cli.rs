//! Command-line interface for the MAX5820 controller.
//!
//! This binary talks straight to the chip through the Linux i2c-dev
//! transport: raw-code reads and writes, per-channel power management, and
//! the whole-chip suspend/resume transitions. It is deliberately thin;
//! everything of substance lives in the library.

use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::Path;
use strum::IntoEnumIterator;

use max5820::config::Config;
use max5820::regulator::SysfsRegulator;
use max5820::tracing::{self, prelude::*};
use max5820::transport::I2cDev;
use max5820::{BoxedRegulator, Max5820, PowerdownMode};

const USAGE: &str = "\
usage: max5820-cli <command> [args]

commands:
  read <channel>                print a channel's raw code and voltage
  write <channel> <code>        load a raw code (0-255) into a channel
  powerdown <channel> <on|off>  force a channel into or out of power-down
  mode <channel> <mode>         select a channel's power-down termination
  state                         print the stored per-channel power state
  scale                         print the code-to-voltage scale
  suspend                       force both channels into power-down
  resume                        power both channels up
  resync                        replay the stored power state to the chip

channels are 0 and 1. Configuration is read from the JSON file named by
MAX5820_CONFIG when that is set; defaults otherwise.
";

#[tokio::main]
async fn main() -> Result<()> {
    tracing::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprint!("{USAGE}");
        std::process::exit(2);
    };

    let config = match env::var_os("MAX5820_CONFIG") {
        Some(path) => Config::load_from(Path::new(&path))?,
        None => Config::default(),
    };

    let transport = I2cDev::open(&config.device.path, config.device.address)
        .await
        .with_context(|| format!("opening {}", config.device.path.display()))?;
    let regulator: Option<BoxedRegulator> = config
        .vref
        .regulator_microvolts
        .as_ref()
        .map(|path| Box::new(SysfsRegulator::new(path)) as BoxedRegulator);

    let dac =
        Max5820::initialize(transport, regulator, config.vref.fallback_mv)
            .await?;
    debug!(vref_mv = dac.vref_mv(), "controller up");

    match (command.as_str(), &args[1..]) {
        ("read", [channel]) => {
            let channel = parse_channel(channel)?;
            let code = dac.read_value(channel).await?;
            let millivolts = dac.scale().millivolts_for(code);
            println!("channel {channel}: code {code} ({millivolts} mV)");
        }
        ("write", [channel, code]) => {
            let channel = parse_channel(channel)?;
            let code: u16 =
                code.parse().context("raw code must be an integer")?;
            dac.write_value(channel, code).await?;
        }
        ("powerdown", [channel, state]) => {
            let active = match state.as_str() {
                "on" => true,
                "off" => false,
                other => bail!("expected on or off, not {other:?}"),
            };
            dac.set_powerdown(parse_channel(channel)?, active).await?;
        }
        ("mode", [channel, name]) => {
            let mode: PowerdownMode = name.parse().map_err(|_| {
                anyhow!(
                    "unknown power-down mode {name:?}; expected one of: {}",
                    PowerdownMode::iter()
                        .map(|mode| mode.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })?;
            dac.set_powerdown_mode(parse_channel(channel)?, mode)?;
        }
        ("state", []) => {
            for channel in 0..2u8 {
                let down = dac.powerdown_state(channel)?;
                let mode = dac.powerdown_mode(channel)?;
                if down {
                    println!("channel {channel}: powered down ({mode})");
                } else {
                    println!("channel {channel}: active (mode {mode} on next power-down)");
                }
            }
        }
        ("scale", []) => {
            let scale = dac.scale();
            println!(
                "{} mV / 2^{} per code step",
                scale.numerator_mv, scale.shift
            );
        }
        ("suspend", []) => dac.suspend().await?,
        ("resume", []) => dac.resume().await?,
        ("resync", []) => dac.resynchronize().await?,
        _ => {
            eprint!("{USAGE}");
            std::process::exit(2);
        }
    }

    dac.shutdown().await;
    Ok(())
}

fn parse_channel(arg: &str) -> Result<u8> {
    arg.parse().with_context(|| format!("bad channel {arg:?}"))
}
