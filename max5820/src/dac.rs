//! MAX5820 DAC driver.
//!
//! This module provides the controller for the MAX5820 two-channel, 8-bit
//! DAC. It combines the pure codec in [`crate::protocol`] with a
//! [`Transport`] for bus access and a small in-memory store of each
//! channel's commanded power state.
//!
//! Every bus transaction runs under one per-device async lock, so a read's
//! command/response pair can never have another caller's bytes spliced into
//! it. The power-state store is ordinary synchronous state guarded
//! separately; querying it never touches the bus.
//!
//! Datasheet: <https://www.analog.com/media/en/technical-documentation/data-sheets/MAX5820.pdf>

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::hw_trait::{Transport, VrefRegulator};
use crate::protocol::{self, Channel, PowerdownMode};

/// Reference voltage in millivolts assumed when no regulator reading is
/// available and the caller asked for the stock fallback.
pub const DEFAULT_VREF_FALLBACK_MV: u16 = 3300;

/// A regulator handle as the controller stores it.
pub type BoxedRegulator = Box<dyn VrefRegulator + Send + Sync>;

/// Per-channel power state as last commanded by the host.
///
/// The hardware cannot be asked for this, so the store is authoritative for
/// what the host *wants*; after a failed sync or a resume it may be ahead
/// of what the chip is actually doing (see [`Max5820::resynchronize`]).
#[derive(Debug, Clone, Copy)]
struct ChannelState {
    powerdown: bool,
    powerdown_mode: PowerdownMode,
}

impl Default for ChannelState {
    fn default() -> Self {
        // the chip comes out of reset powered down through 100 kOhm
        Self {
            powerdown: true,
            powerdown_mode: PowerdownMode::HundredKToGround,
        }
    }
}

/// Output scale as a binary fraction: `numerator_mv / 2^shift` millivolts
/// per code step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    pub numerator_mv: u16,
    pub shift: u8,
}

impl Scale {
    /// Physical output voltage for a raw code, in millivolts.
    pub fn millivolts_for(self, code: u8) -> u32 {
        (u32::from(code) * u32::from(self.numerator_mv)) >> self.shift
    }
}

/// MAX5820 controller.
///
/// Cheap to share behind an `Arc`; all operations take `&self`.
pub struct Max5820<T> {
    bus: AsyncMutex<T>,
    channels: Mutex<[ChannelState; Channel::COUNT]>,
    vref_mv: u16,
    regulator: Option<BoxedRegulator>,
}

impl<T: Transport> Max5820<T> {
    /// Bring up a controller on `transport`.
    ///
    /// Both channels start recorded as powered down through 100 kOhm,
    /// matching the chip's reset state; nothing is sent on the bus here.
    ///
    /// The reference voltage is taken from `regulator` when one is given
    /// and answers; on any regulator failure the controller falls back to
    /// `vref_fallback_mv` when that is `Some`, releasing the regulator, or
    /// refuses to initialize when it is `None`. The resolved voltage is
    /// fixed for the controller's lifetime.
    pub async fn initialize(
        transport: T,
        regulator: Option<BoxedRegulator>,
        vref_fallback_mv: Option<u16>,
    ) -> Result<Self> {
        if vref_fallback_mv == Some(0) {
            return Err(Error::InvalidArgument(
                "a 0 mV vref fallback would make every code scale to nothing"
                    .into(),
            ));
        }

        let (vref_mv, regulator) =
            resolve_vref(regulator, vref_fallback_mv).await?;
        debug!(vref_mv, "MAX5820 controller initialized");

        Ok(Self {
            bus: AsyncMutex::new(transport),
            channels: Mutex::new([ChannelState::default(); Channel::COUNT]),
            vref_mv,
            regulator,
        })
    }

    /// Read a channel's current raw code from the chip.
    ///
    /// One command byte out, two response bytes back, both halves under the
    /// bus lock so no other transaction can slip between them.
    pub async fn read_value(&self, channel: u8) -> Result<u8> {
        let channel = Channel::from_index(channel)?;
        let command = protocol::read_command(channel);

        let mut bus = self.bus.lock().await;
        send_all(&mut *bus, &command).await?;
        let response = receive_exact(&mut *bus, 2).await?;
        drop(bus);

        let code = protocol::decode_read_response([response[0], response[1]]);
        trace!(channel = channel.index(), code, "read raw code");
        Ok(code)
    }

    /// Load a raw code into a channel.
    ///
    /// `code` is accepted as `u16` so that out-of-range input from wider
    /// host types is rejected here, before any bus traffic, rather than
    /// silently truncated.
    pub async fn write_value(&self, channel: u8, code: u16) -> Result<()> {
        let channel = Channel::from_index(channel)?;
        let code = u8::try_from(code).map_err(|_| {
            Error::InvalidArgument(format!(
                "raw code {code} exceeds the DAC's 8-bit range"
            ))
        })?;
        let command = protocol::write_command(channel, code);

        let mut bus = self.bus.lock().await;
        send_all(&mut *bus, &command).await?;
        drop(bus);

        trace!(channel = channel.index(), code, "wrote raw code");
        Ok(())
    }

    /// Force a channel into or out of power-down, using the channel's
    /// stored termination mode.
    ///
    /// The store is updated first and stays updated even if the hardware
    /// sync then fails, so on error the stored state is ahead of the chip;
    /// retrying the same call re-issues the sync.
    pub async fn set_powerdown(&self, channel: u8, active: bool) -> Result<()> {
        let channel = Channel::from_index(channel)?;
        let mode = {
            let mut channels = self.channels.lock();
            channels[channel.index()].powerdown = active;
            channels[channel.index()].powerdown_mode
        };
        let command = protocol::powerdown_command(channel, active, mode);

        let mut bus = self.bus.lock().await;
        let result = send_all(&mut *bus, &command).await;
        drop(bus);

        if let Err(e) = result {
            warn!(
                channel = channel.index(),
                active, "power-state sync failed; stored state is ahead of the hardware"
            );
            return Err(e);
        }
        debug!(channel = channel.index(), active, mode = %mode, "power state synchronized");
        Ok(())
    }

    /// Select a channel's power-down termination.
    ///
    /// Store-only: the chip is not told until the next
    /// `set_powerdown(channel, true)`, because a termination change has no
    /// electrical meaning while the output driver is on.
    pub fn set_powerdown_mode(
        &self,
        channel: u8,
        mode: PowerdownMode,
    ) -> Result<()> {
        let channel = Channel::from_index(channel)?;
        self.channels.lock()[channel.index()].powerdown_mode = mode;
        Ok(())
    }

    /// Whether a channel is recorded as powered down. Never touches the bus.
    pub fn powerdown_state(&self, channel: u8) -> Result<bool> {
        let channel = Channel::from_index(channel)?;
        Ok(self.channels.lock()[channel.index()].powerdown)
    }

    /// A channel's stored power-down termination. Never touches the bus.
    pub fn powerdown_mode(&self, channel: u8) -> Result<PowerdownMode> {
        let channel = Channel::from_index(channel)?;
        Ok(self.channels.lock()[channel.index()].powerdown_mode)
    }

    /// The code-to-voltage scale: vref / 2^10 millivolts per code step.
    ///
    /// This is the chip family's wire-level scale contract; it is reported
    /// as-is rather than recomputed from the 255-code range.
    pub fn scale(&self) -> Scale {
        Scale {
            numerator_mv: self.vref_mv,
            shift: 10,
        }
    }

    /// The resolved reference voltage in millivolts. Fixed at initialize.
    pub fn vref_mv(&self) -> u16 {
        self.vref_mv
    }

    /// Force both channels into power-down through 100 kOhm.
    ///
    /// Hardware-level shutdown that goes straight to the bus, ignoring the
    /// per-channel store; the stored state is what [`resynchronize`]
    /// restores afterwards.
    ///
    /// [`resynchronize`]: Max5820::resynchronize
    pub async fn suspend(&self) -> Result<()> {
        let command = protocol::global_powerdown_command(Some(
            PowerdownMode::HundredKToGround,
        ));
        let mut bus = self.bus.lock().await;
        send_all(&mut *bus, &command).await?;
        drop(bus);
        debug!("both channels forced into power-down");
        Ok(())
    }

    /// Power both channels up.
    ///
    /// Does not consult the per-channel store: after this call the outputs
    /// are live even for channels recorded as powered down, until
    /// [`resynchronize`] replays the store. The chip's global power-up
    /// command has no per-channel form.
    ///
    /// [`resynchronize`]: Max5820::resynchronize
    pub async fn resume(&self) -> Result<()> {
        let command = protocol::global_powerdown_command(None);
        let mut bus = self.bus.lock().await;
        send_all(&mut *bus, &command).await?;
        drop(bus);
        debug!("both channels powered up");
        Ok(())
    }

    /// Replay both channels' stored power state to the chip.
    ///
    /// Repairs the store/hardware divergence that [`resume`] (or a failed
    /// [`set_powerdown`] sync) leaves behind. Both syncs run under a single
    /// bus lock hold.
    ///
    /// [`resume`]: Max5820::resume
    /// [`set_powerdown`]: Max5820::set_powerdown
    pub async fn resynchronize(&self) -> Result<()> {
        let states = *self.channels.lock();

        let mut bus = self.bus.lock().await;
        for channel in [Channel::A, Channel::B] {
            let state = states[channel.index()];
            let command = protocol::powerdown_command(
                channel,
                state.powerdown,
                state.powerdown_mode,
            );
            send_all(&mut *bus, &command).await?;
        }
        drop(bus);

        debug!("stored power state replayed to the chip");
        Ok(())
    }

    /// Tear the controller down, releasing the regulator if one was kept.
    pub async fn shutdown(mut self) {
        if let Some(regulator) = self.regulator.as_mut() {
            regulator.disable();
            debug!("vref regulator released");
        }
    }
}

async fn resolve_vref(
    regulator: Option<BoxedRegulator>,
    fallback_mv: Option<u16>,
) -> Result<(u16, Option<BoxedRegulator>)> {
    let Some(mut regulator) = regulator else {
        return vref_fallback(fallback_mv, "no vref regulator available".into());
    };

    if let Err(e) = regulator.enable().await {
        regulator.disable();
        return vref_fallback(
            fallback_mv,
            format!("failed to enable vref regulator: {e}"),
        );
    }

    let microvolts = match regulator.voltage_microvolts().await {
        Ok(microvolts) => microvolts,
        Err(e) => {
            regulator.disable();
            return vref_fallback(
                fallback_mv,
                format!("failed to read vref regulator voltage: {e}"),
            );
        }
    };

    let millivolts = microvolts / 1000;
    if millivolts == 0 || millivolts > u32::from(u16::MAX) {
        regulator.disable();
        return vref_fallback(
            fallback_mv,
            format!("vref regulator reports an unusable {microvolts} uV"),
        );
    }

    Ok((millivolts as u16, Some(regulator)))
}

// A missing or broken regulator aborts initialization only when no
// fallback voltage is configured.
fn vref_fallback(
    fallback_mv: Option<u16>,
    cause: String,
) -> Result<(u16, Option<BoxedRegulator>)> {
    match fallback_mv {
        Some(mv) => {
            warn!(fallback_mv = mv, "{cause}; using fallback vref");
            Ok((mv, None))
        }
        None => Err(Error::Initialization(cause)),
    }
}

async fn send_all<T: Transport>(bus: &mut T, bytes: &[u8]) -> Result<()> {
    let sent = bus.send(bytes).await?;
    if sent != bytes.len() {
        return Err(Error::ShortTransfer {
            expected: bytes.len(),
            actual: sent,
        });
    }
    Ok(())
}

async fn receive_exact<T: Transport>(bus: &mut T, count: usize) -> Result<Vec<u8>> {
    let bytes = bus.receive(count).await?;
    if bytes.len() != count {
        return Err(Error::ShortTransfer {
            expected: count,
            actual: bytes.len(),
        });
    }
    Ok(bytes)
}
