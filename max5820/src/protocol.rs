//! MAX5820 wire protocol.
//!
//! Pure translation between logical DAC operations and the command bytes
//! the chip accepts on the bus. Nothing in this module performs I/O.
//!
//! The chip takes one- or two-byte commands. An output value is an 8-bit
//! code packed into the 12-bit-aligned register format: the code's top
//! nibble rides in the low nibble of the command byte and its bottom nibble
//! in the high nibble of the data byte, low nibble zero. The 0xF0 prefix
//! switches the chip into extended command mode, where the second byte
//! carries channel-select flags and a power-state value instead.
//!
//! Datasheet: <https://www.analog.com/media/en/technical-documentation/data-sheets/MAX5820.pdf>

use strum::{Display, EnumIter, EnumString};

use crate::error::Error;

/// Command bytes
pub mod commands {
    /// Load DAC A's input and output registers from the data byte.
    pub const LOAD_DAC_A: u8 = 0x00;
    /// Load DAC B's input and output registers from the data byte.
    pub const LOAD_DAC_B: u8 = 0x10;
    /// Prefix switching the chip into power-state control.
    pub const EXTENDED_COMMAND_MODE: u8 = 0xF0;
    /// Request DAC A's current code; answered with two bytes.
    pub const READ_DAC_A: u8 = 0xF1;
    /// Request DAC B's current code; answered with two bytes.
    pub const READ_DAC_B: u8 = 0xF2;
}

/// Second-byte fields of an extended command
pub mod extended {
    pub const POWER_UP: u8 = 0x00; // output driver on
    pub const POWER_DOWN_THREE_STATE: u8 = 0x01; // output floats
    pub const POWER_DOWN_1K_TO_GND: u8 = 0x02; // 1 kOhm termination
    pub const POWER_DOWN_100K_TO_GND: u8 = 0x03; // 100 kOhm termination
    pub const DAC_A: u8 = 0x04; // channel-select flags; OR together
    pub const DAC_B: u8 = 0x08;
    pub const DAC_BOTH: u8 = DAC_A | DAC_B;
}

/// One of the chip's two output channels.
///
/// Constructed only through [`Channel::from_index`], which is the single
/// validation point for channel indices coming in from callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    A = 0,
    B = 1,
}

impl Channel {
    /// Number of channels on the chip.
    pub const COUNT: usize = 2;

    /// Validate a caller-supplied channel index.
    pub fn from_index(index: u8) -> Result<Self, Error> {
        match index {
            0 => Ok(Channel::A),
            1 => Ok(Channel::B),
            other => Err(Error::InvalidArgument(format!(
                "no DAC channel {other}; the MAX5820 has channels 0 and 1"
            ))),
        }
    }

    /// The channel's index, 0 or 1.
    pub fn index(self) -> usize {
        self as usize
    }

    fn select_flag(self) -> u8 {
        match self {
            Channel::A => extended::DAC_A,
            Channel::B => extended::DAC_B,
        }
    }
}

/// Output termination while a channel is powered down.
///
/// The stored mode is meaningful only while the channel is powered down,
/// but it persists across power-up/power-down toggles. String forms follow
/// the names the chip family's documentation uses.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter,
)]
pub enum PowerdownMode {
    /// Output driver off, pin left floating.
    #[strum(serialize = "three_state")]
    ThreeState,
    /// Output pulled to ground through 1 kOhm.
    #[strum(serialize = "1kohm_to_gnd")]
    OneKToGround,
    /// Output pulled to ground through 100 kOhm. The chip's power-on state.
    #[default]
    #[strum(serialize = "100kohm_to_gnd")]
    HundredKToGround,
}

impl PowerdownMode {
    /// The mode's value in an extended command: one above its index, since
    /// 0 in that position means power up.
    pub fn wire_bits(self) -> u8 {
        self as u8 + 1
    }
}

/// Command requesting `channel`'s current code.
pub fn read_command(channel: Channel) -> [u8; 1] {
    match channel {
        Channel::A => [commands::READ_DAC_A],
        Channel::B => [commands::READ_DAC_B],
    }
}

/// Command loading the 8-bit `code` into `channel`.
pub fn write_command(channel: Channel, code: u8) -> [u8; 2] {
    let base = match channel {
        Channel::A => commands::LOAD_DAC_A,
        Channel::B => commands::LOAD_DAC_B,
    };
    [base | (code >> 4), (code & 0x0f) << 4]
}

/// Recover the 8-bit code from a two-byte read response.
///
/// Inverse of the packing in [`write_command`].
pub fn decode_read_response(response: [u8; 2]) -> u8 {
    ((response[0] & 0x0f) << 4) | (response[1] >> 4)
}

/// Command moving `channel` into (`active`) or out of power-down.
///
/// `mode` selects the termination and only matters when `active` is true.
pub fn powerdown_command(
    channel: Channel,
    active: bool,
    mode: PowerdownMode,
) -> [u8; 2] {
    let mut field = channel.select_flag();
    if active {
        field |= mode.wire_bits();
    } else {
        field |= extended::POWER_UP;
    }
    [commands::EXTENDED_COMMAND_MODE, field]
}

/// Command driving both channels' power state at once.
///
/// `Some(mode)` powers both down in `mode`; `None` powers both up. Used by
/// the suspend/resume transitions, which never act on a single channel.
pub fn global_powerdown_command(mode: Option<PowerdownMode>) -> [u8; 2] {
    let bits = mode.map_or(extended::POWER_UP, PowerdownMode::wire_bits);
    [commands::EXTENDED_COMMAND_MODE, extended::DAC_BOTH | bits]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;
    use test_case::test_case;

    #[test_case(Channel::A, [0xF1]; "channel a")]
    #[test_case(Channel::B, [0xF2]; "channel b")]
    fn read_command_bytes(channel: Channel, expected: [u8; 1]) {
        assert_eq!(read_command(channel), expected);
    }

    #[test_case(Channel::A, 0x00, [0x00, 0x00]; "a zero")]
    #[test_case(Channel::A, 0xFF, [0x0F, 0xF0]; "a full scale")]
    #[test_case(Channel::A, 0xC5, [0x0C, 0x50]; "a mid code")]
    #[test_case(Channel::B, 0x9A, [0x19, 0xA0]; "b mid code")]
    #[test_case(Channel::B, 0x01, [0x10, 0x10]; "b low code")]
    fn write_command_packs_nibbles(channel: Channel, code: u8, expected: [u8; 2]) {
        assert_eq!(write_command(channel, code), expected);
    }

    #[test]
    fn write_command_pads_low_nibble_with_zero() {
        for code in 0..=255u8 {
            let bytes = write_command(Channel::A, code);
            assert_eq!(bytes[1] & 0x0f, 0, "code {code:#04x}");
        }
    }

    #[test]
    fn decode_recovers_every_code_on_both_channels() {
        for channel in [Channel::A, Channel::B] {
            for code in 0..=255u8 {
                let packed = write_command(channel, code);
                assert_eq!(decode_read_response(packed), code);
            }
        }
    }

    #[test]
    fn decode_read_response_example() {
        // top nibble of the code in the first byte's low nibble, bottom
        // nibble in the second byte's high nibble
        assert_eq!(decode_read_response([0x3C, 0x50]), 197);
    }

    #[test_case(Channel::A, PowerdownMode::ThreeState, [0xF0, 0x05]; "a three state")]
    #[test_case(Channel::A, PowerdownMode::OneKToGround, [0xF0, 0x06]; "a 1k")]
    #[test_case(Channel::A, PowerdownMode::HundredKToGround, [0xF0, 0x07]; "a 100k")]
    #[test_case(Channel::B, PowerdownMode::ThreeState, [0xF0, 0x09]; "b three state")]
    #[test_case(Channel::B, PowerdownMode::OneKToGround, [0xF0, 0x0A]; "b 1k")]
    #[test_case(Channel::B, PowerdownMode::HundredKToGround, [0xF0, 0x0B]; "b 100k")]
    fn powerdown_command_encodes_mode(
        channel: Channel,
        mode: PowerdownMode,
        expected: [u8; 2],
    ) {
        assert_eq!(powerdown_command(channel, true, mode), expected);
    }

    #[test_case(Channel::A, [0xF0, 0x04]; "a")]
    #[test_case(Channel::B, [0xF0, 0x08]; "b")]
    fn powerup_ignores_the_stored_mode(channel: Channel, expected: [u8; 2]) {
        for mode in PowerdownMode::iter() {
            assert_eq!(powerdown_command(channel, false, mode), expected);
        }
    }

    #[test]
    fn global_commands_select_both_channels() {
        assert_eq!(
            global_powerdown_command(Some(PowerdownMode::HundredKToGround)),
            [0xF0, 0x0F]
        );
        assert_eq!(
            global_powerdown_command(Some(PowerdownMode::ThreeState)),
            [0xF0, 0x0D]
        );
        assert_eq!(global_powerdown_command(None), [0xF0, 0x0C]);
    }

    #[test]
    fn channel_index_validation() {
        assert_eq!(Channel::from_index(0).unwrap(), Channel::A);
        assert_eq!(Channel::from_index(1).unwrap(), Channel::B);
        for bad in [2u8, 3, 0xFF] {
            assert!(matches!(
                Channel::from_index(bad),
                Err(Error::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn mode_wire_bits_are_one_above_index() {
        assert_eq!(PowerdownMode::ThreeState.wire_bits(), 1);
        assert_eq!(PowerdownMode::OneKToGround.wire_bits(), 2);
        assert_eq!(PowerdownMode::HundredKToGround.wire_bits(), 3);
    }

    #[test]
    fn mode_names_round_trip() {
        for mode in PowerdownMode::iter() {
            let name = mode.to_string();
            assert_eq!(PowerdownMode::from_str(&name).unwrap(), mode);
        }
        assert_eq!(
            PowerdownMode::from_str("1kohm_to_gnd").unwrap(),
            PowerdownMode::OneKToGround
        );
        assert!(PowerdownMode::from_str("2kohm_to_gnd").is_err());
    }

    #[test]
    fn default_mode_matches_power_on_state() {
        assert_eq!(PowerdownMode::default(), PowerdownMode::HundredKToGround);
    }
}
