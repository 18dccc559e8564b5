//! Host-side controller for the MAX5820 two-channel, 8-bit I2C DAC.
//!
//! The chip speaks one- and two-byte commands over a shared two-wire bus:
//! nibble-packed output codes, per-channel reads, and an extended command
//! mode for power-state control. This crate layers:
//!
//! - [`protocol`]: the pure wire codec, command bytes in, codes out;
//! - [`dac`]: the [`Max5820`] controller, with the per-channel power-state
//!   store, serialized bus transactions, reference-voltage scaling, and
//!   the suspend/resume/resynchronize lifecycle;
//! - [`hw_trait`]: the narrow [`hw_trait::Transport`] and
//!   [`hw_trait::VrefRegulator`] collaborator traits;
//! - [`transport`] and [`regulator`]: Linux i2c-dev and sysfs
//!   implementations of those traits.
//!
//! The `max5820-cli` binary is a thin host-integration layer over the
//! library, configured through [`config`].

pub mod config;
pub mod dac;
pub mod error;
pub mod hw_trait;
pub mod protocol;
pub mod regulator;
pub mod tracing;
pub mod transport;

pub use dac::{BoxedRegulator, Max5820, Scale, DEFAULT_VREF_FALLBACK_MV};
pub use error::{Error, Result};
pub use protocol::{Channel, PowerdownMode};
