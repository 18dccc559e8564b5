//! Hardware abstraction layer traits.
//!
//! This module defines the narrow interfaces the DAC controller needs from
//! the platform: a byte-oriented bus transport and an optional
//! reference-voltage regulator. Drivers stay generic over these so the same
//! controller runs against the Linux i2c-dev interface, a tunneled
//! management protocol, or a scripted mock in tests.

use async_trait::async_trait;
use std::io;

/// Byte-oriented request/response access to a bus device.
///
/// One `send` or `receive` call is one bus transfer. The transport owns any
/// bus-level timeout policy and reports expiry as an I/O error; it must not
/// retry on its own. Multi-transfer transactions are serialized above this
/// trait, not inside it.
#[async_trait]
pub trait Transport {
    /// Write `bytes` to the device, returning how many it accepted.
    ///
    /// A count short of `bytes.len()` is a failed transfer as far as the
    /// controller is concerned.
    async fn send(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Read up to `count` bytes from the device.
    ///
    /// Fewer bytes than requested is a failed transfer as far as the
    /// controller is concerned.
    async fn receive(&mut self, count: usize) -> io::Result<Vec<u8>>;
}

/// A reference-voltage supply the DAC scales its output against.
///
/// Mirrors the consumer view of a platform regulator: enable it, ask what
/// it is programmed to, release it on teardown.
#[async_trait]
pub trait VrefRegulator {
    /// Bring the supply up. Idempotent.
    async fn enable(&mut self) -> io::Result<()>;

    /// Release the supply. Called at most once, during controller teardown
    /// or when initialization abandons the regulator for a fallback.
    fn disable(&mut self);

    /// The supply's programmed output voltage in microvolts.
    async fn voltage_microvolts(&mut self) -> io::Result<u32>;
}
