//! Physical transport layer for bus access.
//!
//! Concrete implementations of [`crate::hw_trait::Transport`]: raw byte
//! access to the device with no protocol knowledge. The only transport
//! shipped here is the Linux i2c-dev character device; tests script their
//! own mocks against the trait instead.

pub mod i2cdev;

pub use i2cdev::I2cDev;
