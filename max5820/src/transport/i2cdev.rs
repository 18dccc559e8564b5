//! I2C character-device transport.
//!
//! Talks to the chip through the Linux i2c-dev interface: open
//! `/dev/i2c-N`, bind the peer's 7-bit address with the `I2C_SLAVE` ioctl,
//! then move bytes with plain `read(2)`/`write(2)`, each wrapping a bus
//! transfer addressed to the bound peer. The file descriptor's transfers
//! run on the blocking thread pool so a stretched or wedged bus never
//! stalls the async runtime.

use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::path::Path;
use tokio::task;
use tracing::trace;

use crate::hw_trait::Transport;

/// 7-bit bus address of the MAX5820L. The M variant answers at 0x39.
pub const DEFAULT_ADDRESS: u8 = 0x38;

// i2c-dev request binding a file descriptor to a peer address.
nix::ioctl_write_int_bad!(i2c_slave, 0x0703);

/// A slave device on a Linux i2c-dev bus.
#[derive(Debug)]
pub struct I2cDev {
    file: File,
    address: u8,
}

impl I2cDev {
    /// Open the bus character device at `path` and bind `address`.
    pub async fn open(path: impl AsRef<Path>, address: u8) -> io::Result<Self> {
        let path = path.as_ref().to_owned();
        task::spawn_blocking(move || {
            let file = OpenOptions::new().read(true).write(true).open(&path)?;
            unsafe { i2c_slave(file.as_raw_fd(), i32::from(address)) }
                .map_err(io::Error::from)?;
            trace!(path = %path.display(), address, "i2c-dev bus opened");
            Ok(Self { file, address })
        })
        .await
        .map_err(io::Error::other)?
    }
}

#[async_trait]
impl Transport for I2cDev {
    async fn send(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let file = self.file.try_clone()?;
        let buffer = bytes.to_vec();
        let sent = task::spawn_blocking(move || (&file).write(&buffer))
            .await
            .map_err(io::Error::other)??;
        trace!(address = self.address, sent, "i2c write");
        Ok(sent)
    }

    async fn receive(&mut self, count: usize) -> io::Result<Vec<u8>> {
        let file = self.file.try_clone()?;
        let bytes = task::spawn_blocking(move || {
            let mut buffer = vec![0u8; count];
            let read = (&file).read(&mut buffer)?;
            buffer.truncate(read);
            Ok::<_, io::Error>(buffer)
        })
        .await
        .map_err(io::Error::other)??;
        trace!(address = self.address, received = bytes.len(), "i2c read");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_reports_a_missing_bus_device() {
        let err = I2cDev::open("/dev/i2c-none-such", DEFAULT_ADDRESS)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
