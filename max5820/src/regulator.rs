//! Reference-voltage regulator access.
//!
//! The MAX5820 scales its output against an external reference supply. On
//! a running system that supply belongs to the kernel; userspace can only
//! observe its programmed voltage through the regulator class in sysfs.
//! Enable and disable are therefore no-ops here; a vref that exists in
//! sysfs was brought up at boot and stays up.

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use tracing::trace;

use crate::hw_trait::VrefRegulator;

/// A regulator observed through its sysfs `microvolts` attribute,
/// e.g. `/sys/class/regulator/regulator.7/microvolts`.
pub struct SysfsRegulator {
    microvolts_path: PathBuf,
}

impl SysfsRegulator {
    pub fn new(microvolts_path: impl Into<PathBuf>) -> Self {
        Self {
            microvolts_path: microvolts_path.into(),
        }
    }
}

#[async_trait]
impl VrefRegulator for SysfsRegulator {
    async fn enable(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn disable(&mut self) {}

    async fn voltage_microvolts(&mut self) -> io::Result<u32> {
        let text = tokio::fs::read_to_string(&self.microvolts_path).await?;
        let microvolts = text.trim().parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unparseable microvolts value {:?}: {e}", text.trim()),
            )
        })?;
        trace!(
            path = %self.microvolts_path.display(),
            microvolts,
            "read vref from sysfs"
        );
        Ok(microvolts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_the_microvolts_attribute() {
        let path = std::env::temp_dir()
            .join(format!("max5820-vref-ok-{}", std::process::id()));
        std::fs::write(&path, "3300000\n").unwrap();

        let mut regulator = SysfsRegulator::new(&path);
        assert_eq!(regulator.voltage_microvolts().await.unwrap(), 3_300_000);

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn garbage_attribute_is_invalid_data() {
        let path = std::env::temp_dir()
            .join(format!("max5820-vref-bad-{}", std::process::id()));
        std::fs::write(&path, "not-a-voltage\n").unwrap();

        let mut regulator = SysfsRegulator::new(&path);
        let err = regulator.voltage_microvolts().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn missing_attribute_is_not_found() {
        let mut regulator = SysfsRegulator::new("/sys/class/regulator/none/microvolts");
        let err = regulator.voltage_microvolts().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
