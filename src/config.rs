//! Driver configuration.

use crate::constants::{CLASS_NAME, DEVICE_NAME};
use crate::error::{Error, Result};
use crate::types::Chip;

/// Naming and geometry used when attaching a device.
///
/// # Example
///
/// ```
/// use eeprom_stream::{DriverConfig, types::Chip};
///
/// let config = DriverConfig::new()
///     .device_name("board_id")
///     .chip(Chip::At24c256);
/// assert_eq!(config.device_name, "board_id");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Device node name, published as `/dev/<device_name>`.
    pub device_name: String,
    /// Name of the class the node is created under.
    pub class_name: String,
    /// Memory geometry of the attached part.
    pub chip: Chip,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            device_name: DEVICE_NAME.to_string(),
            class_name: CLASS_NAME.to_string(),
            chip: Chip::default(),
        }
    }
}

impl DriverConfig {
    /// Defaults: node `eeprom`, class `eeprom_class`, 24C64 geometry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the node name.
    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Set the class name.
    pub fn class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = name.into();
        self
    }

    /// Set the memory geometry.
    pub fn chip(mut self, chip: Chip) -> Self {
        self.chip = chip;
        self
    }

    /// Reject names the host could not publish.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_name(&self.device_name) {
            return Err(Error::InvalidArgument("device name must be non-empty without '/'"));
        }
        if !is_valid_name(&self.class_name) {
            return Err(Error::InvalidArgument("class name must be non-empty without '/'"));
        }
        Ok(())
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/')
}
