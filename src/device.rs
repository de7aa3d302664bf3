//! The attached device as seen by the protocol engine.

use std::fmt;
use std::sync::Arc;

use crate::bus::I2cAdapter;
use crate::constants::MAX_WRITE_LEN;
use crate::types::{BusAddress, Chip};

/// Bus-side state of one attached EEPROM.
///
/// Immutable after attach and shared by `Arc` between the lifecycle record
/// and every open session, so read/write never lock it.
pub struct DeviceInstance {
    address: BusAddress,
    chip: Chip,
    adapter: Arc<dyn I2cAdapter>,
}

impl DeviceInstance {
    /// Bind the part at `address` with `chip` geometry to `adapter`.
    pub fn new(address: BusAddress, chip: Chip, adapter: Arc<dyn I2cAdapter>) -> Self {
        Self {
            address,
            chip,
            adapter,
        }
    }

    /// 7-bit bus address of the part.
    pub fn address(&self) -> BusAddress {
        self.address
    }

    /// Memory geometry of the part.
    pub fn chip(&self) -> Chip {
        self.chip
    }

    /// The adapter that drives the bus this part sits on.
    pub fn adapter(&self) -> &dyn I2cAdapter {
        self.adapter.as_ref()
    }

    /// Largest accepted write transaction, address bytes included.
    ///
    /// Fixed for every part in the family, so wider pages are only ever
    /// filled partially by a single write.
    pub fn write_limit(&self) -> usize {
        MAX_WRITE_LEN
    }
}

impl fmt::Debug for DeviceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceInstance")
            .field("address", &self.address)
            .field("chip", &self.chip)
            .field("adapter", &self.adapter.name())
            .finish()
    }
}
