//! Write-only debug control.
//!
//! Writing anything to the control issues one fixed page write
//! (offset `0x0000`, one byte of [`DEBUG_PATTERN`]) straight to the bus,
//! bypassing the stream endpoint. Handy for checking wiring with a logic
//! analyzer.

use std::sync::Arc;

use log::info;

use crate::bus::plan;
use crate::constants::DEBUG_PATTERN;
use crate::device::DeviceInstance;
use crate::engine;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct DebugTrigger {
    device: Arc<DeviceInstance>,
}

impl DebugTrigger {
    /// Control bound to `device`.
    pub fn new(device: Arc<DeviceInstance>) -> Self {
        Self { device }
    }

    /// Fire the fixed write. The payload content is ignored; its length is
    /// returned as accepted.
    pub fn store(&self, payload: &[u8]) -> Result<usize> {
        let mut plan = plan::write_plan(self.device.address(), 0x0000, &[DEBUG_PATTERN]);
        engine::execute(self.device.adapter(), &mut plan)?;
        info!("debug write sent to {}", self.device.address());
        Ok(payload.len())
    }
}
