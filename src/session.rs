//! Stream endpoint contract and per-open sessions.

use std::sync::Arc;

use log::info;

use crate::device::DeviceInstance;
use crate::engine;
use crate::error::{Error, Result};
use crate::types::StreamIdentity;

/// The operations a host dispatches for an open stream.
///
/// The stream position lives with the caller and is passed in on every
/// call, so implementations keep no per-session mutable state.
pub trait FileOperations: Send + Sync {
    /// Bind a new session to the device behind `identity`.
    fn open(&self, identity: StreamIdentity) -> Result<Session>;

    /// Read `count` bytes at `*pos` into `buf`, advancing `*pos`.
    fn read(&self, session: &Session, buf: &mut [u8], count: usize, pos: &mut u64)
        -> Result<usize>;

    /// Write `count` bytes from `buf`.
    fn write(&self, session: &Session, buf: &[u8], count: usize, pos: &mut u64) -> Result<usize>;
}

/// One open session on a device.
#[derive(Debug, Clone)]
pub struct Session {
    device: Arc<DeviceInstance>,
}

impl Session {
    /// Session on `device`.
    pub fn new(device: Arc<DeviceInstance>) -> Self {
        Self { device }
    }

    /// The device this session talks to.
    pub fn device(&self) -> &DeviceInstance {
        &self.device
    }
}

/// [`FileOperations`] for an attached EEPROM.
#[derive(Debug)]
pub struct EepromEndpoint {
    identity: StreamIdentity,
    device: Arc<DeviceInstance>,
}

impl EepromEndpoint {
    /// Endpoint serving `identity` from `device`.
    pub fn new(identity: StreamIdentity, device: Arc<DeviceInstance>) -> Self {
        Self { identity, device }
    }

    /// The stream identity this endpoint serves.
    pub fn identity(&self) -> StreamIdentity {
        self.identity
    }
}

impl FileOperations for EepromEndpoint {
    fn open(&self, identity: StreamIdentity) -> Result<Session> {
        if identity != self.identity {
            return Err(Error::NoDevice(format!("no endpoint for {identity}")));
        }
        info!("device {} opened", identity);
        Ok(Session::new(self.device.clone()))
    }

    fn read(
        &self,
        session: &Session,
        buf: &mut [u8],
        count: usize,
        pos: &mut u64,
    ) -> Result<usize> {
        engine::read(session.device(), buf, count, pos)
    }

    fn write(&self, session: &Session, buf: &[u8], count: usize, _pos: &mut u64) -> Result<usize> {
        engine::write(session.device(), buf, count)
    }
}
