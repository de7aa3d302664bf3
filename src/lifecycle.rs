//! Attaching and detaching a device on a host.
//!
//! Attaching acquires, in order: the device record, a stream identity, a
//! class, the endpoint registration for that identity, and the device
//! node. [`AttachedDevice`] owns each of these as soon as it is acquired,
//! and releases whatever it holds in reverse order when it is detached or
//! dropped. An attach step that fails therefore unwinds the earlier steps
//! simply by returning early.

use std::fmt;
use std::sync::Arc;

use log::{error, info};

use crate::bus::I2cAdapter;
use crate::config::DriverConfig;
use crate::constants::DRIVER_NAME;
use crate::debug::DebugTrigger;
use crate::device::DeviceInstance;
use crate::error::{AttachStep, Error, Result};
use crate::session::{EepromEndpoint, FileOperations};
use crate::types::{BusAddress, Chip, ClassHandle, NodeHandle, StreamIdentity};

/// Registration services a host offers to a driver.
///
/// Every acquiring call has a releasing counterpart. Releases cannot fail.
pub trait DeviceHost: Send + Sync {
    /// Allocate a stream identity (one minor) under `name`.
    fn alloc_identity(&self, name: &str) -> Result<StreamIdentity>;
    fn release_identity(&self, identity: StreamIdentity);

    fn create_class(&self, name: &str) -> Result<ClassHandle>;
    fn destroy_class(&self, class: ClassHandle);

    /// Route open/read/write on `identity` to `ops`.
    fn add_endpoint(&self, identity: StreamIdentity, ops: Arc<dyn FileOperations>) -> Result<()>;
    fn remove_endpoint(&self, identity: StreamIdentity);

    /// Publish a device node for `identity` under `class`.
    fn create_node(
        &self,
        class: ClassHandle,
        identity: StreamIdentity,
        name: &str,
    ) -> Result<NodeHandle>;
    fn destroy_node(&self, node: NodeHandle);
}

/// One entry of the identification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId {
    pub name: &'static str,
    pub chip: Chip,
}

/// Device names this driver binds to.
pub const ID_TABLE: &[DeviceId] = &[
    DeviceId { name: "24c32", chip: Chip::At24c32 },
    DeviceId { name: "24c64", chip: Chip::At24c64 },
    DeviceId { name: "24c128", chip: Chip::At24c128 },
    DeviceId { name: "24c256", chip: Chip::At24c256 },
    DeviceId { name: "24c512", chip: Chip::At24c512 },
];

/// Look up a device name in [`ID_TABLE`].
pub fn match_id(name: &str) -> Option<&'static DeviceId> {
    ID_TABLE.iter().find(|id| id.name == name)
}

/// A device attached to a host, owning all of its registrations.
pub struct AttachedDevice<'h, H: DeviceHost + ?Sized> {
    host: &'h H,
    device: Arc<DeviceInstance>,
    device_name: String,
    identity: Option<StreamIdentity>,
    class: Option<ClassHandle>,
    endpoint: Option<StreamIdentity>,
    node: Option<NodeHandle>,
}

/// Attach the EEPROM at `address` behind `adapter` to `host`.
///
/// On failure nothing stays registered and the error names the step that
/// failed.
pub fn attach<'h, H: DeviceHost + ?Sized>(
    host: &'h H,
    config: &DriverConfig,
    address: BusAddress,
    adapter: Arc<dyn I2cAdapter>,
) -> Result<AttachedDevice<'h, H>> {
    info!("probe {} on {}", address, adapter.name());
    config.validate()?;

    let mut dev = AttachedDevice {
        host,
        device: Arc::new(DeviceInstance::new(address, config.chip, adapter)),
        device_name: config.device_name.clone(),
        identity: None,
        class: None,
        endpoint: None,
        node: None,
    };

    let identity = host
        .alloc_identity(&config.device_name)
        .map_err(|e| failed(AttachStep::Identity, e))?;
    dev.identity = Some(identity);

    let class = host
        .create_class(&config.class_name)
        .map_err(|e| failed(AttachStep::Class, e))?;
    dev.class = Some(class);

    let endpoint = Arc::new(EepromEndpoint::new(identity, dev.device.clone()));
    host.add_endpoint(identity, endpoint)
        .map_err(|e| failed(AttachStep::Endpoint, e))?;
    dev.endpoint = Some(identity);

    let node = host
        .create_node(class, identity, &config.device_name)
        .map_err(|e| failed(AttachStep::Node, e))?;
    dev.node = Some(node);

    info!("/dev/{} created ({})", config.device_name, identity);
    Ok(dev)
}

fn failed(step: AttachStep, source: Error) -> Error {
    error!("{} failed: {}", step, source);
    Error::at_step(step, source)
}

impl<'h, H: DeviceHost + ?Sized> AttachedDevice<'h, H> {
    /// The bus-side device shared with open sessions.
    pub fn device(&self) -> &Arc<DeviceInstance> {
        &self.device
    }

    /// Node name the device was published under.
    pub fn name(&self) -> &str {
        &self.device_name
    }

    /// Stream identity, while still held.
    pub fn identity(&self) -> Option<StreamIdentity> {
        self.identity
    }

    /// Class handle, while still held.
    pub fn class(&self) -> Option<ClassHandle> {
        self.class
    }

    /// Device node handle, while still held.
    pub fn node(&self) -> Option<NodeHandle> {
        self.node
    }

    /// The write-only debug control for this device.
    pub fn debug_trigger(&self) -> DebugTrigger {
        DebugTrigger::new(self.device.clone())
    }

    /// Unpublish the device and release every registration.
    pub fn detach(mut self) {
        self.teardown();
        info!("{} removed", self.device_name);
    }

    /// Release in reverse order of acquisition. Only resources still held
    /// are released, so running this twice is harmless.
    fn teardown(&mut self) {
        if let Some(node) = self.node.take() {
            self.host.destroy_node(node);
        }
        if let Some(identity) = self.endpoint.take() {
            self.host.remove_endpoint(identity);
        }
        if let Some(class) = self.class.take() {
            self.host.destroy_class(class);
        }
        if let Some(identity) = self.identity.take() {
            self.host.release_identity(identity);
        }
    }
}

impl<H: DeviceHost + ?Sized> Drop for AttachedDevice<'_, H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<H: DeviceHost + ?Sized> fmt::Debug for AttachedDevice<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachedDevice")
            .field("device", &self.device)
            .field("name", &self.device_name)
            .field("identity", &self.identity)
            .field("class", &self.class)
            .field("node", &self.node)
            .finish()
    }
}

/// What the host knows about a device when it asks the driver to bind.
#[derive(Clone)]
pub struct I2cClient {
    /// Device name matched against [`ID_TABLE`].
    pub name: String,
    pub address: BusAddress,
    pub adapter: Arc<dyn I2cAdapter>,
}

impl fmt::Debug for I2cClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("I2cClient")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("adapter", &self.adapter.name())
            .finish()
    }
}

/// Driver front-end: identification table plus probe/remove callbacks.
#[derive(Debug, Clone, Default)]
pub struct EepromDriver {
    config: DriverConfig,
}

impl EepromDriver {
    /// Driver that attaches with `config`.
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Driver name.
    pub fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    /// Device names this driver binds to.
    pub fn id_table(&self) -> &'static [DeviceId] {
        ID_TABLE
    }

    /// Configuration applied on every probe.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Bind to `client`, taking the chip geometry from the matched entry.
    pub fn probe<'h, H: DeviceHost + ?Sized>(
        &self,
        host: &'h H,
        client: I2cClient,
    ) -> Result<AttachedDevice<'h, H>> {
        let id = match_id(&client.name)
            .ok_or_else(|| Error::NoDevice(format!("{} is not handled by {}", client.name, DRIVER_NAME)))?;
        let config = self.config.clone().chip(id.chip);
        attach(host, &config, client.address, client.adapter)
    }

    /// Unbind a device bound by [`probe`](Self::probe).
    pub fn remove<H: DeviceHost + ?Sized>(&self, device: AttachedDevice<'_, H>) {
        device.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_table_matches_reference_part() {
        let id = match_id("24c64").unwrap();
        assert_eq!(id.chip, Chip::At24c64);
    }

    #[test]
    fn id_table_rejects_unknown() {
        assert!(match_id("24c02").is_none());
        assert!(match_id("").is_none());
    }

    #[test]
    fn id_table_names_agree_with_chips() {
        for id in ID_TABLE {
            assert_eq!(id.name, id.chip.name());
        }
    }

    #[test]
    fn driver_defaults() {
        let driver = EepromDriver::default();
        assert_eq!(driver.name(), "eeprom_stream");
        assert_eq!(driver.id_table().len(), 5);
        assert_eq!(driver.config().device_name, "eeprom");
    }
}
