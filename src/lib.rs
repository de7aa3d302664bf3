//! Random-access byte streams over I2C serial EEPROMs.
//!
//! This crate exposes a 24Cxx-family EEPROM, reachable only over a two-wire
//! bus, as a file-like byte stream: open a session, read at a position,
//! write address-prefixed pages. It translates each stream operation into
//! the bus transactions the part expects:
//!
//! - **Random read**: a two-byte "dummy write" of the big-endian offset,
//!   then a repeated START and the read, submitted as one transfer.
//! - **Page write**: a single write whose first two bytes are the
//!   destination address, capped at one page.
//!
//! # Quick Start
//!
//! ```
//! use std::io::{Read, Seek, SeekFrom, Write};
//! use std::sync::Arc;
//! use eeprom_stream::bus::sim::SimEeprom;
//! use eeprom_stream::types::{BusAddress, Chip};
//! use eeprom_stream::{EepromDriver, I2cClient, Registry};
//!
//! let registry = Registry::new();
//! let address = BusAddress::new(0x50)?;
//! let client = I2cClient {
//!     name: "24c64".into(),
//!     address,
//!     adapter: Arc::new(SimEeprom::new(address, Chip::At24c64)),
//! };
//!
//! let driver = EepromDriver::default();
//! let dev = driver.probe(&registry, client)?;
//!
//! let mut file = registry.open("/dev/eeprom")?;
//! file.write_all(&[0x00, 0x00, 0xDE, 0xAD])?;
//! file.seek(SeekFrom::Start(0))?;
//! let mut buf = [0u8; 2];
//! file.read_exact(&mut buf)?;
//! assert_eq!(buf, [0xDE, 0xAD]);
//!
//! driver.remove(dev);
//! assert!(registry.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Features
//!
//! - **Protocol engine**: [`engine::read`] / [`engine::write`] with
//!   staging, clamping and position bookkeeping.
//! - **Pluggable buses**: anything implementing [`bus::I2cAdapter`]; an
//!   `embedded-hal` bridge ([`hal::HalAdapter`]) and a simulated part
//!   ([`bus::sim::SimEeprom`]) are included.
//! - **Lifecycle**: [`attach`] registers identity, class, endpoint and node
//!   with a [`DeviceHost`] and rolls back on failure.
//! - **In-process host**: [`Registry`] publishes nodes and hands out
//!   [`OpenFile`]s implementing `std::io::{Read, Write, Seek}`.

pub mod bus;
pub mod config;
pub mod constants;
pub mod debug;
pub mod device;
pub mod engine;
pub mod error;
#[cfg(feature = "embedded-hal")]
pub mod hal;
pub mod lifecycle;
pub mod registry;
pub mod session;
pub mod staging;
pub mod types;

// ---- Convenience re-exports ----

pub use bus::{I2cAdapter, Message, MessagePlan};
pub use config::DriverConfig;
pub use debug::DebugTrigger;
pub use device::DeviceInstance;
pub use error::{AttachStep, Error, Result};
pub use lifecycle::{attach, AttachedDevice, DeviceHost, EepromDriver, I2cClient};
pub use registry::{OpenFile, Registry};
pub use session::{EepromEndpoint, FileOperations, Session};
