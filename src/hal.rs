//! `embedded-hal` 1.0 and `embedded-io` 0.7 integration.
//!
//! Enable the `embedded-hal` feature (on by default) in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! eeprom-stream = { version = "0.1", features = ["embedded-hal"] }
//! ```
//!
//! # Provided implementations
//!
//! | Trait | Type | Notes |
//! |-------|------|-------|
//! | [`I2cAdapter`] | [`HalAdapter`] | Runs plans on any `embedded_hal::i2c::I2c` bus |
//! | `embedded_hal::i2c::Error` | [`Error`] | Bus codes mapped back to error kinds |
//! | `embedded_io::{Read, Write, Seek}` | [`OpenFile`] | Stream access through a registry node |

use std::fmt;
use std::sync::{Mutex, PoisonError};

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource, Operation};

use crate::bus::{I2cAdapter, Message};
use crate::constants::errno;
use crate::error::{Error, Result};
use crate::registry::OpenFile;
use crate::types::Direction;

// ---- Error conversion ----

/// Negative errno for an `embedded-hal` I2C error kind.
pub fn errno_for_kind(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::NoAcknowledge(_) => -errno::ENXIO,
        ErrorKind::ArbitrationLoss => -errno::EAGAIN,
        ErrorKind::Overrun => -errno::EOVERFLOW,
        _ => -errno::EIO,
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self.errno() {
            code if code == -errno::ENXIO || code == -errno::EREMOTEIO => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)
            }
            code if code == -errno::EAGAIN => ErrorKind::ArbitrationLoss,
            code if code == -errno::EOVERFLOW => ErrorKind::Overrun,
            code if code == -errno::EIO => ErrorKind::Bus,
            _ => ErrorKind::Other,
        }
    }
}

impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Error::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            Error::BadAddress(_) | Error::InvalidArgument(_) => embedded_io::ErrorKind::InvalidInput,
            Error::NoDevice(_) => embedded_io::ErrorKind::NotFound,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

// ---- embedded-hal I2C bus as an adapter ----

/// [`I2cAdapter`] over an `embedded_hal::i2c::I2c` bus.
///
/// Each plan runs as one `transaction`, so the bus driver emits repeated
/// STARTs between messages and a single STOP at the end. The mutex keeps
/// plans from different callers from interleaving.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use eeprom_stream::{attach, hal::HalAdapter, types::BusAddress, DriverConfig, Registry};
///
/// let bus = linux_embedded_hal::I2cdev::new("/dev/i2c-1")?;
/// let adapter = Arc::new(HalAdapter::new(bus));
/// let registry = Registry::new();
/// let dev = attach(&registry, &DriverConfig::new(), BusAddress::new(0x50)?, adapter)?;
/// ```
pub struct HalAdapter<I2C> {
    bus: Mutex<I2C>,
}

impl<I2C> HalAdapter<I2C> {
    /// Wrap `bus`; plans are serialized on an internal mutex.
    pub fn new(bus: I2C) -> Self {
        Self {
            bus: Mutex::new(bus),
        }
    }

    /// Give back the wrapped bus.
    pub fn into_inner(self) -> I2C {
        self.bus.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<I2C> fmt::Debug for HalAdapter<I2C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HalAdapter").finish_non_exhaustive()
    }
}

impl<I2C> I2cAdapter for HalAdapter<I2C>
where
    I2C: embedded_hal::i2c::I2c + Send,
{
    fn transfer(&self, messages: &mut [Message]) -> Result<usize> {
        let Some(first) = messages.first() else {
            return Ok(0);
        };
        let address = first.address();
        if messages.iter().any(|m| m.address() != address) {
            return Err(Error::InvalidArgument(
                "all messages of a plan must target one address",
            ));
        }

        let mut ops: Vec<Operation<'_>> = messages
            .iter_mut()
            .map(|m| match m.direction() {
                Direction::Write => Operation::Write(m.data()),
                Direction::Read => Operation::Read(m.data_mut()),
            })
            .collect();

        let mut bus = self.bus.lock().unwrap_or_else(PoisonError::into_inner);
        bus.transaction(address.get(), &mut ops).map_err(|e| {
            use embedded_hal::i2c::Error as _;
            Error::Bus(errno_for_kind(e.kind()))
        })?;

        Ok(ops.len())
    }

    fn name(&self) -> &str {
        "embedded-hal"
    }
}

// ---- embedded-io for OpenFile ----

impl embedded_io::ErrorType for OpenFile {
    type Error = Error;
}

impl embedded_io::Read for OpenFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.read_data(buf)
    }
}

impl embedded_io::Write for OpenFile {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.write_frame(buf)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl embedded_io::Seek for OpenFile {
    fn seek(&mut self, pos: embedded_io::SeekFrom) -> Result<u64> {
        let target = match pos {
            embedded_io::SeekFrom::Start(offset) => std::io::SeekFrom::Start(offset),
            embedded_io::SeekFrom::Current(delta) => std::io::SeekFrom::Current(delta),
            embedded_io::SeekFrom::End(delta) => std::io::SeekFrom::End(delta),
        };
        self.seek_to(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::plan;
    use crate::types::BusAddress;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct FakeError(ErrorKind);

    impl embedded_hal::i2c::Error for FakeError {
        fn kind(&self) -> ErrorKind {
            self.0
        }
    }

    /// Records transactions and answers reads with an incrementing counter.
    #[derive(Default)]
    struct FakeBus {
        transactions: Vec<(u8, Vec<(bool, usize)>)>,
        fail_with: Option<ErrorKind>,
    }

    impl embedded_hal::i2c::ErrorType for FakeBus {
        type Error = FakeError;
    }

    impl embedded_hal::i2c::I2c for FakeBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> std::result::Result<(), Self::Error> {
            if let Some(kind) = self.fail_with {
                return Err(FakeError(kind));
            }
            let mut shape = Vec::new();
            for op in operations.iter_mut() {
                match op {
                    Operation::Write(data) => shape.push((false, data.len())),
                    Operation::Read(buf) => {
                        for (i, b) in buf.iter_mut().enumerate() {
                            *b = i as u8;
                        }
                        shape.push((true, buf.len()));
                    }
                }
            }
            self.transactions.push((address, shape));
            Ok(())
        }
    }

    fn addr() -> BusAddress {
        BusAddress::new(0x50).unwrap()
    }

    #[test]
    fn read_plan_is_one_transaction() {
        let adapter = HalAdapter::new(FakeBus::default());
        let mut plan = plan::read_plan(addr(), 0x10, vec![0; 4]);
        assert_eq!(adapter.transfer(plan.messages_mut()).unwrap(), 2);
        assert_eq!(plan.into_read_data().unwrap(), vec![0, 1, 2, 3]);

        let bus = adapter.into_inner();
        assert_eq!(bus.transactions, vec![(0x50, vec![(false, 2), (true, 4)])]);
    }

    #[test]
    fn empty_plan_is_noop() {
        let adapter = HalAdapter::new(FakeBus::default());
        assert_eq!(adapter.transfer(&mut []).unwrap(), 0);
        assert!(adapter.into_inner().transactions.is_empty());
    }

    #[test]
    fn mixed_addresses_rejected() {
        let adapter = HalAdapter::new(FakeBus::default());
        let mut msgs = vec![
            Message::write(addr(), vec![0, 0]),
            Message::read(BusAddress::new(0x51).unwrap(), vec![0]),
        ];
        assert!(matches!(
            adapter.transfer(&mut msgs),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn nack_maps_to_enxio() {
        let adapter = HalAdapter::new(FakeBus {
            fail_with: Some(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)),
            ..Default::default()
        });
        let mut plan = plan::write_plan(addr(), 0, &[1]);
        match adapter.transfer(plan.messages_mut()) {
            Err(Error::Bus(code)) => assert_eq!(code, -errno::ENXIO),
            other => panic!("expected bus error, got {:?}", other),
        }
    }

    #[test]
    fn embedded_io_write_rejects_oversized_frame() {
        use crate::bus::sim::SimEeprom;
        use crate::types::Chip;
        use crate::{attach, DriverConfig, Registry};
        use std::sync::Arc;

        let registry = Registry::new();
        let sim = Arc::new(SimEeprom::new(addr(), Chip::At24c64));
        let _dev = attach(&registry, &DriverConfig::new(), addr(), sim.clone()).unwrap();
        let mut file = registry.open("/dev/eeprom").unwrap();

        let frame = [0u8; 36];
        assert!(matches!(
            embedded_io::Write::write_all(&mut file, &frame),
            Err(Error::InvalidArgument(_))
        ));
        assert!(sim.log().is_empty());

        assert_eq!(embedded_io::Write::write(&mut file, &frame[..34]).unwrap(), 34);
        assert_eq!(sim.log().len(), 1);
    }

    #[test]
    fn errno_for_kinds() {
        assert_eq!(errno_for_kind(ErrorKind::ArbitrationLoss), -11);
        assert_eq!(errno_for_kind(ErrorKind::Overrun), -75);
        assert_eq!(errno_for_kind(ErrorKind::Bus), -5);
        assert_eq!(errno_for_kind(ErrorKind::Other), -5);
    }

    #[test]
    fn error_kind_mapping_i2c() {
        use embedded_hal::i2c::Error as _;
        assert_eq!(
            Error::Bus(-errno::ENXIO).kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)
        );
        assert_eq!(Error::Bus(-errno::EAGAIN).kind(), ErrorKind::ArbitrationLoss);
        assert_eq!(Error::Bus(-errno::EIO).kind(), ErrorKind::Bus);
        assert_eq!(Error::OutOfMemory.kind(), ErrorKind::Other);
    }

    #[test]
    fn error_kind_mapping_io() {
        use embedded_io::Error as _;
        assert_eq!(
            Error::InvalidArgument("short").kind(),
            embedded_io::ErrorKind::InvalidInput
        );
        assert_eq!(Error::OutOfMemory.kind(), embedded_io::ErrorKind::OutOfMemory);
        assert_eq!(Error::Bus(-5).kind(), embedded_io::ErrorKind::Other);
    }
}
