//! Random-access read and write against a stream position.
//!
//! Each call is self-contained: validate, stage, plan, execute, copy out,
//! advance. Nothing survives between calls except the caller's position,
//! and a failing call leaves that position untouched.
//!
//! Reads and writes address the part differently. A read starts at the
//! stream position. A write carries its own destination in the first two
//! bytes of the caller's buffer (`[addr_hi, addr_lo, data...]`) and never
//! moves the stream position.

use log::debug;

use crate::bus::{plan, I2cAdapter, MessagePlan};
use crate::constants::{errno, ADDRESS_BYTES, MIN_WRITE_LEN};
use crate::device::DeviceInstance;
use crate::error::{Error, Result};
use crate::staging::{self, StagingBuffer};

/// Submit `plan` as one transfer. A plan that does not complete in full is
/// an I/O error.
pub fn execute(adapter: &dyn I2cAdapter, plan: &mut MessagePlan) -> Result<()> {
    let expected = plan.len();
    let done = adapter.transfer(plan.messages_mut())?;
    if done != expected {
        debug!(
            "{}: short transfer, {} of {} messages",
            adapter.name(),
            done,
            expected
        );
        return Err(Error::Bus(-errno::EIO));
    }
    Ok(())
}

/// Read `count` bytes at `*pos` into `buf` and advance `*pos`.
///
/// Only the low 16 bits of the position reach the wire.
pub fn read(device: &DeviceInstance, buf: &mut [u8], count: usize, pos: &mut u64) -> Result<usize> {
    let staging = staging::stage_for_read(count)?;

    let mut plan = plan::read_plan(device.address(), *pos, staging.into_vec());
    execute(device.adapter(), &mut plan)?;

    let staging = StagingBuffer::from(plan.into_read_data().unwrap_or_default());
    staging::publish(&staging, buf, count)?;

    debug!(
        "read {} bytes from offset 0x{:04x} at {}",
        count,
        *pos as u16,
        device.address()
    );
    *pos = pos.saturating_add(count as u64);
    Ok(count)
}

/// Write `[addr_hi, addr_lo, data...]` from `buf` to the part.
///
/// Requests longer than [`MAX_WRITE_LEN`](crate::constants::MAX_WRITE_LEN)
/// bytes are truncated while staging; the returned count is the number of
/// bytes accepted.
pub fn write(device: &DeviceInstance, buf: &[u8], count: usize) -> Result<usize> {
    if count < MIN_WRITE_LEN {
        return Err(Error::InvalidArgument(
            "write needs two address bytes and at least one data byte",
        ));
    }
    let staging = staging::stage_for_write(buf, count)?;
    let (header, payload) = staging.split_at(ADDRESS_BYTES);
    let offset = u16::from_be_bytes([header[0], header[1]]);

    let mut plan = plan::write_plan(device.address(), offset, payload);
    execute(device.adapter(), &mut plan)?;

    debug!(
        "wrote {} bytes to offset 0x{:04x} at {}",
        payload.len(),
        offset,
        device.address()
    );
    Ok(staging.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::sim::SimEeprom;
    use crate::bus::Message;
    use crate::constants::MAX_WRITE_LEN;
    use crate::types::{BusAddress, Chip, Direction};
    use std::sync::Arc;

    fn setup() -> (Arc<SimEeprom>, DeviceInstance) {
        let addr = BusAddress::new(0x50).unwrap();
        let sim = Arc::new(SimEeprom::new(addr, Chip::At24c64));
        let dev = DeviceInstance::new(addr, Chip::At24c64, sim.clone());
        (sim, dev)
    }

    /// Adapter that claims fewer messages than submitted.
    struct ShortAdapter;

    impl I2cAdapter for ShortAdapter {
        fn transfer(&self, messages: &mut [Message]) -> Result<usize> {
            Ok(messages.len() - 1)
        }
    }

    #[test]
    fn read_32_at_0x10() {
        let (sim, dev) = setup();
        let pattern: Vec<u8> = (0..32).collect();
        sim.poke(0x10, &pattern);

        let mut buf = [0u8; 32];
        let mut pos = 0x0010;
        assert_eq!(read(&dev, &mut buf, 32, &mut pos).unwrap(), 32);
        assert_eq!(pos, 0x0030);
        assert_eq!(&buf[..], &pattern[..]);

        let log = sim.log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].direction, Direction::Write);
        assert_eq!(log[0].data, vec![0x00, 0x10]);
        assert_eq!(log[1].direction, Direction::Read);
        assert_eq!(log[1].data.len(), 32);
    }

    #[test]
    fn write_three_bytes() {
        let (sim, dev) = setup();
        assert_eq!(write(&dev, &[0x00, 0x00, 0xAB], 3).unwrap(), 3);

        let log = sim.log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].direction, Direction::Write);
        assert_eq!(log[0].data, vec![0x00, 0x00, 0xAB]);
        assert_eq!(sim.contents()[0], 0xAB);
    }

    #[test]
    fn short_write_is_rejected_without_traffic() {
        let (sim, dev) = setup();
        for count in 0..3 {
            let buf = [0u8; 2];
            assert!(matches!(
                write(&dev, &buf, count),
                Err(Error::InvalidArgument(_))
            ));
        }
        assert!(sim.log().is_empty());
    }

    #[test]
    fn long_write_is_clamped_to_34() {
        let (sim, dev) = setup();
        let mut buf = vec![0x00, 0x00];
        buf.extend(0..40u8);
        assert_eq!(write(&dev, &buf, buf.len()).unwrap(), 34);

        let log = sim.log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].data.len(), 34);
        assert_eq!(&sim.contents()[..32], &buf[2..34]);
    }

    #[test]
    fn write_leaves_position_alone() {
        let (_sim, dev) = setup();
        let mut pos = 0x40;
        write(&dev, &[0x01, 0x00, 0x55], 3).unwrap();
        let mut buf = [0u8; 1];
        read(&dev, &mut buf, 1, &mut pos).unwrap();
        assert_eq!(buf[0], 0xFF);
        assert_eq!(pos, 0x41);
    }

    #[test]
    fn bus_error_propagates_and_keeps_position() {
        let (sim, dev) = setup();
        sim.fail_next(-errno::EREMOTEIO);
        let mut buf = [0u8; 4];
        let mut pos = 0x20;
        match read(&dev, &mut buf, 4, &mut pos) {
            Err(Error::Bus(code)) => assert_eq!(code, -121),
            other => panic!("expected bus error, got {:?}", other),
        }
        assert_eq!(pos, 0x20);
    }

    #[test]
    fn write_bus_error_propagates() {
        let (sim, dev) = setup();
        sim.fail_next(-errno::ENXIO);
        assert!(matches!(
            write(&dev, &[0, 0, 1], 3),
            Err(Error::Bus(-6))
        ));
    }

    #[test]
    fn bad_destination_keeps_position() {
        let (_sim, dev) = setup();
        let mut buf = [0u8; 2];
        let mut pos = 0x10;
        assert!(matches!(
            read(&dev, &mut buf, 8, &mut pos),
            Err(Error::BadAddress(_))
        ));
        assert_eq!(pos, 0x10);
    }

    #[test]
    fn huge_read_is_oom() {
        let (sim, dev) = setup();
        let mut buf = [0u8; 1];
        let mut pos = 0;
        assert!(matches!(
            read(&dev, &mut buf, usize::MAX, &mut pos),
            Err(Error::OutOfMemory)
        ));
        assert!(sim.log().is_empty());
        assert_eq!(pos, 0);
    }

    #[test]
    fn read_at_last_16_bit_offset() {
        let (sim, dev) = setup();
        let mut buf = [0u8; 1];
        let mut pos = 0xFFFF;
        assert_eq!(read(&dev, &mut buf, 1, &mut pos).unwrap(), 1);
        assert_eq!(sim.log()[0].data, vec![0xFF, 0xFF]);
        assert_eq!(pos, 0x1_0000);
    }

    #[test]
    fn read_beyond_16_bits_encodes_low_bits() {
        let (sim, dev) = setup();
        let mut buf = [0u8; 2];
        let mut pos = 0x1_0010;
        assert_eq!(read(&dev, &mut buf, 2, &mut pos).unwrap(), 2);
        assert_eq!(sim.log()[0].data, vec![0x00, 0x10]);
        assert_eq!(pos, 0x1_0012);
    }

    #[test]
    fn position_saturates() {
        let (_sim, dev) = setup();
        let mut buf = [0u8; 4];
        let mut pos = u64::MAX - 1;
        read(&dev, &mut buf, 4, &mut pos).unwrap();
        assert_eq!(pos, u64::MAX);
    }

    #[test]
    fn short_transfer_is_eio() {
        let addr = BusAddress::new(0x50).unwrap();
        let dev = DeviceInstance::new(addr, Chip::At24c64, Arc::new(ShortAdapter));
        let mut buf = [0u8; 4];
        let mut pos = 0;
        assert!(matches!(
            read(&dev, &mut buf, 4, &mut pos),
            Err(Error::Bus(-5))
        ));
        assert_eq!(pos, 0);
    }

    #[test]
    fn wider_page_keeps_34_byte_ceiling() {
        for chip in [Chip::At24c128, Chip::At24c256, Chip::At24c512] {
            let addr = BusAddress::new(0x50).unwrap();
            let sim = Arc::new(SimEeprom::new(addr, chip));
            let dev = DeviceInstance::new(addr, chip, sim.clone());
            let buf = vec![0u8; 200];

            assert_eq!(write(&dev, &buf, buf.len()).unwrap(), MAX_WRITE_LEN);
            let log = sim.log();
            assert_eq!(log.len(), 1);
            assert_eq!(log[0].data.len(), 34);
        }
    }
}
