//! Simulated 24Cxx EEPROM on a private bus.
//!
//! [`SimEeprom`] behaves like a real part as seen from the master:
//!
//! - It only acknowledges its own address; any other address fails the
//!   transfer with `-ENXIO`.
//! - The first two bytes of a write latch the internal address pointer
//!   (masked to the capacity). Further bytes are stored with in-page
//!   rollover, exactly like a page write on the real part.
//! - Reads stream out from the pointer and roll over at the end of the
//!   array.
//!
//! The internal write cycle completes instantly. Every message is recorded
//! in a bus log so callers can check the exact traffic a plan produced.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{I2cAdapter, Message};
use crate::constants::{errno, ADDRESS_BYTES};
use crate::error::{Error, Result};
use crate::types::{BusAddress, Chip, Direction};

/// One message as observed on the simulated bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedMessage {
    /// Target address of the message.
    pub address: BusAddress,
    /// Message direction.
    pub direction: Direction,
    /// Bytes sent by the master (write) or returned by the part (read).
    pub data: Vec<u8>,
}

#[derive(Debug)]
struct SimState {
    memory: Vec<u8>,
    pointer: usize,
    log: Vec<LoggedMessage>,
    fail_next: Option<i32>,
}

impl SimState {
    fn mask(&self) -> usize {
        self.memory.len() - 1
    }

    fn write(&mut self, data: &[u8], page_size: usize) {
        // A bare address byte (or an empty probe) leaves the array alone.
        if data.len() < ADDRESS_BYTES {
            return;
        }
        self.pointer = u16::from_be_bytes([data[0], data[1]]) as usize & self.mask();

        let page_mask = page_size - 1;
        let page_base = self.pointer & !page_mask;
        let mut column = self.pointer & page_mask;
        for &byte in &data[ADDRESS_BYTES..] {
            self.memory[page_base + column] = byte;
            column = (column + 1) & page_mask;
        }
        self.pointer = page_base + column;
    }

    fn read(&mut self, buf: &mut [u8]) {
        let mask = self.mask();
        for byte in buf.iter_mut() {
            *byte = self.memory[self.pointer];
            self.pointer = (self.pointer + 1) & mask;
        }
    }
}

/// An in-memory 24Cxx part that implements [`I2cAdapter`].
///
/// # Example
///
/// ```
/// use eeprom_stream::bus::sim::SimEeprom;
/// use eeprom_stream::types::{BusAddress, Chip};
///
/// let sim = SimEeprom::new(BusAddress::new(0x50)?, Chip::At24c64);
/// sim.poke(0x10, &[1, 2, 3]);
/// assert_eq!(&sim.contents()[0x10..0x13], &[1, 2, 3]);
/// # Ok::<(), eeprom_stream::Error>(())
/// ```
#[derive(Debug)]
pub struct SimEeprom {
    address: BusAddress,
    chip: Chip,
    state: Mutex<SimState>,
}

impl SimEeprom {
    /// A blank (erased, all `0xFF`) part answering at `address`.
    pub fn new(address: BusAddress, chip: Chip) -> Self {
        Self {
            address,
            chip,
            state: Mutex::new(SimState {
                memory: vec![0xFF; chip.size()],
                pointer: 0,
                log: Vec::new(),
                fail_next: None,
            }),
        }
    }

    /// The bus address this part acknowledges.
    pub fn address(&self) -> BusAddress {
        self.address
    }

    /// Geometry of the simulated part.
    pub fn chip(&self) -> Chip {
        self.chip
    }

    /// Snapshot of the whole array.
    pub fn contents(&self) -> Vec<u8> {
        self.lock().memory.clone()
    }

    /// Store bytes directly into the array, bypassing the bus.
    ///
    /// Offsets wrap at the end of the array.
    pub fn poke(&self, offset: usize, data: &[u8]) {
        let mut state = self.lock();
        let mask = state.mask();
        for (i, &byte) in data.iter().enumerate() {
            state.memory[(offset + i) & mask] = byte;
        }
    }

    /// All messages seen since creation or the last [`clear_log`](Self::clear_log).
    pub fn log(&self) -> Vec<LoggedMessage> {
        self.lock().log.clone()
    }

    /// Forget all logged messages.
    pub fn clear_log(&self) {
        self.lock().log.clear();
    }

    /// Make the next transfer fail with `code` before any message runs.
    pub fn fail_next(&self, code: i32) {
        self.lock().fail_next = Some(code);
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl I2cAdapter for SimEeprom {
    fn transfer(&self, messages: &mut [Message]) -> Result<usize> {
        let mut state = self.lock();

        if let Some(code) = state.fail_next.take() {
            return Err(Error::Bus(code));
        }

        for msg in messages.iter_mut() {
            if msg.address() != self.address {
                return Err(Error::Bus(-errno::ENXIO));
            }
            match msg.direction() {
                Direction::Write => state.write(msg.data(), self.chip.page_size()),
                Direction::Read => state.read(msg.data_mut()),
            }
            state.log.push(LoggedMessage {
                address: msg.address(),
                direction: msg.direction(),
                data: msg.data().to_vec(),
            });
        }

        Ok(messages.len())
    }

    fn name(&self) -> &str {
        "sim"
    }
}
