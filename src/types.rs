//! Type definitions shared across the crate.
//!
//! These model the bus-side identity of a device (its 7-bit address and
//! memory geometry) and the host-side handles produced while attaching it.

use std::fmt;

use crate::constants::PAGE_SIZE;
use crate::error::{Error, Result};

/// A validated 7-bit I2C device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusAddress(u8);

impl BusAddress {
    /// Validate a raw 7-bit address.
    pub fn new(raw: u8) -> Result<Self> {
        if raw > 0x7F {
            return Err(Error::InvalidArgument(
                "I2C address must be 7-bit (0x00-0x7F)",
            ));
        }
        Ok(Self(raw))
    }

    /// The raw 7-bit value.
    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

impl TryFrom<u8> for BusAddress {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self> {
        Self::new(raw)
    }
}

/// Supported serial EEPROM parts.
///
/// All of them take a two-byte memory address; they differ in capacity and
/// in how many bytes a single page write may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Chip {
    /// 4 KiB, 32-byte pages.
    At24c32,
    /// 8 KiB, 32-byte pages.
    #[default]
    At24c64,
    /// 16 KiB, 64-byte pages.
    At24c128,
    /// 32 KiB, 64-byte pages.
    At24c256,
    /// 64 KiB, 128-byte pages.
    At24c512,
}

impl Chip {
    /// Capacity in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::At24c32 => 4 * 1024,
            Self::At24c64 => 8 * 1024,
            Self::At24c128 => 16 * 1024,
            Self::At24c256 => 32 * 1024,
            Self::At24c512 => 64 * 1024,
        }
    }

    /// Page-write ceiling in data bytes.
    pub fn page_size(self) -> usize {
        match self {
            Self::At24c32 | Self::At24c64 => PAGE_SIZE,
            Self::At24c128 | Self::At24c256 => 64,
            Self::At24c512 => 128,
        }
    }

    /// Identification name as matched by the host.
    pub fn name(self) -> &'static str {
        match self {
            Self::At24c32 => "24c32",
            Self::At24c64 => "24c64",
            Self::At24c128 => "24c128",
            Self::At24c256 => "24c256",
            Self::At24c512 => "24c512",
        }
    }
}

/// Message direction on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Master transmits.
    Write,
    /// Master receives.
    Read,
}

/// A character-stream identity (major/minor pair).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamIdentity {
    /// Major number.
    pub major: u32,
    /// Minor number.
    pub minor: u32,
}

impl fmt::Display for StreamIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// Handle to a class created on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassHandle(pub u32);

/// Handle to a published device node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub u32);
