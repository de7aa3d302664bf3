//! Protocol constants and naming defaults.

/// Default device node name (`/dev/eeprom`).
pub const DEVICE_NAME: &str = "eeprom";

/// Default device class name.
pub const CLASS_NAME: &str = "eeprom_class";

/// Driver name reported to the host.
pub const DRIVER_NAME: &str = "eeprom_stream";

/// Usual 7-bit bus address of a 24Cxx part with A0..A2 tied low.
pub const DEFAULT_BUS_ADDRESS: u8 = 0x50;

/// Width of the memory address sent before every transfer.
pub const ADDRESS_BYTES: usize = 2;

/// Shortest accepted write: two address bytes and one data byte.
pub const MIN_WRITE_LEN: usize = ADDRESS_BYTES + 1;

/// Page-write ceiling of the reference part (24C64).
pub const PAGE_SIZE: usize = 32;

/// Largest write transaction for the reference part.
pub const MAX_WRITE_LEN: usize = ADDRESS_BYTES + PAGE_SIZE;

/// Data byte sent by the debug trigger.
pub const DEBUG_PATTERN: u8 = 0xA5;

/// First major number handed out by the in-process registry.
pub const DYNAMIC_MAJOR_BASE: u32 = 240;

/// Errno values (positive, Linux numbering).
pub mod errno {
    pub const EIO: i32 = 5;
    pub const ENXIO: i32 = 6;
    pub const EAGAIN: i32 = 11;
    pub const ENOMEM: i32 = 12;
    pub const EFAULT: i32 = 14;
    pub const EBUSY: i32 = 16;
    pub const ENODEV: i32 = 19;
    pub const EINVAL: i32 = 22;
    pub const EOVERFLOW: i32 = 75;
    pub const EREMOTEIO: i32 = 121;
}
