//! Page write example.
//!
//! Writes an address-prefixed page, shows the clamp at one page plus
//! address, and reads the result back.
//!
//! Usage: cargo run --example page_write

use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use eeprom_stream::bus::sim::SimEeprom;
use eeprom_stream::types::{BusAddress, Chip};
use eeprom_stream::{attach, DriverConfig, Registry};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let address = BusAddress::new(0x50)?;
    let sim = Arc::new(SimEeprom::new(address, Chip::At24c64));
    let registry = Registry::new();
    let dev = attach(&registry, &DriverConfig::new(), address, sim.clone())?;

    let mut file = registry.open("/dev/eeprom")?;

    // [addr_hi, addr_lo, data...]: 2 address bytes plus 40 data bytes.
    let mut request = vec![0x01, 0x00];
    request.extend((0..40u8).map(|i| b'A' + (i % 26)));
    match file.write(&request) {
        Ok(n) => println!("Unexpected: oversized frame accepted {n} bytes"),
        Err(e) => println!("io::Write rejects the oversized frame: {e}"),
    }
    let accepted = file.write_data(&request)?;
    println!("Requested {} bytes, write_data accepted {}", request.len(), accepted);

    match file.write(&[0x00, 0x00]) {
        Ok(n) => println!("Unexpected: short write accepted {n} bytes"),
        Err(e) => println!("Short write rejected: {e}"),
    }

    file.seek(SeekFrom::Start(0x0100))?;
    let mut back = vec![0u8; accepted - 2];
    file.read_exact(&mut back)?;
    println!("Read back: {}", String::from_utf8_lossy(&back));

    // Poke the debug control.
    dev.debug_trigger().store(b"1")?;
    println!("Byte 0 after debug write: 0x{:02X}", sim.contents()[0]);

    dev.detach();
    println!("Registry empty: {}", registry.is_empty());
    Ok(())
}
