//! Stream read and hex dump example.
//!
//! Attaches a simulated 24C64 at 0x50, seeds a few bytes, opens the device
//! node and dumps the first 64 bytes through the stream interface.
//!
//! Usage: cargo run --example dump

use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use eeprom_stream::bus::sim::SimEeprom;
use eeprom_stream::types::{BusAddress, Chip};
use eeprom_stream::{EepromDriver, I2cClient, Registry};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let address = BusAddress::new(0x50)?;
    let sim = Arc::new(SimEeprom::new(address, Chip::At24c64));
    sim.poke(0x00, b"eeprom-stream demo");
    sim.poke(0x20, &[0xDE, 0xAD, 0xBE, 0xEF]);

    let registry = Registry::new();
    let driver = EepromDriver::default();
    let dev = driver.probe(
        &registry,
        I2cClient {
            name: "24c64".into(),
            address,
            adapter: sim.clone(),
        },
    )?;
    println!("Published: {:?}", registry.nodes());

    let mut file = registry.open("/dev/eeprom")?;
    file.seek(SeekFrom::Start(0))?;
    let mut buf = [0u8; 64];
    file.read_exact(&mut buf)?;

    println!("\nFirst 64 bytes:");
    for (i, chunk) in buf.chunks(16).enumerate() {
        print!("  {:04X}: ", i * 16);
        for b in chunk {
            print!("{b:02X} ");
        }
        println!();
    }
    println!("\nPosition after read: {}", file.position());
    println!("Bus messages: {}", sim.log().len());

    driver.remove(dev);
    Ok(())
}
