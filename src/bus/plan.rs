//! Message plan construction for random reads and page writes.
//!
//! 24Cxx parts have no separate address phase: the memory address is the
//! first two bytes of a write. A random read therefore starts with a write
//! that only carries the address ("dummy write"), followed by a repeated
//! START and the read itself.

use super::{Message, MessagePlan};
use crate::constants::ADDRESS_BYTES;
use crate::types::BusAddress;

/// Encode a stream offset as the big-endian memory address on the wire.
///
/// Only the low 16 bits are representable; higher bits are dropped.
#[inline]
pub fn encode_offset(offset: u64) -> [u8; ADDRESS_BYTES] {
    (offset as u16).to_be_bytes()
}

/// Build the two-message random read plan.
///
/// `buf` is the (zeroed) buffer the data phase reads into; its length is
/// the read length.
pub fn read_plan(address: BusAddress, offset: u64, buf: Vec<u8>) -> MessagePlan {
    MessagePlan::new(vec![
        Message::write(address, encode_offset(offset).to_vec()),
        Message::read(address, buf),
    ])
}

/// Build the single-message page write plan: address bytes then `payload`.
pub fn write_plan(address: BusAddress, offset: u16, payload: &[u8]) -> MessagePlan {
    let mut frame = Vec::with_capacity(ADDRESS_BYTES + payload.len());
    frame.extend_from_slice(&offset.to_be_bytes());
    frame.extend_from_slice(payload);
    MessagePlan::new(vec![Message::write(address, frame)])
}
