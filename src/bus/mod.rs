//! Bus messages, message plans and the adapter contract.
//!
//! A [`MessagePlan`] is the ordered list of [`Message`]s that together
//! implement one logical EEPROM operation. Plans are built by
//! [`plan`] and handed to an [`I2cAdapter`], which drives the physical bus.

pub mod plan;
pub mod sim;

use crate::error::Result;
use crate::types::{BusAddress, Direction};

/// A single bus message: one START (or repeated START), the address byte
/// with its direction bit, and the data phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    address: BusAddress,
    direction: Direction,
    buf: Vec<u8>,
}

impl Message {
    /// A write message carrying `data`.
    pub fn write(address: BusAddress, data: Vec<u8>) -> Self {
        Self {
            address,
            direction: Direction::Write,
            buf: data,
        }
    }

    /// A read message that fills `buf` (its length is the read length).
    pub fn read(address: BusAddress, buf: Vec<u8>) -> Self {
        Self {
            address,
            direction: Direction::Read,
            buf,
        }
    }

    /// Target address of the message.
    pub fn address(&self) -> BusAddress {
        self.address
    }

    /// Transfer direction of the data phase.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// True for a read message.
    pub fn is_read(&self) -> bool {
        self.direction == Direction::Read
    }

    /// Length of the data phase in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when the data phase has no bytes.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes to send (write) or bytes received so far (read).
    pub fn data(&self) -> &[u8] {
        &self.buf
    }

    /// Destination for a read message's data phase.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Take the data buffer out of the message.
    pub fn into_data(self) -> Vec<u8> {
        self.buf
    }
}

/// An ordered sequence of messages submitted as one indivisible transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePlan {
    messages: Vec<Message>,
}

impl MessagePlan {
    pub(crate) fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// The messages in submission order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Mutable view handed to [`I2cAdapter::transfer`].
    pub fn messages_mut(&mut self) -> &mut [Message] {
        &mut self.messages
    }

    /// Number of messages in the plan.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when the plan has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Take the buffer of the last read message, if the plan has one.
    pub fn into_read_data(self) -> Option<Vec<u8>> {
        self.messages
            .into_iter()
            .rev()
            .find(Message::is_read)
            .map(Message::into_data)
    }
}

/// A bus master able to execute message plans.
///
/// Implementations must run all messages of one call back to back, with
/// repeated STARTs between them and no traffic from other callers in
/// between. The call may block until the physical transfer is done.
pub trait I2cAdapter: Send + Sync {
    /// Execute `messages` in order and return how many completed.
    ///
    /// Errors carry a negative errno-style code in
    /// [`Error::Bus`](crate::Error::Bus).
    fn transfer(&self, messages: &mut [Message]) -> Result<usize>;

    /// Short human-readable adapter name, used in log lines.
    fn name(&self) -> &str {
        "i2c"
    }
}
