//! Staging buffers between caller memory and bus messages.
//!
//! Caller memory is never handed to the bus directly. Every transfer goes
//! through a zeroed [`StagingBuffer`] owned by the call that allocated it.
//! The caller side is a slice plus the byte count the caller claims; a
//! count that runs past the slice is a bad address.

use std::ops::Deref;

use crate::constants::MAX_WRITE_LEN;
use crate::error::{Error, Result};

/// A zero-initialized, call-owned transfer buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingBuffer {
    buf: Vec<u8>,
}

impl StagingBuffer {
    /// Allocate `len` zeroed bytes, reporting `OutOfMemory` instead of
    /// aborting when the allocation cannot be satisfied.
    pub fn zeroed(len: usize) -> Result<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)?;
        buf.resize(len, 0);
        Ok(Self { buf })
    }

    /// Number of staged bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Hand the bytes over to a bus message.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

impl From<Vec<u8>> for StagingBuffer {
    fn from(buf: Vec<u8>) -> Self {
        Self { buf }
    }
}

impl Deref for StagingBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

/// Copy up to [`MAX_WRITE_LEN`] of the `count` bytes the caller offers
/// into a new staging buffer. Longer requests are truncated, whatever the
/// page size of the part.
pub fn stage_for_write(caller: &[u8], count: usize) -> Result<StagingBuffer> {
    let count = count.min(MAX_WRITE_LEN);
    let mut staging = StagingBuffer::zeroed(count)?;
    let src = caller
        .get(..count)
        .ok_or(Error::BadAddress("write source shorter than count"))?;
    staging.buf.copy_from_slice(src);
    Ok(staging)
}

/// Allocate the zeroed staging buffer for a `count`-byte read.
pub fn stage_for_read(count: usize) -> Result<StagingBuffer> {
    StagingBuffer::zeroed(count)
}

/// Copy `count` staged bytes back into caller memory.
pub fn publish(staging: &StagingBuffer, caller: &mut [u8], count: usize) -> Result<()> {
    let src = staging
        .get(..count)
        .ok_or(Error::BadAddress("staging buffer shorter than count"))?;
    let dst = caller
        .get_mut(..count)
        .ok_or(Error::BadAddress("read destination shorter than count"))?;
    dst.copy_from_slice(src);
    Ok(())
}
