//! Error types for the eeprom-stream crate.

use std::collections::TryReserveError;
use std::fmt;
use std::io;

use crate::constants::errno;

/// The attach step that failed while bringing a device up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachStep {
    /// Allocating the stream identity (major/minor).
    Identity,
    /// Creating the device class.
    Class,
    /// Registering the stream endpoint for the identity.
    Endpoint,
    /// Publishing the device node.
    Node,
}

impl fmt::Display for AttachStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => write!(f, "stream identity allocation"),
            Self::Class => write!(f, "class creation"),
            Self::Endpoint => write!(f, "endpoint registration"),
            Self::Node => write!(f, "device node creation"),
        }
    }
}

/// The error type for EEPROM stream operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A staging buffer could not be allocated.
    #[error("out of memory")]
    OutOfMemory,

    /// Copying across the caller/staging boundary failed.
    #[error("bad address: {0}")]
    BadAddress(&'static str),

    /// Invalid argument(s) were provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The bus adapter reported a failed transfer. The code is the
    /// adapter's negative errno, passed through unchanged.
    #[error("bus transfer failed (code {0})")]
    Bus(i32),

    /// An attach step failed. Everything acquired before it has already
    /// been released.
    #[error("attach failed during {step}: {source}")]
    Lifecycle {
        /// The step that failed.
        step: AttachStep,
        /// The error reported by the host for that step.
        #[source]
        source: Box<Error>,
    },

    /// A name or identity is already taken on the host.
    #[error("resource busy: {0}")]
    Busy(&'static str),

    /// No such device, node or identification entry.
    #[error("no such device: {0}")]
    NoDevice(String),
}

impl Error {
    /// The negative errno a host would hand back to its caller.
    pub fn errno(&self) -> i32 {
        match self {
            Self::OutOfMemory => -errno::ENOMEM,
            Self::BadAddress(_) => -errno::EFAULT,
            Self::InvalidArgument(_) => -errno::EINVAL,
            Self::Bus(code) => *code,
            Self::Lifecycle { source, .. } => source.errno(),
            Self::Busy(_) => -errno::EBUSY,
            Self::NoDevice(_) => -errno::ENODEV,
        }
    }

    pub(crate) fn at_step(step: AttachStep, source: Error) -> Self {
        Self::Lifecycle {
            step,
            source: Box::new(source),
        }
    }
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match &err {
            Error::OutOfMemory => io::ErrorKind::OutOfMemory,
            Error::BadAddress(_) | Error::InvalidArgument(_) => io::ErrorKind::InvalidInput,
            Error::NoDevice(_) => io::ErrorKind::NotFound,
            Error::Busy(_) => io::ErrorKind::AlreadyExists,
            Error::Bus(_) | Error::Lifecycle { .. } => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

/// A specialized `Result` type for EEPROM stream operations.
pub type Result<T> = std::result::Result<T, Error>;
