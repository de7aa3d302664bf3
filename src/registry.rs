//! In-process host: identities, classes, endpoints and device nodes.
//!
//! [`Registry`] implements [`DeviceHost`] without a kernel underneath, so
//! an attached device can be opened by path and used through the standard
//! [`std::io`] traits. Each open produces an [`OpenFile`] that owns its
//! stream position, like a file description does.
//!
//! # Example
//!
//! ```
//! use std::io::{Read, Seek, SeekFrom, Write};
//! use std::sync::Arc;
//! use eeprom_stream::bus::sim::SimEeprom;
//! use eeprom_stream::types::{BusAddress, Chip};
//! use eeprom_stream::{attach, DriverConfig, Registry};
//!
//! let registry = Registry::new();
//! let addr = BusAddress::new(0x50)?;
//! let sim = Arc::new(SimEeprom::new(addr, Chip::At24c64));
//! let dev = attach(&registry, &DriverConfig::new(), addr, sim)?;
//!
//! let mut file = registry.open("/dev/eeprom")?;
//! file.write_all(&[0x00, 0x10, b'h', b'i'])?;
//! file.seek(SeekFrom::Start(0x10))?;
//! let mut buf = [0u8; 2];
//! file.read_exact(&mut buf)?;
//! assert_eq!(&buf, b"hi");
//!
//! dev.detach();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};

use crate::constants::DYNAMIC_MAJOR_BASE;
use crate::error::{Error, Result};
use crate::lifecycle::DeviceHost;
use crate::session::{FileOperations, Session};
use crate::types::{ClassHandle, NodeHandle, StreamIdentity};

/// Directory device nodes are published under.
pub const DEV_DIR: &str = "/dev";

#[derive(Debug, Clone)]
struct NodeEntry {
    class: ClassHandle,
    identity: StreamIdentity,
    path: String,
}

struct RegistryState {
    next_major: u32,
    next_class: u32,
    next_node: u32,
    identities: BTreeMap<StreamIdentity, String>,
    classes: BTreeMap<ClassHandle, String>,
    endpoints: HashMap<StreamIdentity, Arc<dyn FileOperations>>,
    nodes: BTreeMap<NodeHandle, NodeEntry>,
}

/// A minimal character-device host living in the current process.
pub struct Registry {
    state: Mutex<RegistryState>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A host with nothing registered.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                next_major: DYNAMIC_MAJOR_BASE,
                next_class: 0,
                next_node: 0,
                identities: BTreeMap::new(),
                classes: BTreeMap::new(),
                endpoints: HashMap::new(),
                nodes: BTreeMap::new(),
            }),
        }
    }

    /// Open a published node by path.
    pub fn open(&self, path: &str) -> Result<OpenFile> {
        let (identity, ops) = {
            let state = self.lock();
            let node = state
                .nodes
                .values()
                .find(|n| n.path == path)
                .ok_or_else(|| Error::NoDevice(path.to_string()))?;
            let ops = state
                .endpoints
                .get(&node.identity)
                .cloned()
                .ok_or_else(|| Error::NoDevice(format!("no endpoint for {}", node.identity)))?;
            (node.identity, ops)
        };
        // Called without the registry lock so endpoints may use the host.
        let session = ops.open(identity)?;
        Ok(OpenFile::new(ops, session))
    }

    /// Paths of all published nodes, sorted.
    pub fn nodes(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.lock().nodes.values().map(|n| n.path.clone()).collect();
        paths.sort();
        paths
    }

    /// Names of all live classes.
    pub fn classes(&self) -> Vec<String> {
        self.lock().classes.values().cloned().collect()
    }

    /// Number of allocated stream identities.
    pub fn identity_count(&self) -> usize {
        self.lock().identities.len()
    }

    /// Number of registered stream endpoints.
    pub fn endpoint_count(&self) -> usize {
        self.lock().endpoints.len()
    }

    /// True when nothing at all is registered.
    pub fn is_empty(&self) -> bool {
        let state = self.lock();
        state.identities.is_empty()
            && state.classes.is_empty()
            && state.endpoints.is_empty()
            && state.nodes.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Registry")
            .field("identities", &state.identities)
            .field("classes", &state.classes)
            .field("endpoints", &state.endpoints.len())
            .field("nodes", &state.nodes)
            .finish()
    }
}

impl DeviceHost for Registry {
    fn alloc_identity(&self, name: &str) -> Result<StreamIdentity> {
        let mut state = self.lock();
        if state.identities.values().any(|n| n == name) {
            return Err(Error::Busy("stream identity name already registered"));
        }
        let identity = StreamIdentity {
            major: state.next_major,
            minor: 0,
        };
        state.next_major += 1;
        state.identities.insert(identity, name.to_string());
        debug!("allocated {} for {}", identity, name);
        Ok(identity)
    }

    fn release_identity(&self, identity: StreamIdentity) {
        self.lock().identities.remove(&identity);
    }

    fn create_class(&self, name: &str) -> Result<ClassHandle> {
        let mut state = self.lock();
        if state.classes.values().any(|n| n == name) {
            return Err(Error::Busy("class already exists"));
        }
        let class = ClassHandle(state.next_class);
        state.next_class += 1;
        state.classes.insert(class, name.to_string());
        Ok(class)
    }

    fn destroy_class(&self, class: ClassHandle) {
        self.lock().classes.remove(&class);
    }

    fn add_endpoint(&self, identity: StreamIdentity, ops: Arc<dyn FileOperations>) -> Result<()> {
        let mut state = self.lock();
        if !state.identities.contains_key(&identity) {
            return Err(Error::NoDevice(format!("identity {identity} not allocated")));
        }
        if state.endpoints.contains_key(&identity) {
            return Err(Error::Busy("endpoint already registered"));
        }
        state.endpoints.insert(identity, ops);
        Ok(())
    }

    fn remove_endpoint(&self, identity: StreamIdentity) {
        self.lock().endpoints.remove(&identity);
    }

    fn create_node(
        &self,
        class: ClassHandle,
        identity: StreamIdentity,
        name: &str,
    ) -> Result<NodeHandle> {
        let mut state = self.lock();
        if !state.classes.contains_key(&class) {
            return Err(Error::NoDevice(format!("class {} does not exist", class.0)));
        }
        let path = format!("{DEV_DIR}/{name}");
        if state.nodes.values().any(|n| n.path == path) {
            return Err(Error::Busy("device node already exists"));
        }
        let node = NodeHandle(state.next_node);
        state.next_node += 1;
        info!("publishing {} ({})", path, identity);
        state.nodes.insert(
            node,
            NodeEntry {
                class,
                identity,
                path,
            },
        );
        Ok(node)
    }

    fn destroy_node(&self, node: NodeHandle) {
        if let Some(entry) = self.lock().nodes.remove(&node) {
            debug!("removed {} from class {}", entry.path, entry.class.0);
        }
    }
}

/// An open device node with its own stream position.
pub struct OpenFile {
    ops: Arc<dyn FileOperations>,
    session: Session,
    pos: u64,
}

impl OpenFile {
    fn new(ops: Arc<dyn FileOperations>, session: Session) -> Self {
        Self {
            ops,
            session,
            pos: 0,
        }
    }

    /// Current stream position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// The session this file was opened with.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Read at the current position and advance it.
    pub fn read_data(&mut self, buf: &mut [u8]) -> Result<usize> {
        let count = buf.len();
        self.ops.read(&self.session, buf, count, &mut self.pos)
    }

    /// Write `[addr_hi, addr_lo, data...]`. The position is not used.
    pub fn write_data(&mut self, buf: &[u8]) -> Result<usize> {
        self.ops.write(&self.session, buf, buf.len(), &mut self.pos)
    }

    /// Write one whole frame or nothing.
    ///
    /// The trait `write` adapters go through here. A frame longer than the
    /// device's write limit is rejected, since a partial count would make
    /// `write_all` resend the tail with its first two bytes taken as a new
    /// destination address.
    pub(crate) fn write_frame(&mut self, buf: &[u8]) -> Result<usize> {
        if buf.len() > self.session.device().write_limit() {
            return Err(Error::InvalidArgument(
                "frame longer than one page write; use write_data to truncate",
            ));
        }
        self.write_data(buf)
    }

    /// Move the position. `SeekFrom::End` is unsupported: device nodes have
    /// no size.
    pub fn seek_to(&mut self, target: io::SeekFrom) -> Result<u64> {
        self.pos = match target {
            io::SeekFrom::Start(offset) => offset,
            io::SeekFrom::Current(delta) => self
                .pos
                .checked_add_signed(delta)
                .ok_or(Error::InvalidArgument("seek before start or past u64::MAX"))?,
            io::SeekFrom::End(_) => {
                return Err(Error::InvalidArgument("device nodes cannot seek from end"))
            }
        };
        Ok(self.pos)
    }
}

impl fmt::Debug for OpenFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenFile")
            .field("session", &self.session)
            .field("pos", &self.pos)
            .finish_non_exhaustive()
    }
}

impl io::Read for OpenFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_data(buf)?)
    }
}

impl io::Write for OpenFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_frame(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Seek for OpenFile {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullOps;

    impl FileOperations for NullOps {
        fn open(&self, identity: StreamIdentity) -> Result<Session> {
            Err(Error::NoDevice(identity.to_string()))
        }

        fn read(&self, _: &Session, _: &mut [u8], _: usize, _: &mut u64) -> Result<usize> {
            Ok(0)
        }

        fn write(&self, _: &Session, _: &[u8], _: usize, _: &mut u64) -> Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn identities_get_distinct_majors() {
        let reg = Registry::new();
        let a = reg.alloc_identity("a").unwrap();
        let b = reg.alloc_identity("b").unwrap();
        assert_eq!(a.major, DYNAMIC_MAJOR_BASE);
        assert_eq!(b.major, DYNAMIC_MAJOR_BASE + 1);
        assert_eq!(reg.identity_count(), 2);
        reg.release_identity(a);
        assert_eq!(reg.identity_count(), 1);
    }

    #[test]
    fn duplicate_names_are_busy() {
        let reg = Registry::new();
        reg.alloc_identity("eeprom").unwrap();
        assert!(matches!(reg.alloc_identity("eeprom"), Err(Error::Busy(_))));
        reg.create_class("cls").unwrap();
        assert!(matches!(reg.create_class("cls"), Err(Error::Busy(_))));
    }

    #[test]
    fn endpoint_requires_identity() {
        let reg = Registry::new();
        let id = StreamIdentity { major: 1, minor: 0 };
        assert!(matches!(
            reg.add_endpoint(id, Arc::new(NullOps)),
            Err(Error::NoDevice(_))
        ));
    }

    #[test]
    fn node_publish_and_remove() {
        let reg = Registry::new();
        let id = reg.alloc_identity("eeprom").unwrap();
        let class = reg.create_class("eeprom_class").unwrap();
        let node = reg.create_node(class, id, "eeprom").unwrap();
        assert_eq!(reg.nodes(), vec!["/dev/eeprom".to_string()]);
        assert!(matches!(
            reg.create_node(class, id, "eeprom"),
            Err(Error::Busy(_))
        ));
        reg.destroy_node(node);
        assert!(reg.nodes().is_empty());
    }

    #[test]
    fn node_requires_class() {
        let reg = Registry::new();
        let id = reg.alloc_identity("eeprom").unwrap();
        assert!(matches!(
            reg.create_node(ClassHandle(9), id, "eeprom"),
            Err(Error::NoDevice(_))
        ));
    }

    #[test]
    fn open_unknown_path() {
        let reg = Registry::new();
        assert!(matches!(reg.open("/dev/nothing"), Err(Error::NoDevice(_))));
    }

    #[test]
    fn open_propagates_endpoint_error() {
        let reg = Registry::new();
        let id = reg.alloc_identity("null").unwrap();
        let class = reg.create_class("c").unwrap();
        reg.add_endpoint(id, Arc::new(NullOps)).unwrap();
        reg.create_node(class, id, "null").unwrap();
        assert!(matches!(reg.open("/dev/null"), Err(Error::NoDevice(_))));
    }

    #[test]
    fn starts_empty() {
        let reg = Registry::default();
        assert!(reg.is_empty());
        assert!(reg.classes().is_empty());
        assert_eq!(reg.endpoint_count(), 0);
    }
}
