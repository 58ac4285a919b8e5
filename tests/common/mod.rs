//! Fake compositor connection shared by the integration tests

#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    io,
    os::fd::{BorrowedFd, OwnedFd},
    rc::Rc,
};

use shmcanvas::{BufferLayout, Destroy, Namespace, ProtocolError, ShmConnection, ShmPool};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Live object counts observed through a fake connection
#[derive(Debug, Default)]
pub struct Ledger {
    pub live_pools: Cell<usize>,
    pub live_buffers: Cell<usize>,
    pub pool_sizes: RefCell<Vec<i32>>,
    pub layouts: RefCell<Vec<BufferLayout>>,
}

#[derive(Debug, Default)]
pub struct FakeConnection {
    pub ledger: Rc<Ledger>,
    pub refuse_pool: bool,
    pub fail_slot: Option<usize>,
}

impl FakeConnection {
    pub fn failing_at_slot(slot: usize) -> Self {
        Self {
            fail_slot: Some(slot),
            ..Default::default()
        }
    }

    pub fn refusing_pools() -> Self {
        Self {
            refuse_pool: true,
            ..Default::default()
        }
    }

    pub fn live_pools(&self) -> usize {
        self.ledger.live_pools.get()
    }

    pub fn live_buffers(&self) -> usize {
        self.ledger.live_buffers.get()
    }
}

#[derive(Debug)]
pub struct FakePool {
    ledger: Rc<Ledger>,
    fail_slot: Option<usize>,
    created: Cell<usize>,
}

#[derive(Debug)]
pub struct FakeBuffer {
    pub slot: usize,
    pub layout: BufferLayout,
    ledger: Rc<Ledger>,
}

impl ShmConnection for FakeConnection {
    type Pool = FakePool;

    fn create_pool(&self, _fd: BorrowedFd<'_>, size: i32) -> Result<FakePool, ProtocolError> {
        if self.refuse_pool {
            return Err(ProtocolError::new("fake compositor refused the pool"));
        }
        self.ledger.live_pools.set(self.ledger.live_pools.get() + 1);
        self.ledger.pool_sizes.borrow_mut().push(size);
        Ok(FakePool {
            ledger: self.ledger.clone(),
            fail_slot: self.fail_slot,
            created: Cell::new(0),
        })
    }
}

impl ShmPool for FakePool {
    type Buffer = FakeBuffer;

    fn create_buffer(&self, layout: &BufferLayout) -> Result<FakeBuffer, ProtocolError> {
        let slot = self.created.get();
        if self.fail_slot == Some(slot) {
            return Err(ProtocolError::new("fake compositor refused the buffer"));
        }
        self.created.set(slot + 1);
        self.ledger.live_buffers.set(self.ledger.live_buffers.get() + 1);
        self.ledger.layouts.borrow_mut().push(*layout);
        Ok(FakeBuffer {
            slot,
            layout: *layout,
            ledger: self.ledger.clone(),
        })
    }
}

impl Destroy for FakePool {
    fn destroy(&mut self) {
        self.ledger.live_pools.set(self.ledger.live_pools.get() - 1);
    }
}

impl Destroy for FakeBuffer {
    fn destroy(&mut self) {
        self.ledger.live_buffers.set(self.ledger.live_buffers.get() - 1);
    }
}

/// Namespace in which every name is already taken
pub struct AlwaysTaken {
    pub attempts: Cell<u32>,
}

impl AlwaysTaken {
    pub fn new() -> Self {
        Self {
            attempts: Cell::new(0),
        }
    }
}

impl Namespace for AlwaysTaken {
    fn create_exclusive(&self, _name: &str) -> io::Result<OwnedFd> {
        self.attempts.set(self.attempts.get() + 1);
        Err(io::Error::from(io::ErrorKind::AlreadyExists))
    }

    fn unlink(&self, _name: &str) -> io::Result<()> {
        Ok(())
    }
}

/// Namespace handing out descriptors that cannot be resized or mapped writable
pub struct ReadOnly {
    dir: tempfile::TempDir,
}

impl ReadOnly {
    pub fn new() -> Self {
        Self {
            dir: tempfile::TempDir::new().unwrap(),
        }
    }

    pub fn entries(&self) -> usize {
        std::fs::read_dir(self.dir.path()).unwrap().count()
    }
}

impl Namespace for ReadOnly {
    fn create_exclusive(&self, name: &str) -> io::Result<OwnedFd> {
        let path = self.dir.path().join(name.trim_start_matches('/'));
        std::fs::File::options().write(true).create_new(true).open(&path)?;
        Ok(OwnedFd::from(std::fs::File::open(&path)?))
    }

    fn unlink(&self, name: &str) -> io::Result<()> {
        std::fs::remove_file(self.dir.path().join(name.trim_start_matches('/')))
    }
}

/// Number of descriptors currently open in this process
pub fn open_fd_count() -> usize {
    std::fs::read_dir("/proc/self/fd")
        .map(|entries| entries.count())
        .unwrap_or(0)
}
