//! Temporary names for backing files

use std::{
    fs::OpenOptions,
    io,
    os::fd::OwnedFd,
    os::unix::fs::OpenOptionsExt,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use log::{trace, warn};
use nix::{
    fcntl::OFlag,
    sys::{
        mman::{shm_open, shm_unlink},
        stat::Mode,
    },
};

use crate::error::{Result, ShmError};

static NAME_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A namespace in which backing files are created by name.
///
/// `create_exclusive` must fail with [`io::ErrorKind::AlreadyExists`] when the
/// name is taken; any other error ends the search immediately.
pub trait Namespace {
    fn create_exclusive(&self, name: &str) -> io::Result<OwnedFd>;

    fn unlink(&self, name: &str) -> io::Result<()>;
}

/// POSIX shared-memory objects
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixShm;

impl Namespace for PosixShm {
    fn create_exclusive(&self, name: &str) -> io::Result<OwnedFd> {
        let name = shm_object_name(name);
        shm_open(
            name.as_str(),
            OFlag::O_RDWR | OFlag::O_CREAT | OFlag::O_EXCL,
            Mode::S_IRUSR | Mode::S_IWUSR,
        )
        .map_err(io::Error::from)
    }

    fn unlink(&self, name: &str) -> io::Result<()> {
        let name = shm_object_name(name);
        shm_unlink(name.as_str()).map_err(io::Error::from)
    }
}

/// Regular files inside a directory
#[derive(Debug, Clone)]
pub struct Directory {
    dir: PathBuf,
}

impl Directory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn entry(&self, name: &str) -> PathBuf {
        self.dir.join(name.trim_start_matches('/'))
    }
}

impl Namespace for Directory {
    fn create_exclusive(&self, name: &str) -> io::Result<OwnedFd> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(self.entry(name))?;
        Ok(OwnedFd::from(file))
    }

    fn unlink(&self, name: &str) -> io::Result<()> {
        std::fs::remove_file(self.entry(name))
    }
}

/// `shm_open` wants exactly one leading slash
fn shm_object_name(name: &str) -> String {
    format!("/{}", name.trim_start_matches('/'))
}

/// Generate a fresh name under `prefix`.
///
/// Combines the process id, the wall clock and a process-wide sequence, so two
/// calls never return the same name even within one clock tick.
pub fn unique_name(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let sequence = NAME_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{:x}-{}", prefix, std::process::id(), nanos, sequence)
}

/// Create a file under a fresh name in `namespace` and unlink the name again.
///
/// Collisions are retried with a new name up to `max_attempts` times.
pub fn create_unlinked(
    namespace: &dyn Namespace,
    prefix: &str,
    max_attempts: u32,
) -> Result<OwnedFd> {
    let mut last_collision = None;

    for attempt in 1..=max_attempts {
        let name = unique_name(prefix);
        match namespace.create_exclusive(&name) {
            Ok(fd) => {
                if let Err(e) = namespace.unlink(&name) {
                    warn!("Failed to unlink backing file {}: {}", name, e);
                }
                trace!("Created backing file {} on attempt {}", name, attempt);
                return Ok(fd);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                trace!("Backing name {} is taken, retrying", name);
                last_collision = Some(e);
            }
            Err(e) => return Err(ShmError::backing_allocation(attempt, Some(e))),
        }
    }

    warn!(
        "Gave up creating a backing file after {} name collisions",
        max_attempts
    );
    Err(ShmError::backing_allocation(max_attempts, last_collision))
}
