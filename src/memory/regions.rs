//! Anonymous backing region implementation

#[cfg(target_os = "linux")]
use std::ffi::CString;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd};

use log::debug;
use memmap2::{MmapMut, MmapOptions};
#[cfg(target_os = "linux")]
use nix::sys::memfd::{memfd_create, MemFdCreateFlag};
use nix::unistd::ftruncate;

use crate::error::{Result, ShmError};

use super::{
    config::{BackingConfig, BackingType},
    namespace::{create_unlinked, Directory, Namespace, PosixShm},
};

/// An unlinked, memory-mapped file holding pixel data.
///
/// The file is reachable only through the owned descriptor. Fields drop in
/// declaration order, so the mapping is removed before the descriptor closes.
#[derive(Debug)]
pub struct BackingRegion {
    /// Read/write shared mapping of the whole file
    mmap: MmapMut,
    /// Descriptor handed to the compositor
    fd: OwnedFd,
    /// Size of the file and of the mapping
    len: usize,
    backing_type: BackingType,
}

impl BackingRegion {
    /// Create a zero-filled region of `len` bytes as described by `config`
    pub fn create(config: &BackingConfig, len: usize) -> Result<Self> {
        match &config.backing_type {
            BackingType::ShmOpen => Self::create_in(&PosixShm, config, len),
            BackingType::FileBacked { dir } => Self::create_in(&Directory::new(dir), config, len),
            #[cfg(target_os = "linux")]
            BackingType::MemFd => Self::create_memfd(config, len),
        }
    }

    /// Create a region through an explicit namespace.
    ///
    /// `config.backing_type` is recorded but the file itself comes from
    /// `namespace`.
    pub fn create_in(namespace: &dyn Namespace, config: &BackingConfig, len: usize) -> Result<Self> {
        Self::check_request(config, len)?;

        let fd = create_unlinked(namespace, &config.name_prefix, config.max_name_attempts)?;
        Self::map(fd, len, config.backing_type.clone())
    }

    #[cfg(target_os = "linux")]
    fn create_memfd(config: &BackingConfig, len: usize) -> Result<Self> {
        Self::check_request(config, len)?;

        let name = CString::new(config.name_prefix.trim_start_matches('/'))
            .map_err(|_| ShmError::invalid_parameter("name_prefix", "Name contains null bytes"))?;
        let fd = memfd_create(&name, MemFdCreateFlag::MFD_CLOEXEC)
            .map_err(|e| ShmError::backing_allocation(1, Some(e.into())))?;

        Self::map(fd, len, BackingType::MemFd)
    }

    fn check_request(config: &BackingConfig, len: usize) -> Result<()> {
        config.validate()?;
        if len == 0 {
            return Err(ShmError::invalid_parameter(
                "len",
                "Backing size must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Size the file and map it. On error `fd` is dropped, closing it.
    fn map(fd: OwnedFd, len: usize, backing_type: BackingType) -> Result<Self> {
        let file_len = nix::libc::off_t::try_from(len)
            .map_err(|_| ShmError::invalid_parameter("len", "Backing size exceeds off_t"))?;
        ftruncate(&fd, file_len)
            .map_err(|e| ShmError::backing_map(e.into(), "Failed to resize backing file"))?;

        // SAFETY: the file was created by us and unlinked, so nothing else
        // can truncate it underneath the mapping.
        let mmap = unsafe { MmapOptions::new().len(len).map_mut(&fd) }
            .map_err(|e| ShmError::backing_map(e, "Failed to map backing file"))?;

        debug!(
            "Mapped {} byte {} backing on fd {}",
            len,
            backing_type.name(),
            fd.as_raw_fd()
        );

        Ok(Self {
            mmap,
            fd,
            len,
            backing_type,
        })
    }

    /// Get the size of the region
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn backing_type(&self) -> &BackingType {
        &self.backing_type
    }

    /// Base of the mapping
    pub fn as_ptr(&self) -> *const u8 {
        self.mmap.as_ptr()
    }

    /// Writable base of the mapping.
    ///
    /// The pointer stays valid for as long as the region is alive. Writes
    /// through it are not synchronised with anything, including the compositor.
    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.mmap.as_ptr().cast_mut()
    }

    /// Get the raw memory slice (read-only)
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    /// Get the raw memory slice (mutable)
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.mmap
    }
}

impl AsFd for BackingRegion {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}
