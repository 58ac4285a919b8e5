//! Compositor-side capabilities consumed by the canvas
//!
//! The canvas never talks to a compositor directly. It is handed something
//! that can turn a descriptor into a pool ([`ShmConnection`]) and a pool into
//! buffers ([`ShmPool`]); everything it creates through them is held in a
//! [`Handle`] so that teardown runs exactly once, in whatever order the
//! owner drops them.

use std::os::fd::BorrowedFd;

use crate::geometry::PixelFormat;

/// Refusal reported by a connection or pool
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProtocolError {
    message: String,
}

impl ProtocolError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A protocol object with an explicit destructor request
pub trait Destroy {
    /// Send the destructor. [`Handle`] calls this at most once per object.
    fn destroy(&mut self);
}

/// Where one buffer lives inside a pool, in the protocol's units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLayout {
    pub offset: i32,
    pub width: i32,
    pub height: i32,
    pub stride: i32,
    pub format: PixelFormat,
}

/// Connection capable of registering shared-memory pools
pub trait ShmConnection {
    type Pool: ShmPool;

    /// Register `size` bytes of the file behind `fd` as a pool
    fn create_pool(&self, fd: BorrowedFd<'_>, size: i32) -> Result<Self::Pool, ProtocolError>;
}

/// Shared-memory pool from which buffers are carved
pub trait ShmPool: Destroy {
    type Buffer: Destroy;

    /// Describe a buffer at `layout.offset` bytes into the pool
    fn create_buffer(&self, layout: &BufferLayout) -> Result<Self::Buffer, ProtocolError>;
}

/// Release guard around a protocol object.
///
/// [`Handle::release`] sends the destructor the first time and is a no-op
/// afterwards; dropping the guard releases it too. The wrapped object stays
/// borrowable after release so that it can still be compared or logged, but
/// the protocol no longer knows about it.
#[derive(Debug)]
pub struct Handle<T: Destroy> {
    inner: T,
    live: bool,
}

impl<T: Destroy> Handle<T> {
    pub fn new(inner: T) -> Self {
        Self { inner, live: true }
    }

    pub fn get(&self) -> &T {
        &self.inner
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn release(&mut self) {
        if std::mem::replace(&mut self.live, false) {
            self.inner.destroy();
        }
    }
}

impl<T: Destroy> Drop for Handle<T> {
    fn drop(&mut self) {
        self.release();
    }
}
