//! # shmcanvas - Shared-Memory Frame Buffers for `wl_shm` Clients
//!
//! shmcanvas allocates the pixel buffers a compositor client paints into and
//! hands to the compositor. All buffers of a canvas live in one anonymous,
//! file-descriptor-backed mapping that is registered with the compositor as a
//! single shared-memory pool.
//!
//! ## Features
//!
//! - **Anonymous backing**: POSIX shm, directory-backed or memfd files, unlinked
//!   as soon as they are created
//! - **All-or-nothing construction**: any failure releases what was acquired
//! - **Ordered teardown**: buffers, then pool, then mapping, then descriptor
//! - **Injected connection**: the compositor is reached only through
//!   [`ShmConnection`] / [`ShmPool`], so the core runs against fakes in tests
//! - **`wayland` feature**: adapter for `wayland-client`
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────── pool_size = stride × height × N ─────────────────┐
//! │  slot 0            │  slot 1            │ ... │  slot N-1                │
//! │  offset 0          │  stride × height   │     │  (N-1) × stride × height │
//! └──────────────────────────────────────────────────────────────────────────┘
//!          ▲ one wl_buffer per slot, all carved from one wl_shm_pool
//! ```

pub mod canvas;
pub mod connection;
pub mod error;
pub mod geometry;
pub mod memory;

#[cfg(feature = "wayland")]
pub mod wayland;

// Main API re-exports
pub use canvas::{CanvasConfig, ShmCanvas};
pub use connection::{BufferLayout, Destroy, Handle, ProtocolError, ShmConnection, ShmPool};
pub use error::{Result, ShmError};
pub use geometry::{Geometry, PixelFormat};
pub use memory::{BackingConfig, BackingRegion, BackingType, Directory, Namespace, PosixShm};

#[cfg(feature = "wayland")]
pub use wayland::{WaylandPool, WaylandShm};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration constants
pub mod config {
    /// Buffers per canvas unless configured otherwise
    pub const DEFAULT_BUFFER_COUNT: usize = 1;

    /// Prefix of generated backing file names
    pub const DEFAULT_NAME_PREFIX: &str = "/shmcanvas";

    /// Names tried before giving up on collisions
    pub const DEFAULT_NAME_ATTEMPTS: u32 = 100;

    /// Longest accepted name prefix, leaving room for the generated suffix
    /// under `NAME_MAX`
    pub const MAX_NAME_PREFIX_LEN: usize = 200;
}
