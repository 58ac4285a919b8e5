//! Anonymous shared-memory backing for pixel pools

pub mod config;
pub mod namespace;
pub mod regions;

pub use config::{BackingConfig, BackingType};
pub use namespace::{Directory, Namespace, PosixShm};
pub use regions::BackingRegion;
