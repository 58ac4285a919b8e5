//! Configuration types for backing regions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, ShmError};

/// Where the anonymous backing file is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackingType {
    /// POSIX shared memory (`shm_open`), unlinked right after creation
    ShmOpen,
    /// Exclusive file inside `dir`, unlinked right after creation
    FileBacked { dir: PathBuf },
    /// Anonymous memory file descriptor (Linux-specific)
    #[cfg(target_os = "linux")]
    MemFd,
}

impl Default for BackingType {
    fn default() -> Self {
        Self::ShmOpen
    }
}

impl BackingType {
    /// Get a human-readable name for the backing type
    pub fn name(&self) -> &'static str {
        match self {
            BackingType::ShmOpen => "shm",
            BackingType::FileBacked { .. } => "file-backed",
            #[cfg(target_os = "linux")]
            BackingType::MemFd => "memfd",
        }
    }
}

/// Configuration for creating a backing region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackingConfig {
    /// Backing strategy
    pub backing_type: BackingType,
    /// Prefix of the generated temporary names
    pub name_prefix: String,
    /// Names tried before giving up on collisions
    pub max_name_attempts: u32,
}

impl Default for BackingConfig {
    fn default() -> Self {
        Self {
            backing_type: BackingType::default(),
            name_prefix: crate::config::DEFAULT_NAME_PREFIX.to_string(),
            max_name_attempts: crate::config::DEFAULT_NAME_ATTEMPTS,
        }
    }
}

impl BackingConfig {
    /// Set the backing type
    pub fn with_backing_type(mut self, backing_type: BackingType) -> Self {
        self.backing_type = backing_type;
        self
    }

    /// Set the prefix used for generated names
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Set how many names are tried before giving up
    pub fn with_max_name_attempts(mut self, attempts: u32) -> Self {
        self.max_name_attempts = attempts;
        self
    }

    /// Validate the configuration.
    ///
    /// The `FileBacked` directory is not checked here; a missing directory
    /// fails file creation with `BackingAllocationFailed`.
    pub fn validate(&self) -> Result<()> {
        if self.max_name_attempts == 0 {
            return Err(ShmError::invalid_parameter(
                "max_name_attempts",
                "At least one attempt is required",
            ));
        }

        let stem = self.name_prefix.strip_prefix('/').unwrap_or(&self.name_prefix);
        if stem.is_empty() {
            return Err(ShmError::invalid_parameter("name_prefix", "Name prefix cannot be empty"));
        }
        if stem.contains('/') || stem.contains('\0') {
            return Err(ShmError::invalid_parameter(
                "name_prefix",
                "Name prefix may only contain a leading '/' and no NUL bytes",
            ));
        }
        if stem.len() > crate::config::MAX_NAME_PREFIX_LEN {
            return Err(ShmError::invalid_parameter(
                "name_prefix",
                format!(
                    "Name prefix is longer than {} bytes",
                    crate::config::MAX_NAME_PREFIX_LEN
                ),
            ));
        }

        Ok(())
    }
}
