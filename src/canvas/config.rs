//! Configuration for a canvas

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    geometry::Geometry,
    memory::{BackingConfig, BackingType},
};

/// Size and backing of a canvas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Width of every buffer in pixels
    pub width: u32,
    /// Height of every buffer in pixels
    pub height: u32,
    /// Number of buffers carved from the pool
    pub buffer_count: usize,
    /// How the backing file is obtained
    pub backing: BackingConfig,
}

impl CanvasConfig {
    /// Create a single-buffer configuration
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffer_count: crate::config::DEFAULT_BUFFER_COUNT,
            backing: BackingConfig::default(),
        }
    }

    /// Set the number of buffers
    pub fn with_buffer_count(mut self, buffer_count: usize) -> Self {
        self.buffer_count = buffer_count;
        self
    }

    /// Set the backing type
    pub fn with_backing_type(mut self, backing_type: BackingType) -> Self {
        self.backing.backing_type = backing_type;
        self
    }

    /// Set the prefix of generated backing names
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.backing.name_prefix = prefix.into();
        self
    }

    /// Set how many names are tried before giving up
    pub fn with_max_name_attempts(mut self, attempts: u32) -> Self {
        self.backing.max_name_attempts = attempts;
        self
    }

    /// Validated geometry of one buffer
    pub fn geometry(&self) -> Result<Geometry> {
        let geometry = Geometry::new(self.width, self.height)?;
        geometry.validate(self.buffer_count)?;
        Ok(geometry)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.geometry()?;
        self.backing.validate()
    }

    /// Total bytes the pool will need, once validated
    pub fn pool_size(&self) -> Result<usize> {
        Ok(self.geometry()?.pool_size(self.buffer_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShmError;

    #[test]
    fn test_config_builder() {
        let config = CanvasConfig::new(64, 32)
            .with_buffer_count(2)
            .with_name_prefix("/builder")
            .with_max_name_attempts(7);

        assert_eq!(config.width, 64);
        assert_eq!(config.height, 32);
        assert_eq!(config.buffer_count, 2);
        assert_eq!(config.backing.name_prefix, "/builder");
        assert_eq!(config.backing.max_name_attempts, 7);
        assert_eq!(config.pool_size().unwrap(), 64 * 4 * 32 * 2);
    }

    #[test]
    fn test_default_buffer_count() {
        assert_eq!(CanvasConfig::new(1, 1).buffer_count, 1);
    }

    #[test]
    fn test_config_validation() {
        assert!(CanvasConfig::new(0, 10).validate().is_err());
        assert!(CanvasConfig::new(10, 10).with_buffer_count(0).validate().is_err());
        assert!(CanvasConfig::new(10, 10).validate().is_ok());

        let err = CanvasConfig::new(65536, 65536).validate().unwrap_err();
        assert!(matches!(err, ShmError::InvalidParameter { .. }));
    }
}
