//! Buffer geometry and the fixed pixel format

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShmError};

/// Pixel format shared with the compositor.
///
/// Only one 32-bit format is supported; the discriminant is the `wl_shm`
/// format code sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum PixelFormat {
    /// 32-bit ARGB, little-endian in memory (B, G, R, A)
    #[default]
    Argb8888 = 0,
}

impl PixelFormat {
    /// Bytes occupied by one pixel
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Wire code of the format
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Width and height of one buffer, in pixels.
///
/// All derived sizes are byte counts that fit the protocol's signed 32-bit
/// fields once [`Geometry::validate`] has accepted the buffer count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    width: u32,
    height: u32,
}

impl Geometry {
    /// Create a geometry, rejecting zero dimensions
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 {
            return Err(ShmError::invalid_parameter("width", "Width must be greater than 0"));
        }
        if height == 0 {
            return Err(ShmError::invalid_parameter("height", "Height must be greater than 0"));
        }
        Ok(Self { width, height })
    }

    /// Check that `buffer_count` buffers of this geometry fit one pool
    pub fn validate(&self, buffer_count: usize) -> Result<()> {
        if buffer_count == 0 {
            return Err(ShmError::invalid_parameter(
                "buffer_count",
                "At least one buffer is required",
            ));
        }

        let limit = i32::MAX as u64;
        let total = (self.width as u64)
            .checked_mul(PixelFormat::BYTES_PER_PIXEL as u64)
            .and_then(|stride| stride.checked_mul(self.height as u64))
            .and_then(|size| size.checked_mul(buffer_count as u64));

        match total {
            Some(total) if total <= limit => Ok(()),
            _ => Err(ShmError::invalid_parameter(
                "geometry",
                format!(
                    "{}x{} x {} buffer(s) exceeds the {} byte pool limit",
                    self.width, self.height, buffer_count, limit
                ),
            )),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per pixel row
    pub fn stride(&self) -> usize {
        self.width as usize * PixelFormat::BYTES_PER_PIXEL
    }

    /// Bytes occupied by one buffer
    pub fn buffer_size(&self) -> usize {
        self.stride() * self.height as usize
    }

    /// Bytes needed to hold `buffer_count` buffers back to back
    pub fn pool_size(&self, buffer_count: usize) -> usize {
        self.buffer_size() * buffer_count
    }

    /// Byte offset of `slot` within the pool
    pub fn slot_offset(&self, slot: usize) -> usize {
        slot * self.buffer_size()
    }

    /// Byte range of `slot` within the pool
    pub fn slot_range(&self, slot: usize) -> Range<usize> {
        let start = self.slot_offset(slot);
        start..start + self.buffer_size()
    }
}
