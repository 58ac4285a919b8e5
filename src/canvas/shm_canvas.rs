//! Pool of pixel buffers backed by one anonymous shared mapping

use std::{fmt, os::fd::AsFd};

use log::{debug, warn};

use crate::{
    connection::{BufferLayout, Handle, ShmConnection, ShmPool},
    error::{Result, ShmError},
    geometry::{Geometry, PixelFormat},
    memory::{BackingRegion, Namespace},
};

use super::config::CanvasConfig;

/// Fixed-size pixel buffers sharing one compositor pool.
///
/// Construction maps the backing file, registers it as a pool and carves
/// `buffer_count` buffers from it, slot `i` starting at
/// `i * stride * height`. Either all of that succeeds or everything acquired
/// so far is released before the error is returned.
///
/// Dropping the canvas destroys the buffers, then the pool, then unmaps and
/// closes the backing file.
///
/// # Example
///
/// ```rust,ignore
/// let config = CanvasConfig::new(640, 480).with_buffer_count(2);
/// let mut canvas = ShmCanvas::new(&connection, &config)?;
///
/// // Paint the back buffer and hand it to the surface
/// canvas.slot_pixels_mut(1).unwrap().fill(0xff20_2020);
/// surface.attach(Some(canvas.buffer_at(1).unwrap()), 0, 0);
/// ```
pub struct ShmCanvas<P: ShmPool> {
    /// One handle per slot, in slot order
    buffers: Vec<Handle<P::Buffer>>,
    pool: Handle<P>,
    backing: BackingRegion,
    geometry: Geometry,
}

impl<P: ShmPool> ShmCanvas<P> {
    /// Create a canvas with the backing described by `config`
    pub fn new<C>(connection: &C, config: &CanvasConfig) -> Result<Self>
    where
        C: ShmConnection<Pool = P>,
    {
        let geometry = config.geometry()?;
        let backing = BackingRegion::create(&config.backing, geometry.pool_size(config.buffer_count))?;
        Self::from_backing(connection, geometry, config.buffer_count, backing)
    }

    /// Create a canvas whose backing file is named inside `namespace`
    pub fn with_namespace<C>(
        connection: &C,
        config: &CanvasConfig,
        namespace: &dyn Namespace,
    ) -> Result<Self>
    where
        C: ShmConnection<Pool = P>,
    {
        let geometry = config.geometry()?;
        let backing = BackingRegion::create_in(
            namespace,
            &config.backing,
            geometry.pool_size(config.buffer_count),
        )?;
        Self::from_backing(connection, geometry, config.buffer_count, backing)
    }

    // Locals drop before the moved-in `backing`, so a failure releases the
    // buffers, then the pool, then the mapping.
    fn from_backing<C>(
        connection: &C,
        geometry: Geometry,
        buffer_count: usize,
        backing: BackingRegion,
    ) -> Result<Self>
    where
        C: ShmConnection<Pool = P>,
    {
        let pool_size = backing.len();
        let pool = connection
            .create_pool(backing.as_fd(), wire(pool_size, "pool_size")?)
            .map_err(|e| {
                warn!("Compositor refused a {} byte pool: {}", pool_size, e);
                ShmError::pool_registration(pool_size, e)
            })?;
        let pool = Handle::new(pool);
        debug!("Registered {} byte pool", pool_size);

        let buffers = slice_buffers(pool.get(), &geometry, buffer_count)?;
        debug!(
            "Sliced {} {}x{} buffer(s) from the pool",
            buffer_count,
            geometry.width(),
            geometry.height()
        );

        Ok(Self {
            buffers,
            pool,
            backing,
            geometry,
        })
    }

    /// Pointer to byte `offset` of the mapping.
    ///
    /// Pass `slot * stride * height` to address a slot. The offset is only
    /// checked in debug builds; it must stay below [`ShmCanvas::pool_size`].
    /// Writes through the pointer race with the compositor if the buffer they
    /// land in is currently attached.
    pub fn get_data(&self, offset: usize) -> *mut u8 {
        debug_assert!(
            offset < self.pool_size(),
            "offset {} outside {} byte pool",
            offset,
            self.pool_size()
        );
        self.backing.as_mut_ptr().wrapping_add(offset)
    }

    /// Byte offset of `slot`, or `None` past the last slot
    pub fn slot_offset(&self, slot: usize) -> Option<usize> {
        (slot < self.buffer_count()).then(|| self.geometry.slot_offset(slot))
    }

    /// Bytes of `slot`
    pub fn slot_bytes(&self, slot: usize) -> Option<&[u8]> {
        if slot >= self.buffer_count() {
            return None;
        }
        self.backing.as_slice().get(self.geometry.slot_range(slot))
    }

    /// Writable bytes of `slot`
    pub fn slot_bytes_mut(&mut self, slot: usize) -> Option<&mut [u8]> {
        if slot >= self.buffer_count() {
            return None;
        }
        let range = self.geometry.slot_range(slot);
        self.backing.as_mut_slice().get_mut(range)
    }

    /// Writable pixels of `slot`, row by row, `width` pixels per row
    pub fn slot_pixels_mut(&mut self, slot: usize) -> Option<&mut [u32]> {
        let bytes = self.slot_bytes_mut(slot)?;
        let ptr = bytes.as_mut_ptr();
        debug_assert_eq!(ptr.align_offset(std::mem::align_of::<u32>()), 0);

        // SAFETY: the mapping is page aligned and every slot starts at a
        // multiple of the 4-byte pixel size, so `ptr` is aligned for u32.
        // The length covers exactly the bytes borrowed above.
        Some(unsafe {
            std::slice::from_raw_parts_mut(
                ptr.cast::<u32>(),
                bytes.len() / PixelFormat::BYTES_PER_PIXEL,
            )
        })
    }

    /// Buffer of slot 0
    pub fn buffer(&self) -> &P::Buffer {
        self.buffers[0].get()
    }

    /// Buffer of `slot`
    pub fn buffer_at(&self, slot: usize) -> Option<&P::Buffer> {
        self.buffers.get(slot).map(Handle::get)
    }

    /// All buffers in slot order
    pub fn buffers(&self) -> impl Iterator<Item = &P::Buffer> + '_ {
        self.buffers.iter().map(Handle::get)
    }

    pub fn pool(&self) -> &P {
        self.pool.get()
    }

    pub fn backing(&self) -> &BackingRegion {
        &self.backing
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn width(&self) -> u32 {
        self.geometry.width()
    }

    pub fn height(&self) -> u32 {
        self.geometry.height()
    }

    /// Bytes per pixel row
    pub fn stride(&self) -> usize {
        self.geometry.stride()
    }

    /// Size of the whole mapping
    pub fn pool_size(&self) -> usize {
        self.backing.len()
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn format(&self) -> PixelFormat {
        PixelFormat::Argb8888
    }
}

impl<P: ShmPool> fmt::Debug for ShmCanvas<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShmCanvas")
            .field("geometry", &self.geometry)
            .field("buffer_count", &self.buffers.len())
            .field("live_buffers", &self.buffers.iter().filter(|b| b.is_live()).count())
            .field("pool_live", &self.pool.is_live())
            .field("backing", &self.backing)
            .finish()
    }
}

impl<P: ShmPool> Drop for ShmCanvas<P> {
    fn drop(&mut self) {
        for buffer in &mut self.buffers {
            buffer.release();
        }
        self.pool.release();
        debug!("Released canvas pool of {} bytes", self.backing.len());
    }
}

/// Carve one buffer per slot. A failure drops the slots created so far.
fn slice_buffers<P: ShmPool>(
    pool: &P,
    geometry: &Geometry,
    buffer_count: usize,
) -> Result<Vec<Handle<P::Buffer>>> {
    let mut buffers = Vec::with_capacity(buffer_count);

    for slot in 0..buffer_count {
        let layout = BufferLayout {
            offset: wire(geometry.slot_offset(slot), "offset")?,
            width: wire(geometry.width() as usize, "width")?,
            height: wire(geometry.height() as usize, "height")?,
            stride: wire(geometry.stride(), "stride")?,
            format: PixelFormat::Argb8888,
        };

        let buffer = pool.create_buffer(&layout).map_err(|e| {
            warn!("Pool refused buffer for slot {}: {}", slot, e);
            ShmError::buffer_slice(slot, e)
        })?;
        buffers.push(Handle::new(buffer));
    }

    Ok(buffers)
}

/// Narrow a size to the protocol's signed 32-bit field.
///
/// `Geometry::validate` keeps every value in range; a miss is still reported
/// rather than sent truncated.
fn wire(value: usize, field: &'static str) -> Result<i32> {
    debug_assert!(
        value <= i32::MAX as usize,
        "{} of {} escaped geometry validation",
        field,
        value
    );
    i32::try_from(value).map_err(|_| {
        ShmError::invalid_parameter(field, format!("{} does not fit a wire integer", value))
    })
}
