//! `wl_shm` adapter for `wayland-client`
//!
//! Lets a [`ShmCanvas`](crate::ShmCanvas) be built straight from the
//! `wl_shm` global bound by the application's registry handler:
//!
//! ```rust,ignore
//! let connection = WaylandShm::new(state.shm.clone(), qh.clone());
//! let canvas = ShmCanvas::new(&connection, &CanvasConfig::new(w, h).with_buffer_count(2))?;
//! surface.attach(Some(canvas.buffer()), 0, 0);
//! surface.commit();
//! ```
//!
//! The application state `D` must dispatch `wl_shm_pool` and `wl_buffer`
//! events with `()` user data; `wl_buffer.release` is how it learns that a
//! slot may be painted again.

use std::os::fd::BorrowedFd;

use wayland_client::{
    protocol::{
        wl_buffer::WlBuffer,
        wl_shm::{self, WlShm},
        wl_shm_pool::WlShmPool,
    },
    Dispatch, Proxy, QueueHandle,
};

use crate::{
    connection::{BufferLayout, Destroy, ProtocolError, ShmConnection, ShmPool},
    geometry::PixelFormat,
};

/// A bound `wl_shm` global and the queue its objects are dispatched on
pub struct WaylandShm<D> {
    shm: WlShm,
    qh: QueueHandle<D>,
}

impl<D> WaylandShm<D> {
    pub fn new(shm: WlShm, qh: QueueHandle<D>) -> Self {
        Self { shm, qh }
    }

    pub fn shm(&self) -> &WlShm {
        &self.shm
    }
}

impl<D> ShmConnection for WaylandShm<D>
where
    D: Dispatch<WlShmPool, ()> + Dispatch<WlBuffer, ()> + 'static,
{
    type Pool = WaylandPool<D>;

    fn create_pool(&self, fd: BorrowedFd<'_>, size: i32) -> Result<Self::Pool, ProtocolError> {
        if !self.shm.is_alive() {
            return Err(ProtocolError::new("wl_shm global is no longer alive"));
        }

        let pool = self.shm.create_pool(fd, size, &self.qh, ());
        Ok(WaylandPool {
            pool,
            qh: self.qh.clone(),
        })
    }
}

/// A `wl_shm_pool` plus the queue its buffers are dispatched on
pub struct WaylandPool<D> {
    pool: WlShmPool,
    qh: QueueHandle<D>,
}

impl<D> WaylandPool<D> {
    pub fn proxy(&self) -> &WlShmPool {
        &self.pool
    }
}

impl<D> ShmPool for WaylandPool<D>
where
    D: Dispatch<WlBuffer, ()> + 'static,
{
    type Buffer = WlBuffer;

    fn create_buffer(&self, layout: &BufferLayout) -> Result<WlBuffer, ProtocolError> {
        if !self.pool.is_alive() {
            return Err(ProtocolError::new("wl_shm_pool is no longer alive"));
        }

        Ok(self.pool.create_buffer(
            layout.offset,
            layout.width,
            layout.height,
            layout.stride,
            wire_format(layout.format),
            &self.qh,
            (),
        ))
    }
}

impl<D> Destroy for WaylandPool<D> {
    fn destroy(&mut self) {
        self.pool.destroy();
    }
}

impl Destroy for WlBuffer {
    fn destroy(&mut self) {
        WlBuffer::destroy(self);
    }
}

fn wire_format(format: PixelFormat) -> wl_shm::Format {
    match format {
        PixelFormat::Argb8888 => wl_shm::Format::Argb8888,
    }
}
