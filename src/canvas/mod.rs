//! Buffer slicing and pixel access over a registered pool

pub mod config;
pub mod shm_canvas;

pub use config::CanvasConfig;
pub use shm_canvas::ShmCanvas;
