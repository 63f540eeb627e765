//! # Camera module
//!
//! Owns the single camera handle and turns captured frames into a multipart
//! JPEG stream.
//!
//! The handle lives behind a mutex held only while talking to the device.
//! Conversion and encoding of each frame happen after the lock is released so
//! that several viewers can share the camera.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod encode;
mod params;
mod sim;
mod source;

#[cfg(target_os = "linux")]
mod v4l;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use encode::*;
pub use params::*;
pub use sim::*;
pub use source::*;

#[cfg(target_os = "linux")]
pub use v4l::*;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A started camera.
pub trait CamDevice: Send {
    /// Capture a single frame, blocking until one is available.
    fn capture(&mut self) -> Result<RawFrame, CamError>;

    /// Stop capturing and give up the device.
    fn stop(&mut self);
}

/// Acquires and starts the camera.
pub trait CamOpener: Send + Sync {
    fn open(&self) -> Result<Box<dyn CamDevice>, CamError>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A frame as delivered by the device.
#[derive(Debug, Clone)]
pub enum RawFrame {
    /// Device side compressed frame
    Mjpeg(Vec<u8>),

    /// Packed 8 bit, 3 channel pixels
    Pixels {
        width: u32,
        height: u32,
        order: PixelOrder,
        data: Vec<u8>,
    },
}

/// Channel order of packed pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelOrder {
    Rgb,
    Bgr,
}

#[derive(Debug, thiserror::Error)]
pub enum CamError {
    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Frame of {width}x{height} has {len} bytes of pixel data")]
    BadFrame { width: u32, height: u32, len: usize },

    #[error("Could not convert frame: {0}")]
    Image(#[from] image::ImageError),

    #[error("The camera has been shut down")]
    Closed,
}
