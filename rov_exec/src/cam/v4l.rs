//! V4L2 camera access

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use rscam::{Camera, Config};

use super::{CamDevice, CamError, CamOpener, CamParams, PixelOrder, RawFrame};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Opens a V4L2 device with a fixed preview configuration.
#[derive(Debug, Clone)]
pub struct V4lOpener {
    device: String,
    resolution: (u32, u32),
    fps: u32,
    format: [u8; 4],
}

struct V4lCamera {
    camera: Camera,
    format: [u8; 4],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl V4lOpener {
    /// Supported formats are `MJPG`, `RGB3` and `BGR3`.
    pub fn new(params: &CamParams) -> Result<Self, CamError> {
        let format = match params.format.as_str() {
            "MJPG" => *b"MJPG",
            "RGB3" => *b"RGB3",
            "BGR3" => *b"BGR3",
            f => return Err(CamError::Unavailable(format!("unsupported pixel format {:?}", f))),
        };

        Ok(Self {
            device: params.device.clone(),
            resolution: (params.width, params.height),
            fps: params.fps.max(1),
            format,
        })
    }
}

impl CamOpener for V4lOpener {
    fn open(&self) -> Result<Box<dyn CamDevice>, CamError> {
        let unavailable = |e: &dyn std::fmt::Display| {
            CamError::Unavailable(format!("{}: {}", self.device, e))
        };

        let mut camera = Camera::new(&self.device).map_err(|e| unavailable(&e))?;

        camera
            .start(&Config {
                interval: (1, self.fps),
                resolution: self.resolution,
                format: &self.format,
                ..Default::default()
            })
            .map_err(|e| unavailable(&e))?;

        Ok(Box::new(V4lCamera {
            camera,
            format: self.format,
        }))
    }
}

impl CamDevice for V4lCamera {
    fn capture(&mut self) -> Result<RawFrame, CamError> {
        let frame = self
            .camera
            .capture()
            .map_err(|e| CamError::Capture(e.to_string()))?;

        let (width, height) = frame.resolution;
        let data = frame.to_vec();

        Ok(match &self.format {
            b"MJPG" => RawFrame::Mjpeg(data),
            b"BGR3" => RawFrame::Pixels {
                width,
                height,
                order: PixelOrder::Bgr,
                data,
            },
            _ => RawFrame::Pixels {
                width,
                height,
                order: PixelOrder::Rgb,
                data,
            },
        })
    }

    fn stop(&mut self) {
        if let Err(e) = self.camera.stop() {
            warn!("Could not stop camera: {}", e);
        }
    }
}
