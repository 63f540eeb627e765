//! Camera parameters

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CamParams {
    /// Linux video device
    pub device: String,

    pub width: u32,
    pub height: u32,

    /// Capture rate requested from the device.
    ///
    /// Units: frames/second
    pub fps: u32,

    /// Four character pixel format code requested from the device, `MJPG` or `RGB3`.
    pub format: String,

    /// JPEG quality of the streamed frames, 1 to 100.
    pub jpeg_quality: u8,

    /// Delay between two frames of a stream.
    ///
    /// Units: milliseconds
    pub frame_period_ms: u64,

    /// Wait after a failed capture.
    ///
    /// Units: milliseconds
    pub error_backoff_ms: u64,

    /// Wait after a failed initialisation.
    ///
    /// Units: milliseconds
    pub init_retry_ms: u64,
}

impl Default for CamParams {
    fn default() -> Self {
        Self {
            device: "/dev/video0".into(),
            width: 640,
            height: 480,
            fps: 30,
            format: "MJPG".into(),
            jpeg_quality: 85,
            frame_period_ms: 50,
            error_backoff_ms: 1000,
            init_retry_ms: 2000,
        }
    }
}
