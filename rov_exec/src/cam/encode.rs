//! Frame conversion and multipart framing

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::{imageops, DynamicImage, ImageOutputFormat, RgbImage};

use super::{CamError, PixelOrder, RawFrame};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Boundary separating the parts of the video stream.
pub const FRAME_BOUNDARY: &str = "frame";

/// Content type of the video stream response.
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a raw frame to RGB, rotate it by 180 degrees (the camera is mounted
/// upside down) and encode it as a JPEG.
pub fn encode_frame(raw: RawFrame, jpeg_quality: u8) -> Result<Vec<u8>, CamError> {
    let rgb = to_rgb(raw)?;
    let rotated = imageops::rotate180(&rgb);

    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(rotated)
        .write_to(&mut jpeg, ImageOutputFormat::Jpeg(jpeg_quality.clamp(1, 100)))?;

    Ok(jpeg)
}

/// Wrap a JPEG as one part of the multipart stream.
pub fn multipart_part(jpeg: &[u8]) -> Vec<u8> {
    let header = format!("--{}\r\nContent-Type: image/jpeg\r\n\r\n", FRAME_BOUNDARY);

    let mut part = Vec::with_capacity(header.len() + jpeg.len() + 2);
    part.extend_from_slice(header.as_bytes());
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    part
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn to_rgb(raw: RawFrame) -> Result<RgbImage, CamError> {
    match raw {
        RawFrame::Mjpeg(data) => {
            Ok(image::load_from_memory_with_format(&data, image::ImageFormat::Jpeg)?.to_rgb8())
        }
        RawFrame::Pixels {
            width,
            height,
            order,
            mut data,
        } => {
            let len = data.len();

            if order == PixelOrder::Bgr {
                for px in data.chunks_exact_mut(3) {
                    px.swap(0, 2);
                }
            }

            RgbImage::from_raw(width, height, data).ok_or(CamError::BadFrame { width, height, len })
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
