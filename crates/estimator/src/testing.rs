use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;

use image::{GrayImage, Luma};

use crate::detector::{FaceDetector, FaceGeometry};
use crate::error::EstimatorError;
use crate::video::VideoDecoder;

/// A face geometry whose ratio is exactly `ratio`.
#[must_use]
pub fn geometry_with_ratio(ratio: f32) -> FaceGeometry {
    FaceGeometry::new(ratio, 1.0)
}

/// Detector that replays scripted per-frame responses.
///
/// Each `detect` call pops the next scripted response; once the script is
/// exhausted the fallback is returned, so `always` behaves like a constant
/// detector.
pub struct ScriptedDetector {
    responses: Mutex<VecDeque<Vec<FaceGeometry>>>,
    fallback: Vec<FaceGeometry>,
}

impl ScriptedDetector {
    /// Report the same single face on every frame.
    #[must_use]
    pub fn always(geometry: FaceGeometry) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: vec![geometry],
        }
    }

    /// Replay one response per `detect` call, then report no faces.
    #[must_use]
    pub fn with_responses(responses: Vec<Vec<FaceGeometry>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback: Vec::new(),
        }
    }
}

impl FaceDetector for ScriptedDetector {
    fn detect(&self, _frame: &GrayImage) -> Result<Vec<FaceGeometry>, EstimatorError> {
        let mut queue = self.responses.lock().expect("scripted responses lock");
        Ok(queue.pop_front().unwrap_or_else(|| self.fallback.clone()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Detector whose backend always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingDetector;

impl FaceDetector for FailingDetector {
    fn detect(&self, _frame: &GrayImage) -> Result<Vec<FaceGeometry>, EstimatorError> {
        Err(EstimatorError::Detector {
            message: "scripted detector failure".to_owned(),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Decoder that returns a fixed frame sequence for any input.
pub struct ScriptedDecoder {
    frames: Vec<GrayImage>,
}

impl ScriptedDecoder {
    #[must_use]
    pub fn new(frames: Vec<GrayImage>) -> Self {
        Self { frames }
    }

    /// Decoder producing zero frames.
    #[must_use]
    pub fn empty() -> Self {
        Self { frames: Vec::new() }
    }
}

impl VideoDecoder for ScriptedDecoder {
    fn decode(&self, _data: &[u8]) -> Result<Vec<GrayImage>, EstimatorError> {
        Ok(self.frames.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A frame of uniform luminance.
#[must_use]
pub fn solid_frame(width: u32, height: u32, luma: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([luma]))
}

/// A dark frame with one centered bright rectangle, the shape the bundled
/// region detector reads as a face box.
#[must_use]
pub fn face_frame(width: u32, height: u32, face_width: u32, face_height: u32) -> GrayImage {
    let mut frame = solid_frame(width, height, 20);
    let left = (width - face_width) / 2;
    let top = (height - face_height) / 2;
    for y in top..top + face_height {
        for x in left..left + face_width {
            frame.put_pixel(x, y, Luma([230]));
        }
    }
    frame
}

/// A dark frame with two separated bright rectangles.
#[must_use]
pub fn multi_face_frame(width: u32, height: u32) -> GrayImage {
    let mut frame = solid_frame(width, height, 20);
    let face_w = width / 5;
    let face_h = height / 4;
    for (left, top) in [(width / 10, height / 4), (width / 2, height / 4)] {
        for y in top..top + face_h {
            for x in left..left + face_w {
                frame.put_pixel(x, y, Luma([230]));
            }
        }
    }
    frame
}

/// A smooth horizontal luminance ramp. No hard edges, so its Laplacian
/// variance is near zero and the blur gate rejects it.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn smooth_gradient_frame(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, _y| {
        Luma([(x * 255 / width.max(2).saturating_sub(1)).min(255) as u8])
    })
}

/// Encode a frame as PNG bytes for feeding through the photo path.
#[must_use]
pub fn encode_png(frame: &GrayImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    frame
        .write_to(&mut buffer, image::ImageFormat::Png)
        .expect("png encoding");
    buffer.into_inner()
}
