use image::GrayImage;

use crate::error::EstimatorError;

/// Every Nth decoded frame is examined.
pub const FRAME_STRIDE: usize = 5;

/// At most this many sampled frames are examined per video.
pub const MAX_SAMPLED_FRAMES: usize = 30;

/// Decodes a video container into grayscale frames.
///
/// Implementations must be `Send + Sync`. Decoding is in-memory and
/// synchronous; submissions are size-capped upstream.
pub trait VideoDecoder: Send + Sync {
    /// Decode a container into frames in presentation order.
    fn decode(&self, data: &[u8]) -> Result<Vec<GrayImage>, EstimatorError>;

    /// Short identifier used in logs.
    fn name(&self) -> &str;
}

/// Indices of the frames the estimator examines.
pub fn sampled_indices(frame_count: usize) -> impl Iterator<Item = usize> {
    (0..frame_count)
        .step_by(FRAME_STRIDE)
        .take(MAX_SAMPLED_FRAMES)
}

/// Decoder for builds without video codec support.
///
/// Rejects every container as unreadable so video submissions degrade to a
/// clear user-facing rejection instead of a crash or a silent accept.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullVideoDecoder;

impl NullVideoDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl VideoDecoder for NullVideoDecoder {
    fn decode(&self, _data: &[u8]) -> Result<Vec<GrayImage>, EstimatorError> {
        Err(EstimatorError::UnreadableMedia {
            reason: "video decoding is not available in this build".to_owned(),
        })
    }

    fn name(&self) -> &str {
        "null"
    }
}
