use std::fmt;

use image::GrayImage;

use crate::detector::FaceGeometry;
use crate::error::EstimatorError;

/// Why a capture was judged non-live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoofReason {
    /// No face was detected.
    NoFace,
    /// More than one face was detected.
    MultipleFaces,
    /// Blur variance fell below the liveness threshold.
    TooBlurry,
}

impl SpoofReason {
    /// User-presentable reason text.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoFace => "no face detected",
            Self::MultipleFaces => "more than one face detected",
            Self::TooBlurry => "image too blurry",
        }
    }
}

impl fmt::Display for SpoofReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the liveness screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpoofVerdict {
    /// Whether the capture should be treated as non-live.
    pub spoof: bool,
    /// What triggered the rejection, when one did.
    pub reason: Option<SpoofReason>,
}

impl SpoofVerdict {
    /// A capture that passed the screen.
    #[must_use]
    pub fn clean() -> Self {
        Self {
            spoof: false,
            reason: None,
        }
    }

    /// A capture rejected for the given reason.
    #[must_use]
    pub fn rejected(reason: SpoofReason) -> Self {
        Self {
            spoof: true,
            reason: Some(reason),
        }
    }
}

/// Variance of the 3x3 Laplacian response over the frame interior.
///
/// A crisp capture produces strong responses at edges and a large variance;
/// re-captured screens and prints come out flat. Frames smaller than 3x3
/// have no interior and score 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn laplacian_variance(frame: &GrayImage) -> f64 {
    let (width, height) = frame.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let luma = |x: u32, y: u32| f64::from(frame.get_pixel(x, y).0[0]);

    let mut count: u64 = 0;
    let mut sum = 0.0_f64;
    let mut sum_sq = 0.0_f64;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let response = 4.0 * luma(x, y)
                - luma(x - 1, y)
                - luma(x + 1, y)
                - luma(x, y - 1)
                - luma(x, y + 1);
            count += 1;
            sum += response;
            sum_sq += response * response;
        }
    }

    let n = count as f64;
    let mean = sum / n;
    (sum_sq / n) - mean * mean
}

/// The face-count half of the spoof check.
///
/// Exactly one face must be present; zero or several reject the submission
/// no matter how sharp the capture is.
pub fn require_single_face(faces: &[FaceGeometry]) -> Result<FaceGeometry, EstimatorError> {
    match faces {
        [] => Err(EstimatorError::NoFace),
        [only] => Ok(*only),
        many => Err(EstimatorError::MultipleFaces { count: many.len() }),
    }
}

/// The sharpness half of the spoof check. Returns the measured variance.
pub fn require_sharpness(frame: &GrayImage, threshold: f64) -> Result<f64, EstimatorError> {
    let variance = laplacian_variance(frame);
    if variance < threshold {
        return Err(EstimatorError::TooBlurry {
            variance,
            threshold,
        });
    }
    Ok(variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{face_frame, smooth_gradient_frame, solid_frame};

    #[test]
    fn uniform_frame_has_zero_variance() {
        let frame = solid_frame(64, 64, 100);
        assert!(laplacian_variance(&frame).abs() < 1e-9);
    }

    #[test]
    fn smooth_gradient_scores_near_zero() {
        let frame = smooth_gradient_frame(256, 64);
        assert!(laplacian_variance(&frame) < 100.0);
    }

    #[test]
    fn crisp_edges_score_high() {
        let frame = face_frame(256, 256, 80, 100);
        assert!(laplacian_variance(&frame) > 100.0);
    }

    #[test]
    fn tiny_frame_scores_zero() {
        let frame = solid_frame(2, 2, 255);
        assert!(laplacian_variance(&frame).abs() < 1e-9);
    }

    #[test]
    fn single_face_passes() {
        let faces = vec![FaceGeometry::new(0.8, 1.0)];
        assert!(require_single_face(&faces).is_ok());
    }

    #[test]
    fn zero_faces_rejected() {
        assert!(matches!(
            require_single_face(&[]),
            Err(EstimatorError::NoFace)
        ));
    }

    #[test]
    fn several_faces_rejected() {
        let faces = vec![FaceGeometry::new(0.8, 1.0), FaceGeometry::new(0.9, 1.0)];
        assert!(matches!(
            require_single_face(&faces),
            Err(EstimatorError::MultipleFaces { count: 2 })
        ));
    }

    #[test]
    fn blur_gate_reports_measured_variance() {
        let frame = solid_frame(64, 64, 100);
        match require_sharpness(&frame, 100.0) {
            Err(EstimatorError::TooBlurry { variance, threshold }) => {
                assert!(variance.abs() < 1e-9);
                assert!((threshold - 100.0).abs() < 1e-9);
            }
            other => panic!("expected TooBlurry, got {other:?}"),
        }
    }

    #[test]
    fn sharp_frame_passes_blur_gate() {
        let frame = face_frame(256, 256, 80, 100);
        assert!(require_sharpness(&frame, 100.0).is_ok());
    }

    #[test]
    fn verdict_constructors() {
        let clean = SpoofVerdict::clean();
        assert!(!clean.spoof);
        assert!(clean.reason.is_none());

        let rejected = SpoofVerdict::rejected(SpoofReason::NoFace);
        assert!(rejected.spoof);
        assert_eq!(rejected.reason, Some(SpoofReason::NoFace));
    }

    #[test]
    fn reason_text_is_user_presentable() {
        assert_eq!(SpoofReason::NoFace.to_string(), "no face detected");
        assert_eq!(
            SpoofReason::MultipleFaces.to_string(),
            "more than one face detected"
        );
        assert_eq!(SpoofReason::TooBlurry.to_string(), "image too blurry");
    }
}
