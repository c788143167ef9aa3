use std::fmt;
use std::sync::Arc;

use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use agegate_core::band::BandTable;
use agegate_core::media::{self, MediaKind};

use crate::detector::FaceDetector;
use crate::error::EstimatorError;
use crate::spoof::{
    laplacian_variance, require_sharpness, require_single_face, SpoofReason, SpoofVerdict,
};
use crate::video::{sampled_indices, VideoDecoder};

/// Tuning for the estimation heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorSettings {
    /// Ratio-to-age policy table.
    #[serde(default)]
    pub bands: BandTable,
    /// Laplacian variance below which a photo is rejected as blurry.
    #[serde(default = "default_blur_threshold")]
    pub blur_threshold: f64,
}

fn default_blur_threshold() -> f64 {
    100.0
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            bands: BandTable::default(),
            blur_threshold: default_blur_threshold(),
        }
    }
}

/// Result of a successful estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    /// Estimated age in years.
    pub age: f32,
    /// Geometry ratio of the scored face. `None` for videos, where
    /// per-frame ratios vary.
    pub ratio: Option<f32>,
    /// Band label the ratio fell in, when a single ratio was scored.
    pub band: Option<String>,
    /// Frames that contributed to the estimate (1 for photos).
    pub frames_used: usize,
}

/// Heuristic age estimator over photos and videos.
///
/// Photos go through the full spoof check (single face, sharpness) before
/// banding. Videos are sampled frame-by-frame; frames without exactly one
/// face are skipped and the per-frame estimates are aggregated by median.
pub struct Estimator {
    detector: Arc<dyn FaceDetector>,
    decoder: Arc<dyn VideoDecoder>,
    settings: EstimatorSettings,
}

impl fmt::Debug for Estimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Estimator")
            .field("detector", &self.detector.name())
            .field("decoder", &self.decoder.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Estimator {
    #[must_use]
    pub fn new(
        detector: Arc<dyn FaceDetector>,
        decoder: Arc<dyn VideoDecoder>,
        settings: EstimatorSettings,
    ) -> Self {
        Self {
            detector,
            decoder,
            settings,
        }
    }

    /// Classify an attachment by filename and estimate from its bytes.
    pub fn estimate_attachment(
        &self,
        filename: &str,
        data: &[u8],
    ) -> Result<Estimate, EstimatorError> {
        match media::classify(filename) {
            Some(kind) => self.estimate(kind, data),
            None => Err(EstimatorError::UnsupportedExtension {
                extension: media::extension_of(filename).unwrap_or_default(),
            }),
        }
    }

    /// Estimate age from already-classified media bytes.
    pub fn estimate(&self, kind: MediaKind, data: &[u8]) -> Result<Estimate, EstimatorError> {
        match kind {
            MediaKind::Photo => self.estimate_photo(data),
            MediaKind::Video => self.estimate_video(data),
        }
    }

    /// Liveness screen over a single photo, without banding.
    ///
    /// The face count alone decides the verdict when it is not exactly one;
    /// the sharpness gate only runs after the count has passed.
    pub fn check_spoof(&self, data: &[u8]) -> Result<SpoofVerdict, EstimatorError> {
        let decoded = image::load_from_memory(data).map_err(|e| {
            EstimatorError::UnreadableMedia {
                reason: e.to_string(),
            }
        })?;
        let frame = decoded.to_luma8();

        let faces = self.detector.detect(&frame)?;
        match faces.as_slice() {
            [_] => {}
            [] => return Ok(SpoofVerdict::rejected(SpoofReason::NoFace)),
            _ => return Ok(SpoofVerdict::rejected(SpoofReason::MultipleFaces)),
        }

        let variance = laplacian_variance(&frame);
        if variance < self.settings.blur_threshold {
            debug!(
                variance,
                threshold = self.settings.blur_threshold,
                "blur spoof verdict"
            );
            return Ok(SpoofVerdict::rejected(SpoofReason::TooBlurry));
        }
        Ok(SpoofVerdict::clean())
    }

    fn estimate_photo(&self, data: &[u8]) -> Result<Estimate, EstimatorError> {
        let decoded = image::load_from_memory(data).map_err(|e| {
            EstimatorError::UnreadableMedia {
                reason: e.to_string(),
            }
        })?;
        let frame = decoded.to_luma8();

        let faces = self.detector.detect(&frame)?;
        // Face count is checked before sharpness: zero or several faces is a
        // spoof signal regardless of how crisp the capture is.
        let face = require_single_face(&faces)?;
        let variance = require_sharpness(&frame, self.settings.blur_threshold)?;

        let ratio = face.ratio().ok_or_else(|| EstimatorError::FeatureExtraction {
            reason: "degenerate facial geometry".to_owned(),
        })?;
        let age = self.settings.bands.age_for_ratio(ratio);
        let band = self.settings.bands.band_label(ratio).map(str::to_owned);

        debug!(
            detector = self.detector.name(),
            ratio,
            age,
            variance,
            band = band.as_deref().unwrap_or("default"),
            "photo estimate"
        );

        Ok(Estimate {
            age,
            ratio: Some(ratio),
            band,
            frames_used: 1,
        })
    }

    fn estimate_video(&self, data: &[u8]) -> Result<Estimate, EstimatorError> {
        let frames = self.decoder.decode(data)?;
        if frames.is_empty() {
            return Err(EstimatorError::UnreadableMedia {
                reason: "container produced no frames".to_owned(),
            });
        }

        let mut ages = Vec::new();
        for index in sampled_indices(frames.len()) {
            match self.frame_age(&frames[index])? {
                Some(age) => ages.push(age),
                None => debug!(index, "skipping frame without exactly one face"),
            }
        }

        if ages.is_empty() {
            return Err(EstimatorError::NoFace);
        }

        let frames_used = ages.len();
        let age = median(&mut ages);

        debug!(
            detector = self.detector.name(),
            decoder = self.decoder.name(),
            frames_decoded = frames.len(),
            frames_used,
            age,
            "video estimate"
        );

        Ok(Estimate {
            age,
            ratio: None,
            band: None,
            frames_used,
        })
    }

    /// Age for one sampled frame, or `None` when the frame should be
    /// skipped because it does not show exactly one scoreable face.
    fn frame_age(&self, frame: &GrayImage) -> Result<Option<f32>, EstimatorError> {
        let faces = self.detector.detect(frame)?;
        let [face] = faces.as_slice() else {
            return Ok(None);
        };
        Ok(face.ratio().map(|r| self.settings.bands.age_for_ratio(r)))
    }
}

/// Median of the collected ages. Even counts average the middle pair.
fn median(ages: &mut [f32]) -> f32 {
    ages.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = ages.len() / 2;
    if ages.len() % 2 == 1 {
        ages[mid]
    } else {
        (ages[mid - 1] + ages[mid]) / 2.0
    }
}
