use image::GrayImage;

use crate::error::EstimatorError;

/// Fraction of a detected face-box width taken as the inter-eye span.
const EYE_SPAN_FRACTION: f32 = 0.42;

/// Fraction of a detected face-box height taken as the nose-to-chin span.
const LOWER_FACE_FRACTION: f32 = 0.42;

/// Landmark distances measured on one detected face, in pixels.
///
/// The banding tables operate on the `inter_eye / nose_to_chin` ratio, so
/// detectors only need to report these two spans however they obtain them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceGeometry {
    /// Distance between the eye centers.
    pub inter_eye: f32,
    /// Distance from the nose tip to the chin.
    pub nose_to_chin: f32,
}

impl FaceGeometry {
    #[must_use]
    pub fn new(inter_eye: f32, nose_to_chin: f32) -> Self {
        Self {
            inter_eye,
            nose_to_chin,
        }
    }

    /// The ratio fed to the band table.
    ///
    /// Returns `None` for degenerate geometry (non-finite or non-positive
    /// spans), which callers treat as a feature-extraction failure.
    #[must_use]
    pub fn ratio(&self) -> Option<f32> {
        if !self.inter_eye.is_finite() || !self.nose_to_chin.is_finite() {
            return None;
        }
        if self.inter_eye <= 0.0 || self.nose_to_chin <= 0.0 {
            return None;
        }
        Some(self.inter_eye / self.nose_to_chin)
    }
}

/// Finds faces in a grayscale frame.
///
/// Implementations must be `Send + Sync`; the pipeline shares one detector
/// across concurrent submissions.
pub trait FaceDetector: Send + Sync {
    /// Detect all faces in a frame. An empty result means no face was found;
    /// errors are reserved for backend failures.
    fn detect(&self, frame: &GrayImage) -> Result<Vec<FaceGeometry>, EstimatorError>;

    /// Short identifier used in logs.
    fn name(&self) -> &str;
}

/// Bundled detector with no native dependencies.
///
/// Binarizes the frame by luminance and flood-fills bright connected
/// regions, treating each plausibly face-sized region as one face. Landmark
/// spans are synthesized from the region box with fixed facial-proportion
/// fractions, so the geometry ratio reduces to the box aspect ratio the
/// band thresholds were tuned against. Deliberately coarse: it exists so
/// the pipeline runs end to end without a native vision stack, not to be
/// accurate.
#[derive(Debug, Clone)]
pub struct RegionDetector {
    /// Luminance at or above which a pixel is considered foreground.
    luma_threshold: u8,
    /// Smallest region size accepted, as a fraction of the frame area.
    min_region_fraction: f64,
    /// Largest region size accepted, as a fraction of the frame area.
    max_region_fraction: f64,
}

impl RegionDetector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            luma_threshold: 128,
            min_region_fraction: 0.02,
            max_region_fraction: 0.80,
        }
    }

    /// Override the foreground luminance threshold.
    #[must_use]
    pub fn with_luma_threshold(mut self, threshold: u8) -> Self {
        self.luma_threshold = threshold;
        self
    }

    #[allow(clippy::cast_precision_loss)]
    fn regions(&self, frame: &GrayImage) -> Vec<FaceGeometry> {
        let (width, height) = frame.dimensions();
        let total = u64::from(width) * u64::from(height);
        if total == 0 {
            return Vec::new();
        }

        let w = width as usize;
        let h = height as usize;
        let mut visited = vec![false; w * h];
        let mut faces = Vec::new();

        for start_y in 0..h {
            for start_x in 0..w {
                if visited[start_y * w + start_x] {
                    continue;
                }
                #[allow(clippy::cast_possible_truncation)]
                let bright =
                    frame.get_pixel(start_x as u32, start_y as u32).0[0] >= self.luma_threshold;
                visited[start_y * w + start_x] = true;
                if !bright {
                    continue;
                }

                // Iterative flood fill over 4-connected bright pixels.
                let mut stack = vec![(start_x, start_y)];
                let mut pixels: u64 = 0;
                let (mut min_x, mut max_x) = (start_x, start_x);
                let (mut min_y, mut max_y) = (start_y, start_y);

                while let Some((x, y)) = stack.pop() {
                    pixels += 1;
                    min_x = min_x.min(x);
                    max_x = max_x.max(x);
                    min_y = min_y.min(y);
                    max_y = max_y.max(y);

                    let mut push = |nx: usize, ny: usize| {
                        let idx = ny * w + nx;
                        if !visited[idx] {
                            visited[idx] = true;
                            #[allow(clippy::cast_possible_truncation)]
                            if frame.get_pixel(nx as u32, ny as u32).0[0] >= self.luma_threshold {
                                stack.push((nx, ny));
                            }
                        }
                    };

                    if x > 0 {
                        push(x - 1, y);
                    }
                    if x + 1 < w {
                        push(x + 1, y);
                    }
                    if y > 0 {
                        push(x, y - 1);
                    }
                    if y + 1 < h {
                        push(x, y + 1);
                    }
                }

                let fraction = pixels as f64 / total as f64;
                if fraction < self.min_region_fraction || fraction > self.max_region_fraction {
                    continue;
                }

                let box_w = (max_x - min_x + 1) as f32;
                let box_h = (max_y - min_y + 1) as f32;
                faces.push(FaceGeometry::new(
                    EYE_SPAN_FRACTION * box_w,
                    LOWER_FACE_FRACTION * box_h,
                ));
            }
        }

        faces
    }
}

impl Default for RegionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceDetector for RegionDetector {
    fn detect(&self, frame: &GrayImage) -> Result<Vec<FaceGeometry>, EstimatorError> {
        Ok(self.regions(frame))
    }

    fn name(&self) -> &str {
        "region"
    }
}
