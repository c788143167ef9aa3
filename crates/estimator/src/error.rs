use thiserror::Error;

use agegate_core::media::allowed_extensions_label;

/// Errors from media estimation.
///
/// Media rejections (`is_media_rejection`) are expected outcomes of the
/// intake flow and are surfaced to the submitter via [`user_reason`];
/// the remaining variants indicate the heuristic itself failed.
///
/// [`user_reason`]: EstimatorError::user_reason
#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("unsupported media extension: {extension:?}")]
    UnsupportedExtension { extension: String },

    #[error("media could not be decoded: {reason}")]
    UnreadableMedia { reason: String },

    #[error("no face detected")]
    NoFace,

    #[error("expected one face, found {count}")]
    MultipleFaces { count: usize },

    #[error("image too blurry: variance {variance:.1} below threshold {threshold:.1}")]
    TooBlurry { variance: f64, threshold: f64 },

    #[error("feature extraction failed: {reason}")]
    FeatureExtraction { reason: String },

    #[error("detector error: {message}")]
    Detector { message: String },
}

impl EstimatorError {
    /// Whether this is an expected rejection of the submitted media, as
    /// opposed to a failure of the estimation machinery.
    #[must_use]
    pub fn is_media_rejection(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedExtension { .. }
                | Self::UnreadableMedia { .. }
                | Self::NoFace
                | Self::MultipleFaces { .. }
                | Self::TooBlurry { .. }
        )
    }

    /// Plain-text reason suitable for showing to the submitting user.
    ///
    /// Never exposes internal thresholds or detector internals.
    #[must_use]
    pub fn user_reason(&self) -> String {
        match self {
            Self::UnsupportedExtension { extension } => {
                let label = allowed_extensions_label();
                if extension.is_empty() {
                    format!("That file type is not supported. Accepted types: {label}.")
                } else {
                    format!("Files of type '{extension}' are not supported. Accepted types: {label}.")
                }
            }
            Self::UnreadableMedia { .. } => {
                "The file could not be read. Please submit an unedited photo or video.".to_owned()
            }
            Self::NoFace => {
                "No face could be detected. Please submit a clear, front-facing photo.".to_owned()
            }
            Self::MultipleFaces { .. } => {
                "More than one face was detected. Please submit a photo of just yourself."
                    .to_owned()
            }
            Self::TooBlurry { .. } => {
                "The image is too blurry, which can indicate a photo of a screen or print. \
                 Please submit a sharp, live photo."
                    .to_owned()
            }
            Self::FeatureExtraction { .. } | Self::Detector { .. } => {
                "Your submission could not be processed. Please try again with a different photo."
                    .to_owned()
            }
        }
    }
}
