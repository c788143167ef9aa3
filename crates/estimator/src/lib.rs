pub mod detector;
pub mod error;
pub mod estimator;
pub mod spoof;
pub mod testing;
pub mod video;

pub use detector::{FaceDetector, FaceGeometry, RegionDetector};
pub use error::EstimatorError;
pub use estimator::{Estimate, Estimator, EstimatorSettings};
pub use spoof::{SpoofReason, SpoofVerdict};
pub use video::{NullVideoDecoder, VideoDecoder, FRAME_STRIDE, MAX_SAMPLED_FRAMES};
