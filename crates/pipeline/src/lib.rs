pub(crate) mod alerts;
pub mod background;
pub mod builder;
pub mod error;
pub mod outcome;
pub mod pipeline;

pub use background::{BackgroundConfig, BackgroundProcessor, BackgroundProcessorBuilder};
pub use builder::PipelineBuilder;
pub use error::PipelineError;
pub use outcome::{AppealOutcome, PendingReview, ReviewOutcome, SubmissionOutcome};
pub use pipeline::VerificationPipeline;
