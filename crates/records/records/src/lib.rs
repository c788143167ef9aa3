pub mod appeal;
pub mod error;
pub mod testing;
pub mod verification;

pub use appeal::AppealStore;
pub use error::RecordError;
pub use verification::VerificationStore;
