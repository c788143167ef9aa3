pub mod appeal;
pub mod verification;

pub use appeal::MemoryAppealStore;
pub use verification::MemoryVerificationStore;
