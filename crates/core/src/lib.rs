pub mod appeal;
pub mod band;
pub mod config;
pub mod error;
pub mod media;
pub mod record;
pub mod template;
pub mod types;

pub use appeal::{AppealRecord, AppealStats, AppealStatus};
pub use band::{AgeBand, BandTable};
pub use config::{GateConfig, MessageTemplates};
pub use error::ConfigError;
pub use media::{Attachment, MediaKind};
pub use record::VerificationRecord;
pub use types::{AppealId, ChannelId, GuildId, RecordId, RoleId, UserId};
