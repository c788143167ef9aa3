use serde::{Deserialize, Serialize};

use agegate_core::{GuildId, UserId};

/// The kind of session state being stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// Submission cooldown after an accepted verification.
    VerifyCooldown,
    /// Cooldown after a denied ban appeal.
    AppealCooldown,
    /// Short-lived claim a reviewer holds while reviewing one subject.
    ReviewClaim,
    /// Rolling join counter for raid detection.
    JoinWindow,
    Custom(String),
}

impl KeyKind {
    /// Return a string representation of the key kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::VerifyCooldown => "verify_cooldown",
            Self::AppealCooldown => "appeal_cooldown",
            Self::ReviewClaim => "review_claim",
            Self::JoinWindow => "join_window",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key used to address session entries in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub guild: GuildId,
    pub kind: KeyKind,
    pub id: String,
}

impl SessionKey {
    /// Create a new session key.
    #[must_use]
    pub fn new(guild: impl Into<GuildId>, kind: KeyKind, id: impl Into<String>) -> Self {
        Self {
            guild: guild.into(),
            kind,
            id: id.into(),
        }
    }

    /// Submission-cooldown key for one user.
    #[must_use]
    pub fn verify_cooldown(guild: &GuildId, user: &UserId) -> Self {
        Self::new(guild.clone(), KeyKind::VerifyCooldown, user.as_str())
    }

    /// Appeal-cooldown key for one user.
    #[must_use]
    pub fn appeal_cooldown(guild: &GuildId, user: &UserId) -> Self {
        Self::new(guild.clone(), KeyKind::AppealCooldown, user.as_str())
    }

    /// Review-claim key for one subject user.
    #[must_use]
    pub fn review_claim(guild: &GuildId, subject: &UserId) -> Self {
        Self::new(guild.clone(), KeyKind::ReviewClaim, subject.as_str())
    }

    /// The single rolling join counter for a guild.
    #[must_use]
    pub fn join_window(guild: &GuildId) -> Self {
        Self::new(guild.clone(), KeyKind::JoinWindow, "current")
    }

    /// Return a canonical string representation: `guild:kind:id`
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}:{}:{}", self.guild, self.kind, self.id)
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}
