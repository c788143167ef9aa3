/// Configuration for the Discord REST adapter.
#[derive(Clone)]
pub struct DiscordConfig {
    /// Bot token sent in the `Authorization` header.
    pub token: String,

    /// Base URL of the Discord API, without a trailing slash.
    ///
    /// Overridable for tests and proxies.
    pub api_base: String,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl DiscordConfig {
    /// Create a new configuration with the given bot token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: "https://discord.com/api/v10".into(),
        }
    }

    /// Override the API base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}
