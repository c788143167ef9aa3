/// Configuration for the SQLite record stores.
#[derive(Debug, Clone)]
pub struct SqliteRecordsConfig {
    /// Database file path, created on first use.
    pub path: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
}

impl SqliteRecordsConfig {
    /// Create a new configuration with the given file path and defaults.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            max_connections: 5,
        }
    }

    /// Set the maximum number of pooled connections.
    #[must_use]
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}
