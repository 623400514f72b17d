//! Replica configuration.

/// Configuration for a replica process.
#[derive(Debug, Clone)]
pub struct ReplicaConfig {
    /// Human-readable replica name, sent with the join request.
    pub name: String,
    /// Optional NATS URL override (defaults to `NATS_URL` env or localhost).
    pub nats_url: Option<String>,
    /// Stop after this many updates. `None` runs until the subscription ends.
    pub max_updates: Option<u64>,
}

impl ReplicaConfig {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nats_url: None,
            max_updates: None,
        }
    }

    /// Override the NATS URL for this replica.
    #[must_use]
    pub fn with_nats_url(mut self, url: impl Into<String>) -> Self {
        self.nats_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_max_updates(mut self, max: u64) -> Self {
        self.max_updates = Some(max);
        self
    }
}
