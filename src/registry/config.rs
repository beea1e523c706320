//! Registry configuration

/// Room registry configuration
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Maximum participants per room (0 = unlimited)
    pub max_participants: usize,
}

impl RegistryConfig {
    /// Set the per-room participant limit (0 = unlimited)
    pub fn max_participants(mut self, max: usize) -> Self {
        self.max_participants = max;
        self
    }

    /// Check whether a room holding `current` members can admit one more
    pub fn has_capacity(&self, current: usize) -> bool {
        self.max_participants == 0 || current < self.max_participants
    }
}
