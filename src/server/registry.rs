use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use super::types::{ChannelList, ChannelMetadata};
use crate::error::ConfigError;

// ── ChannelRegistry – locally curated channel metadata ─────────────────────────

/// Channel metadata keyed by upstream issue id. Read-only after load.
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    channels: HashMap<String, ChannelMetadata>,
}

impl ChannelRegistry {
    /// Load from disk synchronously (file is small – safe to block on startup).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ChannelFile {
            path: path.to_path_buf(),
            source,
        })?;
        let list: ChannelList =
            serde_json::from_str(&raw).map_err(|source| ConfigError::ChannelParse {
                path: path.to_path_buf(),
                source,
            })?;

        let registry = Self::from_channels(list.channels);
        debug!(
            "loaded {} channel definitions from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Later entries replace earlier ones with the same issue id.
    pub fn from_channels(channels: impl IntoIterator<Item = ChannelMetadata>) -> Self {
        let channels = channels
            .into_iter()
            .map(|ch| (ch.issue_id.clone(), ch))
            .collect();
        Self { channels }
    }

    pub fn get(&self, issue_id: &str) -> Option<&ChannelMetadata> {
        self.channels.get(issue_id)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
