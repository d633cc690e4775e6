//! Where the pipeline is allowed to run: a set of (scope, channel) pairs
//! behind an injected registry trait.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// One registry entry. A `None` scope is the shared null scope (direct
/// messages); it is its own key, never folded into any sentinel value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelKey {
    pub scope: Option<String>,
    pub channel: String,
}

impl ChannelKey {
    pub fn new(scope: Option<impl Into<String>>, channel: impl Into<String>) -> Self {
        Self {
            scope: scope.map(Into::into),
            channel: channel.into(),
        }
    }
}

#[async_trait]
pub trait ChannelRegistry: Send + Sync {
    /// The only operation the message pipeline itself depends on.
    async fn contains(&self, scope: Option<&str>, channel: &str) -> bool;
    /// Returns true when the key was newly added.
    async fn add(&self, key: ChannelKey) -> Result<bool>;
    /// Returns true when the key was present.
    async fn remove(&self, key: &ChannelKey) -> Result<bool>;
    async fn list(&self) -> Vec<ChannelKey>;
}

/// Volatile registry for tests and embedders that persist elsewhere.
#[derive(Default)]
pub struct MemoryChannelStore {
    entries: RwLock<HashSet<ChannelKey>>,
}

impl MemoryChannelStore {
    pub fn with_entries(entries: impl IntoIterator<Item = ChannelKey>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }
}

#[async_trait]
impl ChannelRegistry for MemoryChannelStore {
    async fn contains(&self, scope: Option<&str>, channel: &str) -> bool {
        let entries = self.entries.read().await;
        entries.contains(&ChannelKey::new(scope, channel))
    }

    async fn add(&self, key: ChannelKey) -> Result<bool> {
        Ok(self.entries.write().await.insert(key))
    }

    async fn remove(&self, key: &ChannelKey) -> Result<bool> {
        Ok(self.entries.write().await.remove(key))
    }

    async fn list(&self) -> Vec<ChannelKey> {
        let mut entries: Vec<_> = self.entries.read().await.iter().cloned().collect();
        entries.sort_by(|a, b| (&a.scope, &a.channel).cmp(&(&b.scope, &b.channel)));
        entries
    }
}

/// Registry persisted as one JSON document, written whole on every mutation
/// (last writer wins) via a temp file and atomic rename.
pub struct FileChannelStore {
    path: PathBuf,
    entries: RwLock<HashSet<ChannelKey>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ChannelDocument {
    channels: Vec<ChannelKey>,
}

impl FileChannelStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read channel store: {}", path.display()))?;
            let document: ChannelDocument = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse channel store: {}", path.display()))?;
            document.channels.into_iter().collect()
        } else {
            HashSet::new()
        };
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    fn persist(&self, entries: &HashSet<ChannelKey>) -> Result<()> {
        let mut channels: Vec<_> = entries.iter().cloned().collect();
        channels.sort_by(|a, b| (&a.scope, &a.channel).cmp(&(&b.scope, &b.channel)));
        let document = ChannelDocument { channels };
        let content = serde_json::to_string_pretty(&document)?;

        let parent = self.path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create store directory: {}", parent.display()))?;
        let file = tempfile::NamedTempFile::new_in(parent)
            .context("failed to create channel store temp file")?;
        std::fs::write(file.path(), content)
            .context("failed to write channel store temp file")?;
        file.persist(&self.path)
            .with_context(|| format!("failed to persist channel store: {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl ChannelRegistry for FileChannelStore {
    async fn contains(&self, scope: Option<&str>, channel: &str) -> bool {
        let entries = self.entries.read().await;
        entries.contains(&ChannelKey::new(scope, channel))
    }

    async fn add(&self, key: ChannelKey) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let added = entries.insert(key);
        if added {
            self.persist(&entries)?;
        }
        Ok(added)
    }

    async fn remove(&self, key: &ChannelKey) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let removed = entries.remove(key);
        if removed {
            self.persist(&entries)?;
        }
        Ok(removed)
    }

    async fn list(&self) -> Vec<ChannelKey> {
        let mut entries: Vec<_> = self.entries.read().await.iter().cloned().collect();
        entries.sort_by(|a, b| (&a.scope, &a.channel).cmp(&(&b.scope, &b.channel)));
        entries
    }
}
