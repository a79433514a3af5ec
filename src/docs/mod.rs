pub mod loader;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tracing::info;

use types::KnowledgeBase;

/// Process-wide knowledge base, loaded on first use and shared read-only by
/// every session until `reload` swaps in a fresh copy.
pub struct KnowledgeCache {
    dir: PathBuf,
    current: RwLock<Option<Arc<KnowledgeBase>>>,
}

/// Outcome of an explicit reload.
#[derive(Debug, Clone)]
pub struct ReloadSummary {
    pub doc_count: usize,
    pub skipped_count: usize,
    pub changed: bool,
}

impl KnowledgeCache {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            current: RwLock::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Return the cached knowledge base, loading it on first access.
    pub async fn get(&self) -> Result<Arc<KnowledgeBase>> {
        {
            let cached = self.current.read().await;
            if let Some(kb) = cached.as_ref() {
                return Ok(kb.clone());
            }
        }

        let mut slot = self.current.write().await;
        // Another task may have filled it while we waited for the write lock
        if let Some(kb) = slot.as_ref() {
            return Ok(kb.clone());
        }
        let kb = self.load_fresh().await?;
        *slot = Some(kb.clone());
        Ok(kb)
    }

    /// Re-read the directory and replace the cached value.
    pub async fn reload(&self) -> Result<ReloadSummary> {
        let fresh = self.load_fresh().await?;
        let mut slot = self.current.write().await;
        let changed = slot
            .as_ref()
            .map_or(true, |old| old.fingerprint() != fresh.fingerprint());
        let summary = ReloadSummary {
            doc_count: fresh.docs().len(),
            skipped_count: fresh.skipped().len(),
            changed,
        };
        *slot = Some(fresh);
        info!(
            doc_count = summary.doc_count,
            skipped = summary.skipped_count,
            changed,
            "Knowledge base reloaded"
        );
        Ok(summary)
    }

    async fn load_fresh(&self) -> Result<Arc<KnowledgeBase>> {
        let dir = self.dir.clone();
        let kb = tokio::task::spawn_blocking(move || loader::load(&dir))
            .await
            .context("spawn_blocking join failed")?;
        info!(
            dir = %self.dir.display(),
            doc_count = kb.docs().len(),
            skipped = kb.skipped().len(),
            size = kb.text().len(),
            "Knowledge base loaded"
        );
        Ok(Arc::new(kb))
    }
}
