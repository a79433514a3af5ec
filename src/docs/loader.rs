use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use super::types::{KnowledgeBase, LoadedDoc, SkippedFile};

pub const DOC_EXTENSION: &str = "txt";

pub fn open_delimiter(name: &str) -> String {
    format!("=== ARQUIVO: {} ===", name)
}

pub const CLOSE_DELIMITER: &str = "=== FIM DO ARQUIVO ===";

/// Read every `*.txt` file directly inside `dir` into one knowledge base.
///
/// Never fails. A missing directory yields an empty knowledge base and a file
/// that cannot be read is recorded in `skipped` and left out. Invalid UTF-8 is
/// replaced rather than rejected. Entries are sorted by name, but callers must
/// not rely on any order.
pub fn load(dir: &Path) -> KnowledgeBase {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Documents directory unreadable");
            return KnowledgeBase::empty();
        }
    };

    let mut candidates = Vec::new();
    let mut skipped = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some(DOC_EXTENSION) {
                    candidates.push(path);
                }
            }
            Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to read directory entry"),
        }
    }
    candidates.sort();

    let mut text = String::new();
    let mut docs = Vec::new();
    for path in candidates {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if !path.is_file() {
            skipped.push(SkippedFile {
                path,
                reason: "not a regular file".to_string(),
            });
            continue;
        }

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping unreadable document");
                skipped.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let content = String::from_utf8_lossy(&bytes);
        text.push_str(&open_delimiter(&name));
        text.push('\n');
        text.push_str(&content);
        text.push('\n');
        text.push_str(CLOSE_DELIMITER);
        text.push('\n');

        debug!(file = %name, size = bytes.len(), "Document loaded");
        docs.push(LoadedDoc {
            name,
            size: bytes.len(),
        });
    }

    KnowledgeBase::new(text, docs, skipped)
}
