use std::path::PathBuf;

/// A document that made it into the knowledge base.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDoc {
    pub name: String,
    pub size: usize,
}

/// A matching file that could not be read, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// The concatenated text of every loaded document.
///
/// Built once and never mutated; a reload produces a new value.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    text: String,
    docs: Vec<LoadedDoc>,
    skipped: Vec<SkippedFile>,
    fingerprint: String,
}

impl KnowledgeBase {
    pub fn new(text: String, docs: Vec<LoadedDoc>, skipped: Vec<SkippedFile>) -> Self {
        let fingerprint = blake3::hash(text.as_bytes()).to_hex().to_string();
        Self {
            text,
            docs,
            skipped,
            fingerprint,
        }
    }

    /// No documents at all. Shares its fingerprint with every other empty base.
    pub fn empty() -> Self {
        Self::new(String::new(), Vec::new(), Vec::new())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn docs(&self) -> &[LoadedDoc] {
        &self.docs
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    /// blake3 hex digest of the text.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::empty()
    }
}
