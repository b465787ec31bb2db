//! Saving and loading documents.
//!
//! A full save is one document chunk holding every change in causal order. Incremental saves are
//! change chunks, one per change added since the previous save of either kind, and can simply be
//! appended to a file holding an earlier save.

use std::path::Path;

use tracing::debug;

use super::Document;
use crate::{Result, change::ChangeError, codec};

impl Document {
    /// Encode the whole history. Pending edits are committed first.
    pub fn save(&mut self) -> Result<Vec<u8>> {
        self.commit()?;
        let bytes = codec::encode_document(self.history.iter())?;
        self.saved_len = self.history.len();
        debug!(
            changes = self.history.len(),
            bytes = bytes.len(),
            "Saved document"
        );
        Ok(bytes)
    }

    /// Encode the changes added since the last save. Empty if there are none.
    pub fn save_incremental(&mut self) -> Result<Vec<u8>> {
        self.commit()?;
        let added = self.history.tail(self.saved_len);
        let mut bytes = Vec::new();
        for change in added {
            bytes.extend(change.to_bytes()?);
        }
        debug!(changes = added.len(), bytes = bytes.len(), "Saved incremental changes");
        self.saved_len = self.history.len();
        Ok(bytes)
    }

    /// Load a document saved with [`save`](Self::save), under a new random actor id.
    ///
    /// Fails if the bytes are not a well-formed document or if any change's parents are missing.
    pub fn load(bytes: &[u8]) -> Result<Document> {
        let changes = codec::decode_document(bytes)?;
        let mut doc = Document::new();
        for change in changes {
            if doc.history.has(&change.hash()) {
                continue;
            }
            if let Some(dependency) = change.deps().iter().find(|dep| !doc.history.has(dep)) {
                return Err(ChangeError::MissingDependency {
                    hash: change.hash(),
                    dependency: *dependency,
                }
                .into());
            }
            doc.apply_change(change)?;
        }
        doc.saved_len = doc.history.len();
        debug!(changes = doc.history.len(), "Loaded document");
        Ok(doc)
    }

    /// Apply any concatenation of document and change chunks, such as the output of
    /// [`save`](Self::save) followed by [`save_incremental`](Self::save_incremental) calls.
    ///
    /// Returns how many changes were added. Changes whose parents are still missing are queued.
    pub fn load_incremental(&mut self, bytes: &[u8]) -> Result<usize> {
        let changes = codec::decode_changes(bytes)?;
        let before = self.history.len();
        self.apply_changes(changes)?;
        Ok(self.history.len() - before)
    }

    pub fn save_to_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.save()?;
        std::fs::write(path.as_ref(), bytes)?;
        debug!(path = %path.as_ref().display(), "Wrote document");
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Document> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::load(&bytes)
    }
}
