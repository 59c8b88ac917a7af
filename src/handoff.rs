//! Single-slot prompt handoff from the prompt assistant to the studio.
//!
//! The assistant writes the chosen suggestion; the studio reads it once on
//! its next start and clears it.

use crate::error::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Well-known key (file name) of the slot.
pub const HANDOFF_KEY: &str = "last_ai_prompt";

/// File-backed handoff slot inside a state directory.
#[derive(Debug, Clone)]
pub struct HandoffSlot {
    path: PathBuf,
}

impl HandoffSlot {
    /// Uses `<state_dir>/last_ai_prompt`.
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(HANDOFF_KEY),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the slot with `prompt`.
    pub fn store(&self, prompt: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, prompt)?;
        tracing::debug!(path = %self.path.display(), "handoff prompt stored");
        Ok(())
    }

    /// Reads and clears the slot. An empty slot yields `None`.
    pub fn take(&self) -> Result<Option<String>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        std::fs::remove_file(&self.path)?;
        Ok(Some(contents).filter(|prompt| !prompt.is_empty()))
    }
}
