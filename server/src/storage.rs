//! JSON file persistence for the wheel document.
//!
//! Storage is best effort: the first failure is logged as a warning and the
//! store switches itself off, leaving the server running purely in memory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use wheel_shared::document::{parse_document, WheelDocument};

pub struct JsonFileStore {
    path: PathBuf,
    disabled: bool,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            disabled: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Load the saved document. A missing file is a normal first start.
    pub fn load(&mut self) -> Option<WheelDocument> {
        if self.disabled {
            return None;
        }
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No saved wheel at {}", self.path.display());
                return None;
            }
            Err(e) => {
                self.disable(&format!("read failed: {}", e));
                return None;
            }
        };
        match parse_document(&text) {
            Ok(parsed) => {
                if !parsed.defaulted.is_empty() {
                    tracing::debug!("Saved wheel used defaults for {:?}", parsed.defaulted);
                }
                Some(parsed.document)
            }
            Err(e) => {
                // Keep the store enabled: the next save replaces the bad file.
                tracing::warn!("Ignoring saved wheel at {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Sibling file the document is written to before it replaces `path`
    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Write the document next to the target, then rename it into place so a
    /// crash mid-write never leaves a truncated file behind.
    pub async fn save(&mut self, document: &WheelDocument) {
        if self.disabled {
            return;
        }
        let temp = self.temp_path();
        if let Err(e) = tokio::fs::write(&temp, document.to_json_pretty()).await {
            self.disable(&format!("write failed: {}", e));
            return;
        }
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            self.disable(&format!("rename failed: {}", e));
        }
    }

    fn disable(&mut self, reason: &str) {
        tracing::warn!(
            "Storage at {} unavailable ({}); continuing in memory",
            self.path.display(),
            reason
        );
        self.disabled = true;
    }
}
