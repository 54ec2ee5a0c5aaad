use anyhow::{Result, bail};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

const MAX_NAME_LEN: usize = 100;

/// Flat directory of attachment blobs.
///
/// Each blob lives at `{dir}/{message_id}_{file_name}`, with the file name
/// reduced to a safe single path component.
pub struct AttachmentStore {
    dir: PathBuf,
}

impl AttachmentStore {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        info!("Attachment directory: {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn key_for(&self, message_id: Uuid, file_name: &str) -> String {
        format!("{}_{}", message_id, sanitize_file_name(file_name))
    }

    pub fn path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            bail!("invalid attachment key '{}'", key);
        }
        Ok(self.dir.join(key))
    }

    /// Writes the blob and flushes it to disk before returning.
    pub fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key)?;
        let mut file = fs::File::create(&path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        debug!("Stored attachment {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    pub fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path(key)?;
        Ok(fs::read(path)?)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Attachment {} already gone", key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps the final path component and replaces anything outside
/// `[A-Za-z0-9._-]`.
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "attachment".to_string()
    } else {
        cleaned.to_string()
    }
}
