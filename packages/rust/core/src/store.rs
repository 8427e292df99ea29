//! Storage collaborators: where Markdown comes from and where chunks go.
//!
//! [`FsStore`] stands in for the object store with a local directory. Keys are
//! `/`-separated paths relative to its root.

use std::path::{Component, Path, PathBuf};

use docingest_shared::{Chunk, DocIngestError, Result};
use tracing::debug;

/// Extension of the objects the pipeline chunks.
pub const MARKDOWN_EXT: &str = ".md";

/// Prepended by the conversion stage to every Markdown object it writes.
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Provides decoded Markdown text for a storage key.
pub trait ContentSource: Send + Sync {
    fn read_text(&self, key: &str) -> Result<String>;
}

/// Accepts the chunk list produced for one document.
pub trait ChunkSink: Send + Sync {
    fn write_chunks(&self, key: &str, chunks: &[Chunk]) -> Result<()>;
}

/// Key of the chunk file for a Markdown key: the trailing `.md` is replaced
/// by `suffix`. Returns `None` for non-Markdown keys.
pub fn chunks_key(key: &str, suffix: &str) -> Option<String> {
    key.strip_suffix(MARKDOWN_EXT)
        .map(|stem| format!("{stem}{suffix}"))
}

// ---------------------------------------------------------------------------
// FsStore
// ---------------------------------------------------------------------------

/// A local directory used as an object store.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key under the root. Keys that would leave it are rejected.
    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(DocIngestError::validation(format!(
                "key '{key}' is not a relative path inside the store"
            )));
        }
        Ok(self.root.join(relative))
    }

    /// All Markdown keys starting with `prefix`, sorted.
    pub fn list_markdown(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        collect_keys(&self.root, &self.root, &mut keys)?;
        keys.retain(|k| k.ends_with(MARKDOWN_EXT) && k.starts_with(prefix));
        keys.sort();
        debug!(root = %self.root.display(), prefix, count = keys.len(), "listed markdown objects");
        Ok(keys)
    }
}

fn collect_keys(root: &Path, dir: &Path, keys: &mut Vec<String>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| DocIngestError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| DocIngestError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| DocIngestError::io(&path, e))?;

        if file_type.is_dir() {
            collect_keys(root, &path, keys)?;
        } else if file_type.is_file() {
            if let Ok(relative) = path.strip_prefix(root) {
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                keys.push(key);
            }
        }
    }
    Ok(())
}

impl ContentSource for FsStore {
    fn read_text(&self, key: &str) -> Result<String> {
        let path = self.path_for(key)?;
        let bytes = std::fs::read(&path).map_err(|e| DocIngestError::io(&path, e))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| DocIngestError::Source(format!("{key}: not valid UTF-8: {e}")))?;

        Ok(match text.strip_prefix(BYTE_ORDER_MARK) {
            Some(rest) => rest.to_string(),
            None => text,
        })
    }
}

impl ChunkSink for FsStore {
    fn write_chunks(&self, key: &str, chunks: &[Chunk]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DocIngestError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(chunks)?;
        std::fs::write(&path, json).map_err(|e| DocIngestError::Sink(format!("{key}: {e}")))?;
        debug!(key, chunk_count = chunks.len(), "wrote chunks");
        Ok(())
    }
}
