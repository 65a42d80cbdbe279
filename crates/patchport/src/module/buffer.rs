use std::fs;
use std::path::{Path, PathBuf};

use memchr::memmem::Finder;
use tracing::debug;

use crate::error::Result;

/// Raw bytes of a module file, read once and never modified.
#[derive(Debug, Clone)]
pub struct ModuleBuffer {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl ModuleBuffer {
    /// Read the whole module into memory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
        })
    }

    /// Wrap bytes that are already in memory
    pub fn from_bytes<P: Into<PathBuf>>(path: P, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read up to `len` bytes starting at `offset`, truncated at end of buffer.
    ///
    /// Returns `None` when `offset` is past the end.
    pub fn read(&self, offset: usize, len: usize) -> Option<&[u8]> {
        if offset > self.bytes.len() {
            return None;
        }
        let end = offset.saturating_add(len).min(self.bytes.len());
        Some(&self.bytes[offset..end])
    }

    pub fn read_u32_le(&self, offset: usize) -> Option<u32> {
        let bytes = self.read(offset, 4)?;
        let bytes: [u8; 4] = bytes.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    /// Start index of every occurrence of `needle`, overlapping matches included.
    ///
    /// The search resumes one byte after each hit, so `AA AA` inside `AA AA AA`
    /// is reported twice.
    pub fn find_all(&self, needle: &[u8]) -> Vec<usize> {
        if needle.is_empty() || needle.len() > self.bytes.len() {
            return Vec::new();
        }

        let finder = Finder::new(needle);
        let mut results = Vec::new();
        let mut start = 0;
        while let Some(pos) = finder.find(&self.bytes[start..]) {
            let found = start + pos;
            results.push(found);
            start = found + 1;
            if start + needle.len() > self.bytes.len() {
                break;
            }
        }
        results
    }
}
