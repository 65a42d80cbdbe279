//! Patch set files named after module fingerprints.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::PatchSet;
use crate::error::{Error, Result};
use crate::module::Fingerprint;

/// Directory holding `<fingerprint>.json` patch sets
#[derive(Debug, Clone)]
pub struct PatchStore {
    dir: PathBuf,
}

impl PatchStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(fingerprint.patch_file_name())
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.path_for(fingerprint).is_file()
    }

    pub fn load(&self, fingerprint: &Fingerprint) -> Result<PatchSet> {
        let path = self.path_for(fingerprint);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::PatchSetNotFound(path));
            }
            Err(e) => return Err(e.into()),
        };
        debug!("Reading patch set {}", path.display());
        PatchSet::from_json(&content)
    }

    /// Write the patch set, replacing any existing file.
    ///
    /// The content goes to a temporary sibling first and is renamed into
    /// place, so a failed write never leaves a truncated patch set behind.
    pub fn save(&self, fingerprint: &Fingerprint, set: &PatchSet) -> Result<PathBuf> {
        let path = self.path_for(fingerprint);
        let tmp = path.with_extension("json.tmp");
        let content = set.to_json()?;

        fs::write(&tmp, content)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        info!("Saved patch set to {}", path.display());
        Ok(path)
    }
}
