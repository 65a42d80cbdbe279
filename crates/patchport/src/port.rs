//! End-to-end port of a patch set from an old module build to a new one.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::RelocationConfig;
use crate::error::{Error, Result};
use crate::module::{Fingerprint, ModuleBuffer};
use crate::patch::PatchStore;
use crate::relocate::{RelocationReport, RelocationSession};

#[derive(Debug, Clone)]
pub struct PortJob {
    code: String,
    old_path: PathBuf,
    new_path: PathBuf,
    store: PatchStore,
    config: RelocationConfig,
    dry_run: bool,
}

#[derive(Debug)]
pub struct PortSummary {
    pub old_fingerprint: Fingerprint,
    pub new_fingerprint: Fingerprint,
    pub report: RelocationReport,
    /// Written patch set, `None` on a dry run
    pub output_path: Option<PathBuf>,
}

impl PortJob {
    pub fn new<S, P, Q, D>(code: S, old_path: P, new_path: Q, patch_dir: D) -> Self
    where
        S: Into<String>,
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
        D: AsRef<Path>,
    {
        Self {
            code: code.into(),
            old_path: old_path.into(),
            new_path: new_path.into(),
            store: PatchStore::new(patch_dir),
            config: RelocationConfig::default(),
            dry_run: false,
        }
    }

    pub fn with_config(mut self, config: RelocationConfig) -> Self {
        self.config = config;
        self
    }

    /// Relocate and report without writing the new patch set
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn run(&self) -> Result<PortSummary> {
        if same_file(&self.old_path, &self.new_path) {
            return Err(Error::IdenticalModules(self.new_path.clone()));
        }

        let old = ModuleBuffer::load(&self.old_path)?;
        let new = ModuleBuffer::load(&self.new_path)?;
        let old_fingerprint = Fingerprint::from_module(&self.code, &old)?;
        let new_fingerprint = Fingerprint::from_module(&self.code, &new)?;
        info!("Old module: {}", old_fingerprint);
        info!("New module: {}", new_fingerprint);

        if old_fingerprint == new_fingerprint {
            return Err(Error::UnchangedModule(old_fingerprint.to_string()));
        }

        let patches = self.store.load(&old_fingerprint)?;
        let session = RelocationSession::new(old, new, self.config.clone());
        let report = session.relocate(patches);

        let output_path = if self.dry_run {
            info!("Dry run, not writing {}", new_fingerprint.patch_file_name());
            None
        } else {
            if self.store.contains(&new_fingerprint) {
                warn!(
                    "Replacing existing '{}'",
                    self.store.path_for(&new_fingerprint).display()
                );
            }
            Some(self.store.save(&new_fingerprint, &report.output)?)
        };

        Ok(PortSummary {
            old_fingerprint,
            new_fingerprint,
            report,
            output_path,
        })
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::fake_pe;
    use serde_json::{Value, json};
    use std::fs;
    use tempfile::tempdir;

    const HEADER_LEN: usize = 0x100;

    fn write_modules(dir: &Path) -> (PathBuf, PathBuf) {
        let mut old_body = vec![0u8; 0x40];
        old_body[0x10..0x14].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let mut new_body = vec![0u8; 0x80];
        new_body[0x30..0x34].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

        let old_path = dir.join("old.dll");
        let new_path = dir.join("new.dll");
        fs::write(&old_path, fake_pe(0x100, 0x2000, &old_body)).unwrap();
        fs::write(&new_path, fake_pe(0x200, 0x2000, &new_body)).unwrap();
        (old_path, new_path)
    }

    fn write_patches(dir: &Path) {
        let patches = json!([
            { "version": "2024", "lastUpdated": "2024-01-01 00:00:00", "source": "old" },
            { "type": "memory", "name": "Marker", "patches": [
                { "offset": HEADER_LEN + 0x10, "dllName": "game.dll", "dataDisabled": "DEADBEEF" } ] }
        ]);
        fs::write(dir.join("LDJ-100_2000.json"), patches.to_string()).unwrap();
    }

    #[test]
    fn test_port_writes_new_patch_set() {
        let dir = tempdir().unwrap();
        let (old_path, new_path) = write_modules(dir.path());
        write_patches(dir.path());

        let summary = PortJob::new("ldj", &old_path, &new_path, dir.path())
            .run()
            .unwrap();

        assert_eq!(summary.old_fingerprint.to_string(), "LDJ-100_2000");
        assert_eq!(summary.new_fingerprint.to_string(), "LDJ-200_2000");
        assert_eq!(summary.report.relocated(), 1);

        let output_path = summary.output_path.unwrap();
        assert_eq!(output_path, dir.path().join("LDJ-200_2000.json"));

        let written: Value = serde_json::from_str(&fs::read_to_string(output_path).unwrap()).unwrap();
        assert_eq!(written[0]["version"], "?");
        assert_eq!(written[1]["patches"][0]["offset"], HEADER_LEN + 0x30);
        assert_eq!(written[1]["patches"][0]["dllName"], "game.dll");
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let (old_path, new_path) = write_modules(dir.path());
        write_patches(dir.path());

        let summary = PortJob::new("ldj", &old_path, &new_path, dir.path())
            .dry_run(true)
            .run()
            .unwrap();

        assert!(summary.output_path.is_none());
        assert!(!dir.path().join("LDJ-200_2000.json").exists());
    }

    #[test]
    fn test_identical_paths_rejected() {
        let dir = tempdir().unwrap();
        let (old_path, _) = write_modules(dir.path());

        let err = PortJob::new("ldj", &old_path, &old_path, dir.path())
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::IdenticalModules(_)));
    }

    #[test]
    fn test_identical_fingerprints_rejected_before_matching() {
        let dir = tempdir().unwrap();
        let (old_path, _) = write_modules(dir.path());
        let copy_path = dir.path().join("copy.dll");
        fs::copy(&old_path, &copy_path).unwrap();

        // No patch set exists, so reaching the store would report a different error
        let err = PortJob::new("ldj", &old_path, &copy_path, dir.path())
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::UnchangedModule(ref fp) if fp == "LDJ-100_2000"));
    }

    #[test]
    fn test_missing_patch_set() {
        let dir = tempdir().unwrap();
        let (old_path, new_path) = write_modules(dir.path());

        let err = PortJob::new("ldj", &old_path, &new_path, dir.path())
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::PatchSetNotFound(_)));
    }

    #[test]
    fn test_invalid_module_rejected() {
        let dir = tempdir().unwrap();
        let (old_path, _) = write_modules(dir.path());
        let bogus = dir.path().join("bogus.dll");
        fs::write(&bogus, vec![0u8; 0x200]).unwrap();

        let err = PortJob::new("ldj", &old_path, &bogus, dir.path())
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidModule { .. }));
    }
}
