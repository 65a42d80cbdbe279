//! Fingerprint command implementation.

use std::path::Path;

use anyhow::Result;
use patchport::{Fingerprint, ModuleBuffer, PatchStore};

/// Print the fingerprint key of a module
pub fn run(game_code: &str, module: &Path, patch_dir: Option<&Path>) -> Result<()> {
    let buffer = ModuleBuffer::load(module)?;
    let fingerprint = Fingerprint::from_module(game_code, &buffer)?;

    println!("{}", fingerprint);
    println!("  TimeDateStamp:       0x{:08X}", fingerprint.timestamp);
    println!("  AddressOfEntryPoint: 0x{:08X}", fingerprint.entry_point);

    if let Some(dir) = patch_dir {
        let store = PatchStore::new(dir);
        let path = store.path_for(&fingerprint);
        let status = if store.contains(&fingerprint) {
            "found"
        } else {
            "missing"
        };
        println!("  Patch set: {} ({})", path.display(), status);
    }

    Ok(())
}
