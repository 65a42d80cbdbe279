//! # patchport
//!
//! Moves binary patches from one build of a module to a newer build without
//! debug symbols.
//!
//! This crate provides:
//! - Module loading and PE header fingerprints
//! - The patch set file model (`memory`, `union` and `number` groups)
//! - Offset relocation by context matching with margin back-off
//! - A port job that ties the above together for the CLI

pub mod config;
pub mod error;
pub mod module;
pub mod patch;
pub mod port;
pub mod relocate;

pub use config::{ClampMode, MinMargins, RelocationConfig, RelocationConfigBuilder};
pub use error::{Error, Result};
pub use module::{Fingerprint, ModuleBuffer};
pub use patch::{
    GroupKind, GroupRecord, MemoryGroup, NumberGroup, PatchEntry, PatchGroup, PatchSet, PatchStore,
    UnionGroup,
};
pub use port::{PortJob, PortSummary};
pub use relocate::{
    GroupFailure, GroupMatcher, GroupOutcome, GroupResult, MarginResolver, Relocation,
    RelocationReport, RelocationSession, Resolution,
};
