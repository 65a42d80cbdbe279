//! Patch set model and storage.
//!
//! A patch set file is a JSON array. The first element may be a metadata
//! record; every following element is a patch group tagged by `type`
//! (`memory`, `union` or `number`).

mod group;
mod set;
mod store;

pub use group::*;
pub use set::*;
pub use store::*;
