//! Relocation policies for the three patch group kinds.

use strum::Display;
use thiserror::Error;

use super::{MarginResolver, Resolution};
use crate::config::MinMargins;
use crate::patch::{MemoryGroup, NumberGroup, PatchGroup, UnionGroup};

/// One payload moved from its old offset to its new one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    pub from: u64,
    pub to: u64,
    pub margin: usize,
}

/// A group with all of its offsets rewritten
#[derive(Debug, Clone, PartialEq)]
pub struct Relocated {
    pub group: PatchGroup,
    pub moves: Vec<Relocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Incompatibility {
    #[strum(serialize = "no sub-patches")]
    Empty,
    #[strum(serialize = "sub-patch offset mismatch")]
    OffsetMismatch,
    #[strum(serialize = "sub-patch data length mismatch")]
    LengthMismatch,
}

/// Why a group was left out of the output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupFailure {
    #[error("'{entry}': incompatible ({reason})")]
    Incompatible {
        entry: String,
        reason: Incompatibility,
    },

    #[error("not found ({resolved}/{total})")]
    Partial { resolved: usize, total: usize },

    #[error("not found")]
    NotFound,

    #[error("malformed: {0}")]
    Malformed(String),

    #[error("unrecognized entry: {0}")]
    Unrecognized(String),
}

impl From<crate::Error> for GroupFailure {
    fn from(err: crate::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

pub type MatchResult = std::result::Result<Relocated, GroupFailure>;

/// Applies the margin resolver to whole patch groups.
#[derive(Debug, Clone, Copy)]
pub struct GroupMatcher<'a> {
    resolver: MarginResolver<'a>,
    min_margin: MinMargins,
}

impl<'a> GroupMatcher<'a> {
    pub fn new(resolver: MarginResolver<'a>, min_margin: MinMargins) -> Self {
        Self {
            resolver,
            min_margin,
        }
    }

    /// Relocate every record on its own; all of them must be found.
    pub fn relocate_memory(&self, mut group: MemoryGroup) -> MatchResult {
        let total = group.patches.len();
        let mut moves = Vec::with_capacity(total);

        for patch in &group.patches {
            let len = patch.payload_len()?;
            let resolution = self
                .resolver
                .resolve(patch.offset, len, self.min_margin.memory)?;
            if let Resolution::Found { offset, margin, .. } = resolution {
                moves.push(Relocation {
                    from: patch.offset,
                    to: offset,
                    margin,
                });
            }
        }

        if total == 0 || moves.len() != total {
            return Err(GroupFailure::Partial {
                resolved: moves.len(),
                total,
            });
        }

        for (patch, relocation) in group.patches.iter_mut().zip(&moves) {
            patch.offset = relocation.to;
        }
        Ok(Relocated {
            group: PatchGroup::Memory(group),
            moves,
        })
    }

    /// Relocate the shared anchor once and move every alternative with it.
    pub fn relocate_union(&self, mut group: UnionGroup) -> MatchResult {
        let Some(sample) = group.patches.first() else {
            return Err(GroupFailure::Incompatible {
                entry: group.name.clone(),
                reason: Incompatibility::Empty,
            });
        };
        let anchor = sample.patch.offset;
        let len = sample.patch.payload_len()?;

        for entry in &group.patches {
            if entry.patch.offset != anchor {
                return Err(GroupFailure::Incompatible {
                    entry: entry.name.clone(),
                    reason: Incompatibility::OffsetMismatch,
                });
            }
            if entry.patch.payload_len()? != len {
                return Err(GroupFailure::Incompatible {
                    entry: entry.name.clone(),
                    reason: Incompatibility::LengthMismatch,
                });
            }
        }

        let Resolution::Found { offset, margin, .. } =
            self.resolver.resolve(anchor, len, self.min_margin.union)?
        else {
            return Err(GroupFailure::NotFound);
        };

        for entry in &mut group.patches {
            entry.patch.offset = offset;
        }
        Ok(Relocated {
            group: PatchGroup::Union(group),
            moves: vec![Relocation {
                from: anchor,
                to: offset,
                margin,
            }],
        })
    }

    /// Relocate a single value using its declared size as payload length.
    pub fn relocate_number(&self, mut group: NumberGroup) -> MatchResult {
        let anchor = group.patch.offset;
        let Resolution::Found { offset, margin, .. } =
            self.resolver
                .resolve(anchor, group.patch.size, self.min_margin.number)?
        else {
            return Err(GroupFailure::NotFound);
        };

        group.patch.offset = offset;
        Ok(Relocated {
            group: PatchGroup::Number(group),
            moves: vec![Relocation {
                from: anchor,
                to: offset,
                margin,
            }],
        })
    }
}
