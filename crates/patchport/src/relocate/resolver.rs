use tracing::debug;

use super::{build_window, find_occurrences};
use crate::config::ClampMode;
use crate::error::{Error, Result};
use crate::module::ModuleBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one occurrence at `margin`; larger margins had zero or several
    Found {
        offset: u64,
        margin: usize,
        attempts: usize,
    },
    /// No margin down to the floor produced a unique occurrence
    NotFound { attempts: usize },
}

impl Resolution {
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::Found { offset, .. } => Some(*offset),
            Self::NotFound { .. } => None,
        }
    }

    pub fn attempts(&self) -> usize {
        match self {
            Self::Found { attempts, .. } | Self::NotFound { attempts } => *attempts,
        }
    }
}

/// Locates old-module payloads in the new module by shrinking the context
/// margin until the surrounding bytes occur exactly once.
#[derive(Debug, Clone, Copy)]
pub struct MarginResolver<'a> {
    old: &'a ModuleBuffer,
    new: &'a ModuleBuffer,
    max_margin: usize,
    clamp: ClampMode,
}

impl<'a> MarginResolver<'a> {
    pub fn new(old: &'a ModuleBuffer, new: &'a ModuleBuffer, max_margin: usize) -> Self {
        Self {
            old,
            new,
            max_margin,
            clamp: ClampMode::default(),
        }
    }

    pub fn with_clamp(mut self, clamp: ClampMode) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn max_margin(&self) -> usize {
        self.max_margin
    }

    /// Try margins from the maximum down to `min_margin` (inclusive) and
    /// accept the first one that yields a single occurrence.
    ///
    /// The maximum is capped at the old module size; any larger margin would
    /// cut the same window again. Fails only when the payload does not lie
    /// inside the old module.
    pub fn resolve(&self, anchor: u64, len: usize, min_margin: usize) -> Result<Resolution> {
        let offset = usize::try_from(anchor).map_err(|_| Error::OutOfBounds {
            offset: anchor,
            len,
            size: self.old.len(),
        })?;

        let top = self.max_margin.min(self.old.len());
        let mut attempts = 0;
        for margin in (min_margin..=top).rev() {
            attempts += 1;
            let window = build_window(self.old, offset, len, margin, self.clamp)?;
            let hits = find_occurrences(self.new, &window);
            debug!(
                "  0x{:X}+{} margin={}: {} occurrence(s)",
                anchor,
                len,
                margin,
                hits.len()
            );

            if let [found] = hits.as_slice() {
                return Ok(Resolution::Found {
                    offset: *found as u64,
                    margin,
                    attempts,
                });
            }
        }

        Ok(Resolution::NotFound { attempts })
    }
}
