//! Relocation settings.
//!
//! Margins control detection sensitivity: a margin is the number of bytes
//! taken on both sides of a payload when searching for it in the new module.
//! Lower margins raise the false-positive rate, so each group kind has its
//! own floor.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{Error, Result};

pub const DEFAULT_MAX_MARGIN: usize = 8;
pub const DEFAULT_MIN_MARGIN_MEMORY: usize = 2;
/// Union patches tend to replace a larger chunk, so they can go lower
pub const DEFAULT_MIN_MARGIN_UNION: usize = 0;
pub const DEFAULT_MIN_MARGIN_NUMBER: usize = 2;
pub const DEFAULT_SOURCE_URL: &str = "https://sp2x.two-torial.xyz/";

/// How a context window is cut when the anchor lies within `margin` bytes
/// of the start of the module.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClampMode {
    /// Drop the missing leading bytes; the window gets shorter.
    #[default]
    Trim,
    /// Read the full window length from byte 0 and still assume `margin`
    /// leading bytes. Offsets near the module start come out shifted.
    Legacy,
}

/// Per-kind floor of the margin back-off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinMargins {
    pub memory: usize,
    pub union: usize,
    pub number: usize,
}

impl Default for MinMargins {
    fn default() -> Self {
        Self {
            memory: DEFAULT_MIN_MARGIN_MEMORY,
            union: DEFAULT_MIN_MARGIN_UNION,
            number: DEFAULT_MIN_MARGIN_NUMBER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelocationConfig {
    /// Starting margin of every back-off
    pub max_margin: usize,
    pub min_margin: MinMargins,
    pub clamp: ClampMode,
    /// Written to the metadata record's `source` field
    pub source_url: String,
}

impl Default for RelocationConfig {
    fn default() -> Self {
        Self {
            max_margin: DEFAULT_MAX_MARGIN,
            min_margin: MinMargins::default(),
            clamp: ClampMode::default(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
        }
    }
}

impl RelocationConfig {
    pub fn builder() -> RelocationConfigBuilder {
        RelocationConfigBuilder::default()
    }

    /// Load settings from a TOML file; absent keys keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelocationConfigBuilder {
    max_margin: Option<usize>,
    min_margin: Option<MinMargins>,
    clamp: Option<ClampMode>,
    source_url: Option<String>,
}

impl RelocationConfigBuilder {
    pub fn max_margin(mut self, margin: usize) -> Self {
        self.max_margin = Some(margin);
        self
    }

    pub fn min_margin(mut self, min_margin: MinMargins) -> Self {
        self.min_margin = Some(min_margin);
        self
    }

    pub fn clamp(mut self, mode: ClampMode) -> Self {
        self.clamp = Some(mode);
        self
    }

    pub fn source_url<S: Into<String>>(mut self, url: S) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn build(self) -> RelocationConfig {
        let default = RelocationConfig::default();
        RelocationConfig {
            max_margin: self.max_margin.unwrap_or(default.max_margin),
            min_margin: self.min_margin.unwrap_or(default.min_margin),
            clamp: self.clamp.unwrap_or(default.clamp),
            source_url: self.source_url.unwrap_or(default.source_url),
        }
    }
}
