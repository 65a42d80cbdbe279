//! Patch group shapes as they appear in patch set files.
//!
//! The typed model only reads what relocation needs. Output is produced by
//! writing new offsets into the JSON object a group was read from, so every
//! other key keeps its value and position.

use serde::Deserialize;
use serde::de::{self, Deserializer};
use serde_json::Value;
use strum::Display;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum GroupKind {
    Memory,
    Union,
    Number,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PatchGroup {
    /// Independent records, each relocated on its own
    Memory(MemoryGroup),
    /// Alternatives that all overwrite the same bytes
    Union(UnionGroup),
    /// A single value of explicit size
    Number(NumberGroup),
}

impl PatchGroup {
    pub fn kind(&self) -> GroupKind {
        match self {
            Self::Memory(_) => GroupKind::Memory,
            Self::Union(_) => GroupKind::Union,
            Self::Number(_) => GroupKind::Number,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Memory(g) => &g.name,
            Self::Union(g) => &g.name,
            Self::Number(g) => &g.name,
        }
    }

    /// Copy this group's offsets into `target`, the object it was read from.
    ///
    /// Records whose offset is unchanged are left untouched.
    pub fn write_offsets(&self, target: &mut Value) {
        match self {
            Self::Memory(g) => {
                for (patch, record) in g.patches.iter().zip(records_mut(target)) {
                    set_offset(record, patch.offset);
                }
            }
            Self::Union(g) => {
                for (entry, record) in g.patches.iter().zip(records_mut(target)) {
                    if let Some(patch) = record.get_mut("patch") {
                        set_offset(patch, entry.patch.offset);
                    }
                }
            }
            Self::Number(g) => {
                if let Some(patch) = target.get_mut("patch") {
                    set_offset(patch, g.patch.offset);
                }
            }
        }
    }
}

fn records_mut(group: &mut Value) -> impl Iterator<Item = &mut Value> {
    group
        .get_mut("patches")
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
}

fn set_offset(record: &mut Value, offset: u64) {
    let Some(obj) = record.as_object_mut() else {
        return;
    };
    if obj.get("offset").and_then(Value::as_u64) != Some(offset) {
        obj.insert("offset".to_string(), Value::from(offset));
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemoryGroup {
    #[serde(default)]
    pub name: String,
    pub patches: Vec<MemoryPatch>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemoryPatch {
    pub offset: u64,
    /// Original bytes at `offset`; only the length matters for relocation
    #[serde(rename = "dataDisabled")]
    pub data_disabled: String,
}

impl MemoryPatch {
    pub fn payload_len(&self) -> Result<usize> {
        hex_len(&self.data_disabled)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnionGroup {
    #[serde(default)]
    pub name: String,
    pub patches: Vec<UnionEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnionEntry {
    #[serde(default)]
    pub name: String,
    pub patch: UnionPatch,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnionPatch {
    pub offset: u64,
    pub data: String,
}

impl UnionPatch {
    pub fn payload_len(&self) -> Result<usize> {
        hex_len(&self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NumberGroup {
    #[serde(default)]
    pub name: String,
    pub patch: NumberPatch,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NumberPatch {
    pub offset: u64,
    /// Byte width of the value; files carry it either as a number or a string
    #[serde(deserialize_with = "number_or_string")]
    pub size: usize,
}

/// Decoded length of a hex string such as `"74 05"` or `"7405"`
pub fn hex_len(hex_str: &str) -> Result<usize> {
    let compact: String = hex_str.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&compact)
        .map(|bytes| bytes.len())
        .map_err(|e| Error::InvalidPatchSet(format!("Invalid hex data '{}': {}", hex_str, e)))
}

fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .map(|v| v as usize)
            .ok_or_else(|| de::Error::custom(format!("invalid size: {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|e| de::Error::custom(format!("invalid size '{}': {}", s, e))),
        other => Err(de::Error::custom(format!("invalid size: {}", other))),
    }
}
