use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use tracing::debug;

use super::PatchGroup;
use crate::error::{Error, Result};

/// Marker written to the metadata `version` field after relocation
pub const UNKNOWN_VERSION: &str = "?";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A recognised group together with the JSON object it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRecord {
    pub group: PatchGroup,
    pub source: Value,
}

impl GroupRecord {
    /// The source object carrying the group's current offsets
    pub fn to_value(&self) -> Value {
        let mut value = self.source.clone();
        self.group.write_offsets(&mut value);
        value
    }
}

/// One element of a patch set after the optional metadata record
#[derive(Debug, Clone, PartialEq)]
pub enum PatchEntry {
    Group(GroupRecord),
    /// An element that is not a recognised patch group; never written back
    Unrecognized { value: Value, reason: String },
}

impl PatchEntry {
    fn from_value(value: Value) -> Self {
        match serde_json::from_value::<PatchGroup>(value.clone()) {
            Ok(group) => Self::Group(GroupRecord {
                group,
                source: value,
            }),
            Err(e) => Self::Unrecognized {
                value,
                reason: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchSet {
    /// Provenance record (`version`, `lastUpdated`, `source`, ...)
    pub metadata: Option<Map<String, Value>>,
    pub entries: Vec<PatchEntry>,
}

impl PatchSet {
    pub fn from_json(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(Error::InvalidPatchSet(
                "Patch set must be a JSON array".to_string(),
            ));
        };

        // Only a leading object with `lastUpdated` is the metadata record
        let has_metadata =
            matches!(items.first(), Some(Value::Object(obj)) if obj.contains_key("lastUpdated"));
        let mut items = items.into_iter();
        let metadata = if has_metadata {
            match items.next() {
                Some(Value::Object(obj)) => Some(obj),
                _ => None,
            }
        } else {
            None
        };

        let entries: Vec<PatchEntry> = items.map(PatchEntry::from_value).collect();
        debug!(
            "Parsed patch set: metadata={}, entries={}",
            metadata.is_some(),
            entries.len()
        );

        Ok(Self { metadata, entries })
    }

    pub fn groups(&self) -> impl Iterator<Item = &PatchGroup> {
        self.entries.iter().filter_map(|entry| match entry {
            PatchEntry::Group(record) => Some(&record.group),
            PatchEntry::Unrecognized { .. } => None,
        })
    }

    pub fn to_value(&self) -> Value {
        let mut items = Vec::with_capacity(self.entries.len() + 1);
        if let Some(metadata) = &self.metadata {
            items.push(Value::Object(metadata.clone()));
        }
        for entry in &self.entries {
            if let PatchEntry::Group(record) = entry {
                items.push(record.to_value());
            }
        }
        Value::Array(items)
    }

    /// Serialize as a JSON array indented with four spaces
    pub fn to_json(&self) -> Result<String> {
        let value = self.to_value();
        let mut out = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
        value.serialize(&mut serializer)?;
        String::from_utf8(out).map_err(|e| Error::InvalidPatchSet(e.to_string()))
    }
}

/// Update provenance fields of a metadata record after relocation.
///
/// Only records that carry `lastUpdated` and `version` are touched; anything
/// else is passed through as-is.
pub fn refresh_metadata(metadata: &mut Map<String, Value>, source_url: &str, now: DateTime<Utc>) {
    if !metadata.contains_key("lastUpdated") || !metadata.contains_key("version") {
        return;
    }
    metadata.insert("version".to_string(), Value::from(UNKNOWN_VERSION));
    metadata.insert(
        "lastUpdated".to_string(),
        Value::from(now.format(TIMESTAMP_FORMAT).to_string()),
    );
    metadata.insert("source".to_string(), Value::from(source_url));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const ROUND_TRIP: &str = r#"[
    {
        "lastUpdated": "2024-01-01 00:00:00",
        "version": "2024010100",
        "source": "https://example.invalid/"
    },
    {
        "type": "memory",
        "name": "Skip intro",
        "gameCode": "LDJ",
        "patches": [
            {
                "offset": 4096,
                "dllName": "bm2dx.dll",
                "dataDisabled": "74 05",
                "dataEnabled": "EB 05"
            }
        ]
    },
    {
        "name": "Timer",
        "type": "number",
        "patch": {
            "dllName": "bm2dx.dll",
            "offset": 32,
            "size": "4",
            "min": 0,
            "max": 99
        }
    }
]"#;

    fn sample() -> Value {
        json!([
            { "version": "2024010100", "lastUpdated": "2024-01-01 00:00:00", "source": "old", "note": "kept" },
            { "type": "memory", "name": "A", "patches": [ { "offset": 1, "dataDisabled": "00" } ] },
            { "name": "no type" },
            { "type": "number", "name": "B", "patch": { "offset": 2, "size": 4 } }
        ])
    }

    #[test]
    fn test_parse_metadata_and_entries() {
        let set = PatchSet::from_value(sample()).unwrap();
        let metadata = set.metadata.as_ref().unwrap();
        assert_eq!(metadata["version"], "2024010100");
        assert_eq!(set.entries.len(), 3);
        assert!(matches!(set.entries[1], PatchEntry::Unrecognized { .. }));
        assert_eq!(set.groups().count(), 2);
    }

    #[test]
    fn test_leading_object_without_last_updated_is_an_entry() {
        let set = PatchSet::from_value(json!([
            { "version": "1", "note": "no timestamp" },
            { "type": "number", "name": "B", "patch": { "offset": 2, "size": 4 } }
        ]))
        .unwrap();
        assert!(set.metadata.is_none());
        assert_eq!(set.entries.len(), 2);
        assert!(matches!(set.entries[0], PatchEntry::Unrecognized { .. }));
        assert_eq!(set.to_value(), json!([
            { "type": "number", "name": "B", "patch": { "offset": 2, "size": 4 } }
        ]));
    }

    #[test]
    fn test_to_json_round_trips_unchanged() {
        let set = PatchSet::from_json(ROUND_TRIP).unwrap();
        assert_eq!(set.to_json().unwrap(), ROUND_TRIP);
    }

    #[test]
    fn test_no_metadata_when_first_is_group() {
        let set = PatchSet::from_value(json!([
            { "type": "number", "name": "B", "patch": { "offset": 2, "size": 4 } }
        ]))
        .unwrap();
        assert!(set.metadata.is_none());
        assert_eq!(set.entries.len(), 1);
    }

    #[test]
    fn test_rejects_non_array() {
        let err = PatchSet::from_value(json!({ "type": "memory" })).unwrap_err();
        assert!(matches!(err, Error::InvalidPatchSet(_)));
    }

    #[test]
    fn test_empty_array() {
        let set = PatchSet::from_json("[]").unwrap();
        assert!(set.metadata.is_none());
        assert!(set.entries.is_empty());
    }

    #[test]
    fn test_unrecognized_entries_not_written() {
        let set = PatchSet::from_value(sample()).unwrap();
        let Value::Array(items) = set.to_value() else {
            panic!("expected array");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["note"], "kept");
        assert_eq!(items[1]["type"], "memory");
        assert_eq!(items[2]["type"], "number");
    }

    #[test]
    fn test_to_json_uses_four_space_indent() {
        let set = PatchSet::from_value(json!([{ "version": "1", "lastUpdated": "x" }])).unwrap();
        let text = set.to_json().unwrap();
        assert!(text.contains("\n        \"version\": \"1\""));
    }

    #[test]
    fn test_refresh_metadata() {
        let mut metadata = sample()[0].as_object().unwrap().clone();
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();

        refresh_metadata(&mut metadata, "https://example.invalid/", now);
        assert_eq!(metadata["version"], "?");
        assert_eq!(metadata["lastUpdated"], "2026-03-04 05:06:07");
        assert_eq!(metadata["source"], "https://example.invalid/");
        assert_eq!(metadata["note"], "kept");
    }

    #[test]
    fn test_refresh_metadata_requires_both_fields() {
        let mut metadata = json!({ "lastUpdated": "x" }).as_object().unwrap().clone();
        refresh_metadata(&mut metadata, "url", Utc::now());
        assert_eq!(metadata["lastUpdated"], "x");
        assert!(!metadata.contains_key("source"));
    }
}
