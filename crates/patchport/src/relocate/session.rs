use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{GroupFailure, GroupMatcher, MarginResolver, Relocation};
use crate::config::RelocationConfig;
use crate::module::ModuleBuffer;
use crate::patch::{GroupKind, GroupRecord, PatchEntry, PatchGroup, PatchSet, refresh_metadata};

#[derive(Debug, Clone, PartialEq)]
pub enum GroupOutcome {
    Relocated(Vec<Relocation>),
    Failed(GroupFailure),
}

/// What happened to one entry of the input patch set
#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult {
    /// `None` for entries that are not a recognised group
    pub kind: Option<GroupKind>,
    pub name: String,
    pub outcome: GroupOutcome,
}

impl GroupResult {
    pub fn is_relocated(&self) -> bool {
        matches!(self.outcome, GroupOutcome::Relocated(_))
    }

    pub fn failure(&self) -> Option<&GroupFailure> {
        match &self.outcome {
            GroupOutcome::Failed(failure) => Some(failure),
            GroupOutcome::Relocated(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelocationReport {
    /// Metadata plus every relocated group, in input order
    pub output: PatchSet,
    pub results: Vec<GroupResult>,
}

impl RelocationReport {
    pub fn relocated(&self) -> usize {
        self.results.iter().filter(|r| r.is_relocated()).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Relocated share in percent; 0 for an empty patch set
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.relocated() as f64 / self.total() as f64 * 100.0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&GroupResult, &GroupFailure)> {
        self.results
            .iter()
            .filter_map(|result| result.failure().map(|failure| (result, failure)))
    }
}

/// Relocates a patch set from one module build to another.
///
/// Both modules stay in memory for the lifetime of the session.
#[derive(Debug)]
pub struct RelocationSession {
    old: ModuleBuffer,
    new: ModuleBuffer,
    config: RelocationConfig,
}

impl RelocationSession {
    pub fn new(old: ModuleBuffer, new: ModuleBuffer, config: RelocationConfig) -> Self {
        Self { old, new, config }
    }

    pub fn old_module(&self) -> &ModuleBuffer {
        &self.old
    }

    pub fn new_module(&self) -> &ModuleBuffer {
        &self.new
    }

    pub fn config(&self) -> &RelocationConfig {
        &self.config
    }

    pub fn resolver(&self) -> MarginResolver<'_> {
        MarginResolver::new(&self.old, &self.new, self.config.max_margin)
            .with_clamp(self.config.clamp)
    }

    pub fn relocate(&self, set: PatchSet) -> RelocationReport {
        self.relocate_at(set, Utc::now())
    }

    /// Relocate every group in order; `now` stamps the metadata record.
    pub fn relocate_at(&self, set: PatchSet, now: DateTime<Utc>) -> RelocationReport {
        let matcher = GroupMatcher::new(self.resolver(), self.config.min_margin);
        let PatchSet { metadata, entries } = set;

        let metadata = metadata.map(|mut metadata| {
            refresh_metadata(&mut metadata, &self.config.source_url, now);
            metadata
        });

        info!("{} patches loaded, searching...", entries.len());
        let mut output = Vec::new();
        let mut results = Vec::with_capacity(entries.len());

        for entry in entries {
            let GroupRecord { group, source } = match entry {
                PatchEntry::Group(record) => record,
                PatchEntry::Unrecognized { value, reason } => {
                    let name = value
                        .get("name")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    warn!("Skipping unrecognized entry '{}': {}", name, reason);
                    results.push(GroupResult {
                        kind: None,
                        name,
                        outcome: GroupOutcome::Failed(GroupFailure::Unrecognized(reason)),
                    });
                    continue;
                }
            };

            let kind = group.kind();
            let name = group.name().to_string();
            debug!("[{}] '{}'", kind, name);

            let result = match group {
                PatchGroup::Memory(g) => matcher.relocate_memory(g),
                PatchGroup::Union(g) => matcher.relocate_union(g),
                PatchGroup::Number(g) => matcher.relocate_number(g),
            };

            let outcome = match result {
                Ok(relocated) => {
                    debug!("[{}] '{}' found", kind, name);
                    for m in &relocated.moves {
                        debug!("  0x{:X} -> 0x{:X} (margin {})", m.from, m.to, m.margin);
                    }
                    output.push(PatchEntry::Group(GroupRecord {
                        group: relocated.group,
                        source,
                    }));
                    GroupOutcome::Relocated(relocated.moves)
                }
                Err(failure) => {
                    debug!("[{}] '{}' {}", kind, name, failure);
                    GroupOutcome::Failed(failure)
                }
            };

            results.push(GroupResult {
                kind: Some(kind),
                name,
                outcome,
            });
        }

        let report = RelocationReport {
            output: PatchSet {
                metadata,
                entries: output,
            },
            results,
        };
        debug!(
            "Results: [{}/{}] found, {:.2}% success rate",
            report.relocated(),
            report.total(),
            report.success_rate()
        );
        report
    }
}
