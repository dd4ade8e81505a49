//! Result Aggregator
//!
//! Folds per-item outcomes into a two-level structure, grouping key to status tag
//! to ordered payloads, and merges aggregates from separate passes. Aggregates only
//! grow: merging unions the tag buckets of overlapping groups and never overwrites.
//! Groups and tags iterate in sorted order, so presentation does not depend on the
//! order in which workers completed.

use crate::outcome::{ItemReport, OutcomeTag, Payload};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status tag to payloads for one group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBuckets {
    buckets: BTreeMap<OutcomeTag, Vec<Payload>>,
}

impl StatusBuckets {
    /// Bucket for `tag`, created empty on first use.
    pub fn bucket_mut(&mut self, tag: OutcomeTag) -> &mut Vec<Payload> {
        self.buckets.entry(tag).or_default()
    }

    pub fn get(&self, tag: OutcomeTag) -> &[Payload] {
        self.buckets.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, tag: OutcomeTag) -> usize {
        self.get(tag).len()
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OutcomeTag, &[Payload])> {
        self.buckets.iter().map(|(tag, items)| (*tag, items.as_slice()))
    }

    fn absorb(&mut self, other: StatusBuckets) {
        for (tag, items) in other.buckets {
            self.bucket_mut(tag).extend(items);
        }
    }
}

/// Grouping key to status buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    groups: BTreeMap<String, StatusBuckets>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold<I>(reports: I) -> Self
    where
        I: IntoIterator<Item = ItemReport>,
    {
        let mut aggregate = Self::new();
        for report in reports {
            aggregate.record(report);
        }
        aggregate
    }

    /// Buckets for `group`, created empty on first use.
    pub fn group_mut(&mut self, group: &str) -> &mut StatusBuckets {
        self.groups.entry(group.to_string()).or_default()
    }

    pub fn record(&mut self, report: ItemReport) {
        let tag = report.outcome.tag();
        let payload = report.outcome.payload();
        self.group_mut(&report.group).bucket_mut(tag).push(payload);
    }

    /// Additive merge: every bucket from both sides survives.
    pub fn merge(mut self, other: Aggregate) -> Aggregate {
        for (group, buckets) in other.groups {
            self.group_mut(&group).absorb(buckets);
        }
        self
    }

    pub fn get(&self, group: &str) -> Option<&StatusBuckets> {
        self.groups.get(group)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &StatusBuckets)> {
        self.groups.iter().map(|(group, buckets)| (group.as_str(), buckets))
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Number of payloads across all groups and tags.
    pub fn total(&self) -> usize {
        self.groups.values().map(StatusBuckets::total).sum()
    }

    pub fn count(&self, tag: OutcomeTag) -> usize {
        self.groups.values().map(|b| b.count(tag)).sum()
    }

    /// Counts per tag per group for the given columns, plus a totals row.
    pub fn summary(&self, columns: &[OutcomeTag]) -> SummaryTable {
        let rows: Vec<SummaryRow> = self
            .groups
            .iter()
            .map(|(group, buckets)| SummaryRow {
                group: group.clone(),
                counts: columns.iter().map(|tag| buckets.count(*tag)).collect(),
            })
            .collect();
        let totals = SummaryRow {
            group: "Total".to_string(),
            counts: (0..columns.len())
                .map(|i| rows.iter().map(|row| row.counts[i]).sum())
                .collect(),
        };
        SummaryTable {
            columns: columns.to_vec(),
            rows,
            totals,
        }
    }

    /// Flat records for external serialization, one per payload.
    pub fn export_records(&self) -> Vec<ExportRecord> {
        let mut records = Vec::with_capacity(self.total());
        for (group, buckets) in &self.groups {
            for (tag, items) in buckets.iter() {
                for payload in items {
                    let error = if tag.carries_error() {
                        payload.detail.clone().unwrap_or_default()
                    } else {
                        String::new()
                    };
                    records.push(ExportRecord {
                        subscription: group.clone(),
                        status: tag.as_str().to_string(),
                        snapshot: payload.name.clone(),
                        error,
                    });
                }
            }
        }
        records
    }

    /// Groups that hold any of the given tags, with just those buckets.
    pub fn problems(&self, tags: &[OutcomeTag]) -> Vec<(&str, Vec<(OutcomeTag, &[Payload])>)> {
        self.groups
            .iter()
            .filter_map(|(group, buckets)| {
                let found: Vec<(OutcomeTag, &[Payload])> = tags
                    .iter()
                    .map(|tag| (*tag, buckets.get(*tag)))
                    .filter(|(_, items)| !items.is_empty())
                    .collect();
                (!found.is_empty()).then_some((group.as_str(), found))
            })
            .collect()
    }
}

/// Generic tabular summary handed to presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub columns: Vec<OutcomeTag>,
    pub rows: Vec<SummaryRow>,
    pub totals: SummaryRow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub group: String,
    pub counts: Vec<usize>,
}

/// One exported row: `Subscription, Status, Snapshot, Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    #[serde(rename = "Subscription")]
    pub subscription: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Snapshot")]
    pub snapshot: String,
    #[serde(rename = "Error")]
    pub error: String,
}
