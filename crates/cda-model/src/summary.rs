use std::collections::BTreeMap;

use crate::ids::ResourceId;
use crate::kind::ResourceKind;

/// One reference that does not land on a resource present in the graph.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DanglingReference {
    pub source_kind: ResourceKind,
    pub source_id: ResourceId,
    pub slot: String,
    pub target_kind: ResourceKind,
    /// Resolved id that was not found; absent when the slot never resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<ResourceId>,
    pub reason: String,
}

/// Per-kind census plus the dangling-reference findings of one validation
/// pass over a graph.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValidationSummary {
    pub counts: BTreeMap<ResourceKind, u64>,
    pub dangling: Vec<DanglingReference>,
}

impl ValidationSummary {
    pub fn has_dangling(&self) -> bool {
        !self.dangling.is_empty()
    }

    pub fn total_resources(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Fold another partial summary into this one (checkpointed validation
    /// accumulates kind by kind).
    pub fn merge(&mut self, other: ValidationSummary) {
        for (kind, count) in other.counts {
            *self.counts.entry(kind).or_insert(0) += count;
        }
        self.dangling.extend(other.dangling);
    }
}
