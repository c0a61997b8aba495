use std::collections::{BTreeMap, BTreeSet};

use crate::ids::ResourceId;
use crate::kind::ResourceKind;
use crate::resource::TargetResource;

/// The complete collection of mapped resources, partitioned by kind.
///
/// Insertion order is preserved per kind; identifiers are unique within a
/// kind (a second insert of the same id is a no-op, mirroring the dedup the
/// source aggregator's overlapping extracts require).
#[derive(Debug, Default, Clone)]
pub struct ResourceGraph {
    partitions: BTreeMap<ResourceKind, Vec<TargetResource>>,
    ids: BTreeMap<ResourceKind, BTreeSet<ResourceId>>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource, returning false when its id was already present.
    pub fn insert(&mut self, resource: TargetResource) -> bool {
        let kind = resource.kind();
        if !self.ids.entry(kind).or_default().insert(resource.id()) {
            return false;
        }
        self.partitions.entry(kind).or_default().push(resource);
        true
    }

    pub fn extend(&mut self, resources: impl IntoIterator<Item = TargetResource>) {
        for resource in resources {
            self.insert(resource);
        }
    }

    pub fn contains(&self, kind: ResourceKind, id: ResourceId) -> bool {
        self.ids.get(&kind).is_some_and(|ids| ids.contains(&id))
    }

    pub fn resources(&self, kind: ResourceKind) -> &[TargetResource] {
        self.partitions.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Kinds holding at least one resource, in enum order.
    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.partitions.keys().copied()
    }

    pub fn kind_len(&self, kind: ResourceKind) -> usize {
        self.partitions.get(&kind).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.partitions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetResource> {
        self.partitions.values().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TargetResource> {
        self.partitions.values_mut().flatten()
    }

    /// Per-kind counts in a deterministic order.
    pub fn counts(&self) -> BTreeMap<ResourceKind, u64> {
        self.partitions
            .iter()
            .map(|(kind, resources)| (*kind, resources.len() as u64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(kind: ResourceKind, seed: u8) -> TargetResource {
        TargetResource::new(kind, ResourceId::from_sha256([seed; 32]), Vec::new())
    }

    #[test]
    fn duplicate_ids_within_a_kind_are_dropped() {
        let mut graph = ResourceGraph::new();
        assert!(graph.insert(resource(ResourceKind::Patient, 1)));
        assert!(!graph.insert(resource(ResourceKind::Patient, 1)));
        assert_eq!(graph.kind_len(ResourceKind::Patient), 1);
    }

    #[test]
    fn same_id_in_different_kinds_is_allowed() {
        let mut graph = ResourceGraph::new();
        assert!(graph.insert(resource(ResourceKind::Patient, 1)));
        assert!(graph.insert(resource(ResourceKind::Specimen, 1)));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn insertion_order_is_preserved_per_kind() {
        let mut graph = ResourceGraph::new();
        graph.insert(resource(ResourceKind::Patient, 2));
        graph.insert(resource(ResourceKind::Patient, 1));
        let ids: Vec<_> = graph
            .resources(ResourceKind::Patient)
            .iter()
            .map(|r| r.id())
            .collect();
        assert_eq!(
            ids,
            vec![
                ResourceId::from_sha256([2; 32]),
                ResourceId::from_sha256([1; 32])
            ]
        );
    }
}
