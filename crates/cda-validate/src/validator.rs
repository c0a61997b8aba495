//! Graph validation.
//!
//! Two passes over a read-only graph: tally a per-kind census, then confirm
//! that every resolved slot's identifier exists in the declared target
//! kind's partition. Unresolved and failed slots are findings too — by the
//! time a graph reaches validation, every slot should have resolved or been
//! deliberately left null by its mapper.

use std::collections::BTreeSet;

use tracing::info;

use cda_model::{
    CancelToken, DanglingReference, ResourceGraph, ResourceKind, SlotState, ValidationSummary,
};

/// Validate the whole graph in one pass.
pub fn validate(graph: &ResourceGraph) -> ValidationSummary {
    let mut summary = ValidationSummary::default();
    for kind in graph.kinds() {
        summary.merge(validate_kind(graph, kind));
    }
    summary
}

/// Validate a single kind's partition.
///
/// Exposed so long whole-dataset runs can checkpoint kind by kind; see
/// [`validate_with_checkpoint`].
pub fn validate_kind(graph: &ResourceGraph, kind: ResourceKind) -> ValidationSummary {
    let mut summary = ValidationSummary::default();
    summary.counts.insert(kind, graph.kind_len(kind) as u64);
    for resource in graph.resources(kind) {
        for slot in resource.references() {
            let finding = match &slot.state {
                SlotState::Resolved { id } => {
                    if graph.contains(slot.target, *id) {
                        continue;
                    }
                    DanglingReference {
                        source_kind: kind,
                        source_id: resource.id(),
                        slot: slot.slot.clone(),
                        target_kind: slot.target,
                        target_id: Some(*id),
                        reason: format!("{}/{id} not present in graph", slot.target),
                    }
                }
                SlotState::Unresolved { .. } => DanglingReference {
                    source_kind: kind,
                    source_id: resource.id(),
                    slot: slot.slot.clone(),
                    target_kind: slot.target,
                    target_id: None,
                    reason: "slot was never resolved".to_string(),
                },
                SlotState::Failed { reason } => DanglingReference {
                    source_kind: kind,
                    source_id: resource.id(),
                    slot: slot.slot.clone(),
                    target_kind: slot.target,
                    target_id: None,
                    reason: reason.clone(),
                },
            };
            summary.dangling.push(finding);
        }
    }
    summary
}

/// Progress of a checkpointed validation run.
///
/// Completed kinds are not revisited, so an interrupted run resumes where
/// it stopped without recomputing anything.
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct Checkpoint {
    pub completed: BTreeSet<ResourceKind>,
    pub summary: ValidationSummary,
}

impl Checkpoint {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Validate kind by kind, recording progress in `checkpoint`.
///
/// Returns true when every kind present in the graph has been validated;
/// false when cancellation stopped the run at a kind boundary.
pub fn validate_with_checkpoint(
    graph: &ResourceGraph,
    checkpoint: &mut Checkpoint,
    cancel: &CancelToken,
) -> bool {
    for kind in graph.kinds() {
        if checkpoint.completed.contains(&kind) {
            continue;
        }
        if cancel.is_cancelled() {
            info!(%kind, "validation interrupted before kind");
            return false;
        }
        let partial = validate_kind(graph, kind);
        info!(
            %kind,
            resources = graph.kind_len(kind),
            dangling = partial.dangling.len(),
            "validated kind"
        );
        checkpoint.summary.merge(partial);
        checkpoint.completed.insert(kind);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use cda_model::{NaturalKey, ResourceId, TargetResource};

    fn id(seed: u8) -> ResourceId {
        ResourceId::from_sha256([seed; 32])
    }

    fn patient(seed: u8) -> TargetResource {
        TargetResource::new(ResourceKind::Patient, id(seed), Vec::new())
    }

    fn condition_referencing(patient_id: ResourceId) -> TargetResource {
        let mut condition = TargetResource::new(ResourceKind::Condition, id(10), Vec::new());
        condition.request_reference(
            "subject",
            ResourceKind::Patient,
            NaturalKey::single("s", "s1"),
        );
        if let Some(slot) = condition.references_mut().first_mut() {
            slot.state = SlotState::Resolved { id: patient_id };
        }
        condition
    }

    #[test]
    fn complete_graph_validates_clean() {
        let mut graph = ResourceGraph::new();
        graph.insert(patient(1));
        let mut condition = TargetResource::new(ResourceKind::Condition, id(10), Vec::new());
        condition.request_reference(
            "subject",
            ResourceKind::Patient,
            NaturalKey::single("s", "s1"),
        );
        // resolve manually to the existing patient
        if let Some(slot) = condition.references_mut().first_mut() {
            slot.state = SlotState::Resolved { id: id(1) };
        }
        graph.insert(condition);

        let summary = validate(&graph);
        assert_eq!(summary.counts[&ResourceKind::Patient], 1);
        assert_eq!(summary.counts[&ResourceKind::Condition], 1);
        assert!(!summary.has_dangling());
    }

    #[test]
    fn missing_target_is_reported_with_slot_and_id() {
        let mut graph = ResourceGraph::new();
        let mut condition = TargetResource::new(ResourceKind::Condition, id(10), Vec::new());
        condition.request_reference(
            "subject",
            ResourceKind::Patient,
            NaturalKey::single("s", "s1"),
        );
        if let Some(slot) = condition.references_mut().first_mut() {
            slot.state = SlotState::Resolved { id: id(9) };
        }
        graph.insert(condition);

        let summary = validate(&graph);
        assert_eq!(summary.dangling.len(), 1);
        let finding = &summary.dangling[0];
        assert_eq!(finding.slot, "subject");
        assert_eq!(finding.target_kind, ResourceKind::Patient);
        assert_eq!(finding.target_id, Some(id(9)));
    }

    #[test]
    fn unresolved_slot_is_a_finding() {
        let mut graph = ResourceGraph::new();
        let mut condition = TargetResource::new(ResourceKind::Condition, id(10), Vec::new());
        condition.request_reference(
            "subject",
            ResourceKind::Patient,
            NaturalKey::single("s", "s1"),
        );
        graph.insert(condition);
        let summary = validate(&graph);
        assert_eq!(summary.dangling.len(), 1);
        assert_eq!(summary.dangling[0].target_id, None);
    }

    #[test]
    fn checkpoint_resumes_without_recounting() {
        let mut graph = ResourceGraph::new();
        graph.insert(patient(1));
        graph.insert(condition_referencing(id(1)));

        let cancel = CancelToken::new();
        let mut checkpoint = Checkpoint::new();
        // first run validates everything
        assert!(validate_with_checkpoint(&graph, &mut checkpoint, &cancel));
        let counts = checkpoint.summary.counts.clone();
        // second run is a no-op
        assert!(validate_with_checkpoint(&graph, &mut checkpoint, &cancel));
        assert_eq!(checkpoint.summary.counts, counts);
    }

    #[test]
    fn cancelled_validation_stops_at_a_kind_boundary() {
        let mut graph = ResourceGraph::new();
        graph.insert(patient(1));
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut checkpoint = Checkpoint::new();
        assert!(!validate_with_checkpoint(&graph, &mut checkpoint, &cancel));
        assert!(checkpoint.completed.is_empty());
    }
}
