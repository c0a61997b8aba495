//! Reference resolution.
//!
//! Rewrites every unresolved slot by recomputing the target identifier from
//! the carried natural key — never by looking the target up. Because
//! identifiers are pure functions of (kind, key), resolution is independent
//! per resource and runs in parallel with no shared state. Malformed keys
//! mark the slot failed; validation is the authoritative integrity check.

use rayon::iter::{ParallelBridge, ParallelIterator};
use tracing::{debug, warn};

use cda_model::{ResourceGraph, SlotState, TargetResource};

use crate::ids::mint_id;

/// Slot counts from one resolution pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionReport {
    pub resolved: u64,
    pub failed: u64,
}

/// Resolve every slot in the graph. Requires mapping to have completed for
/// the whole batch; this is the one barrier between the two phases.
pub fn resolve(graph: &mut ResourceGraph) -> ResolutionReport {
    let (resolved, failed) = graph
        .iter_mut()
        .par_bridge()
        .map(resolve_resource)
        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));
    if failed > 0 {
        warn!(failed, "reference slots could not be resolved");
    }
    debug!(resolved, "resolution pass complete");
    ResolutionReport { resolved, failed }
}

fn resolve_resource(resource: &mut TargetResource) -> (u64, u64) {
    let mut resolved = 0;
    let mut failed = 0;
    for slot in resource.references_mut() {
        let SlotState::Unresolved { key } = &slot.state else {
            continue;
        };
        match mint_id(slot.target, key) {
            Ok(id) => {
                slot.state = SlotState::Resolved { id };
                resolved += 1;
            }
            Err(error) => {
                slot.state = SlotState::Failed {
                    reason: error.to_string(),
                };
                failed += 1;
            }
        }
    }
    (resolved, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cda_model::{NaturalKey, ResourceId, ResourceKind, TargetResource};

    use crate::mappers::keys;

    #[test]
    fn resolution_matches_direct_minting() {
        let mut graph = ResourceGraph::new();
        let mut condition = TargetResource::new(
            ResourceKind::Condition,
            ResourceId::from_sha256([1; 32]),
            Vec::new(),
        );
        condition.request_reference("subject", ResourceKind::Patient, keys::patient("S1"));
        graph.insert(condition);

        let report = resolve(&mut graph);
        assert_eq!(report, ResolutionReport { resolved: 1, failed: 0 });

        let expected = mint_id(ResourceKind::Patient, &keys::patient("S1")).unwrap();
        let resolved = graph.resources(ResourceKind::Condition)[0]
            .reference("subject")
            .and_then(cda_model::ReferenceSlot::resolved_id);
        assert_eq!(resolved, Some(expected));
    }

    #[test]
    fn blank_keys_mark_the_slot_failed() {
        let mut graph = ResourceGraph::new();
        let mut condition = TargetResource::new(
            ResourceKind::Condition,
            ResourceId::from_sha256([1; 32]),
            Vec::new(),
        );
        condition.request_reference(
            "subject",
            ResourceKind::Patient,
            NaturalKey::single("s", "   "),
        );
        graph.insert(condition);

        let report = resolve(&mut graph);
        assert_eq!(report.failed, 1);
        assert!(matches!(
            graph.resources(ResourceKind::Condition)[0].references()[0].state,
            SlotState::Failed { .. }
        ));
    }

    #[test]
    fn resolution_is_idempotent() {
        let mut graph = ResourceGraph::new();
        let mut condition = TargetResource::new(
            ResourceKind::Condition,
            ResourceId::from_sha256([1; 32]),
            Vec::new(),
        );
        condition.request_reference("subject", ResourceKind::Patient, keys::patient("S1"));
        graph.insert(condition);
        resolve(&mut graph);
        let first = graph.resources(ResourceKind::Condition)[0].clone();
        let report = resolve(&mut graph);
        assert_eq!(report.resolved, 0);
        assert_eq!(graph.resources(ResourceKind::Condition)[0], first);
    }
}
