use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// The closed set of FHIR resource kinds this engine emits.
///
/// Dispatch on record type is a `match` over this enum, so adding a kind
/// forces every mapper and the validator to handle it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum ResourceKind {
    Patient,
    ResearchSubject,
    ResearchStudy,
    Specimen,
    BodyStructure,
    Condition,
    Observation,
    Medication,
    Substance,
    SubstanceDefinition,
    MedicationAdministration,
    DocumentReference,
    Group,
}

impl ResourceKind {
    /// All kinds in emission order.
    pub const ALL: [ResourceKind; 13] = [
        ResourceKind::Patient,
        ResourceKind::ResearchSubject,
        ResourceKind::ResearchStudy,
        ResourceKind::Specimen,
        ResourceKind::BodyStructure,
        ResourceKind::Condition,
        ResourceKind::Observation,
        ResourceKind::Medication,
        ResourceKind::Substance,
        ResourceKind::SubstanceDefinition,
        ResourceKind::MedicationAdministration,
        ResourceKind::DocumentReference,
        ResourceKind::Group,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Patient => "Patient",
            ResourceKind::ResearchSubject => "ResearchSubject",
            ResourceKind::ResearchStudy => "ResearchStudy",
            ResourceKind::Specimen => "Specimen",
            ResourceKind::BodyStructure => "BodyStructure",
            ResourceKind::Condition => "Condition",
            ResourceKind::Observation => "Observation",
            ResourceKind::Medication => "Medication",
            ResourceKind::Substance => "Substance",
            ResourceKind::SubstanceDefinition => "SubstanceDefinition",
            ResourceKind::MedicationAdministration => "MedicationAdministration",
            ResourceKind::DocumentReference => "DocumentReference",
            ResourceKind::Group => "Group",
        }
    }

    /// File name used for newline-delimited emission, e.g. `Patient.ndjson`.
    pub fn file_name(self) -> String {
        format!("{}.ndjson", self.as_str())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| ModelError::UnknownKind(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!("Encounter".parse::<ResourceKind>().is_err());
    }
}
