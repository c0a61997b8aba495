//! Identifier minting.
//!
//! `mint_id` is the one place identifiers come from: a pure function of
//! (kind, natural key), realized as a domain-separated sha256 digest rendered
//! in UUID shape. Both mapping and reference resolution call it, which is
//! what lets resolution recompute a target's identifier without the target
//! resource in hand.

use sha2::{Digest, Sha256};

use cda_model::{NaturalKey, ResourceId, ResourceKind, TransformError};

/// Namespace mixed into every digest.
const NAMESPACE: &str = "cda.readthedocs.io";

/// Project tag mixed into every digest, after the namespace.
const PROJECT: &str = "CDA";

/// Identifier systems used for natural keys, one per source vocabulary.
pub mod systems {
    pub const BASE: &str = "https://cda.readthedocs.io";

    pub fn system(field: &str) -> String {
        format!("{BASE}/{field}")
    }

    pub const DBGAP: &str = "https://www.ncbi.nlm.nih.gov/dbgap_accession_number";
}

/// Mint the stable identifier for `kind` under `key`.
///
/// Fails with `InvalidKey` when the key has no usable components; a kind
/// that cannot construct a natural key must not receive an identifier.
pub fn mint_id(kind: ResourceKind, key: &NaturalKey) -> Result<ResourceId, TransformError> {
    if key.is_blank() {
        return Err(TransformError::invalid_key(
            kind,
            format!("natural key under `{}` has no usable components", key.system),
        ));
    }
    let mut hasher = Sha256::new();
    hasher.update(NAMESPACE.as_bytes());
    hasher.update([0u8]);
    hasher.update(PROJECT.as_bytes());
    hasher.update([0u8]);
    hasher.update(kind.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(key.canonical().as_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    Ok(ResourceId::from_sha256(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn blank_keys_are_rejected() {
        let key = NaturalKey::new(systems::system("subject_id"), ["  ", ""]);
        assert!(matches!(
            mint_id(ResourceKind::Patient, &key),
            Err(TransformError::InvalidKey { .. })
        ));
    }

    proptest! {
        #[test]
        fn minting_is_deterministic(value in "[a-zA-Z0-9.-]{1,40}") {
            let key = NaturalKey::single(systems::system("subject_id"), &value);
            let a = mint_id(ResourceKind::Patient, &key).unwrap();
            let b = mint_id(ResourceKind::Patient, &key).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn kinds_are_domain_separated(value in "[a-zA-Z0-9.-]{1,40}") {
            let key = NaturalKey::single(systems::system("subject_id"), &value);
            let patient = mint_id(ResourceKind::Patient, &key).unwrap();
            let specimen = mint_id(ResourceKind::Specimen, &key).unwrap();
            prop_assert_ne!(patient, specimen);
        }

        #[test]
        fn component_boundaries_matter(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
            prop_assume!(!a.is_empty() && !b.is_empty());
            let joined = NaturalKey::single("s", format!("{a}{b}"));
            let split = NaturalKey::new("s", [a, b]);
            let lhs = mint_id(ResourceKind::Condition, &joined).unwrap();
            let rhs = mint_id(ResourceKind::Condition, &split).unwrap();
            prop_assert_ne!(lhs, rhs);
        }
    }
}
