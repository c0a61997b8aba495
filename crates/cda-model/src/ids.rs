use std::fmt;

use uuid::Uuid;

/// A stable resource identifier.
///
/// Minted from the first 16 bytes of a domain-separated sha256 digest and
/// rendered in RFC 4122 shape, so the same (kind, natural key) pair yields
/// the same identifier across runs and processes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ResourceId(Uuid);

impl ResourceId {
    pub fn from_sha256(digest: [u8; 32]) -> Self {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Self(uuid::Builder::from_custom_bytes(bytes).into_uuid())
    }

    pub fn parse(value: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(value).map(Self)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The source field values that determine a resource's identity.
///
/// `system` names the vocabulary the components come from (one per kind, in
/// the `https://cda.readthedocs.io/...` family); `components` hold the raw
/// values. A key may be constructed with blank components — minting is where
/// that is rejected — so a malformed reference can be carried on a slot and
/// reported instead of raised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct NaturalKey {
    pub system: String,
    pub components: Vec<String>,
}

impl NaturalKey {
    pub fn new(
        system: impl Into<String>,
        components: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            system: system.into(),
            components: components.into_iter().map(Into::into).collect(),
        }
    }

    /// Single-component convenience constructor.
    pub fn single(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(system, [value])
    }

    /// True when no component carries a usable value.
    pub fn is_blank(&self) -> bool {
        self.components.iter().all(|c| c.trim().is_empty())
    }

    /// Canonical `system|component|...` rendering hashed during minting.
    pub fn canonical(&self) -> String {
        let mut out = self.system.clone();
        for component in &self.components {
            out.push('|');
            out.push_str(component.trim());
        }
        out
    }

    /// The value half of the FHIR identifier entry derived from this key.
    pub fn identifier_value(&self) -> String {
        self.components
            .iter()
            .map(|c| c.trim())
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// One entry of a resource's business-identifier list.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IdentifierEntry {
    pub system: String,
    pub value: String,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub r#use: Option<String>,
}

impl IdentifierEntry {
    pub fn new(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            value: value.into(),
            r#use: None,
        }
    }

    pub fn secondary(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            value: value.into(),
            r#use: Some("secondary".to_string()),
        }
    }
}

impl From<&NaturalKey> for IdentifierEntry {
    fn from(key: &NaturalKey) -> Self {
        IdentifierEntry::new(key.system.clone(), key.identifier_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection_ignores_whitespace() {
        assert!(NaturalKey::new("s", ["  ", ""]).is_blank());
        assert!(!NaturalKey::new("s", [" x "]).is_blank());
        assert!(NaturalKey::new("s", Vec::<String>::new()).is_blank());
    }

    #[test]
    fn canonical_separates_components() {
        let a = NaturalKey::new("s", ["ab", "c"]);
        let b = NaturalKey::new("s", ["a", "bc"]);
        assert_ne!(a.canonical(), b.canonical());
    }

    #[test]
    fn resource_id_keeps_uuid_shape() {
        let id = ResourceId::from_sha256([7u8; 32]);
        let rendered = id.to_string();
        assert_eq!(rendered.len(), 36);
        assert_eq!(ResourceId::parse(&rendered).unwrap(), id);
    }
}
