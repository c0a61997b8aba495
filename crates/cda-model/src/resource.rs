use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::error::ModelError;
use crate::ids::{IdentifierEntry, NaturalKey, ResourceId};
use crate::kind::ResourceKind;

/// The state of one outbound reference slot.
///
/// Slots are created `Unresolved` by a mapper, rewritten to `Resolved` by the
/// resolver, or marked `Failed` when the carried key cannot mint an
/// identifier. Failed slots survive to validation rather than raising.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SlotState {
    Unresolved { key: NaturalKey },
    Resolved { id: ResourceId },
    Failed { reason: String },
}

/// One outbound reference from a resource to another kind.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReferenceSlot {
    pub slot: String,
    pub target: ResourceKind,
    pub state: SlotState,
}

impl ReferenceSlot {
    pub fn unresolved(
        slot: impl Into<String>,
        target: ResourceKind,
        key: NaturalKey,
    ) -> Self {
        Self {
            slot: slot.into(),
            target,
            state: SlotState::Unresolved { key },
        }
    }

    pub fn resolved(slot: impl Into<String>, target: ResourceKind, id: ResourceId) -> Self {
        Self {
            slot: slot.into(),
            target,
            state: SlotState::Resolved { id },
        }
    }

    pub fn resolved_id(&self) -> Option<ResourceId> {
        match self.state {
            SlotState::Resolved { id } => Some(id),
            _ => None,
        }
    }
}

/// A mapped FHIR resource: kind, stable id, business identifiers, scalar
/// fields, and outbound reference slots.
///
/// Created by exactly one mapper invocation; only the resolver writes to it
/// afterwards, and only to rewrite slot states.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetResource {
    kind: ResourceKind,
    id: ResourceId,
    identifier: Vec<IdentifierEntry>,
    fields: BTreeMap<String, Value>,
    references: Vec<ReferenceSlot>,
}

impl TargetResource {
    pub fn new(kind: ResourceKind, id: ResourceId, identifier: Vec<IdentifierEntry>) -> Self {
        Self {
            kind,
            id,
            identifier,
            fields: BTreeMap::new(),
            references: Vec::new(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn identifier(&self) -> &[IdentifierEntry] {
        &self.identifier
    }

    pub fn push_identifier(&mut self, entry: IdentifierEntry) {
        if !self.identifier.contains(&entry) {
            self.identifier.push(entry);
        }
    }

    /// Set a scalar field; nulls are dropped so emitted lines stay sparse.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        if !value.is_null() {
            self.fields.insert(name.into(), value);
        }
    }

    pub fn set_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), Value::String(value.into()));
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Attach an unresolved reference request to be rewritten later.
    pub fn request_reference(
        &mut self,
        slot: impl Into<String>,
        target: ResourceKind,
        key: NaturalKey,
    ) {
        self.references
            .push(ReferenceSlot::unresolved(slot, target, key));
    }

    pub fn references(&self) -> &[ReferenceSlot] {
        &self.references
    }

    pub fn references_mut(&mut self) -> &mut [ReferenceSlot] {
        &mut self.references
    }

    pub fn reference(&self, slot: &str) -> Option<&ReferenceSlot> {
        self.references.iter().find(|r| r.slot == slot)
    }

    /// Render as the self-contained JSON object emitted on an ndjson line.
    ///
    /// Only resolved slots appear; a slot name carried by more than one slot
    /// renders as an array. Key order is the map's sorted order, which keeps
    /// repeated runs byte-identical.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert(
            "resourceType".to_string(),
            Value::String(self.kind.as_str().to_string()),
        );
        out.insert("id".to_string(), Value::String(self.id.to_string()));
        if !self.identifier.is_empty() {
            out.insert(
                "identifier".to_string(),
                serde_json::to_value(&self.identifier).unwrap_or(Value::Null),
            );
        }
        for (name, value) in &self.fields {
            out.insert(name.clone(), value.clone());
        }
        let mut grouped: Vec<(String, Vec<Value>)> = Vec::new();
        for slot in &self.references {
            let Some(id) = slot.resolved_id() else {
                continue;
            };
            let rendered = json!({ "reference": format!("{}/{}", slot.target, id) });
            match grouped.iter_mut().find(|(name, _)| *name == slot.slot) {
                Some((_, values)) => values.push(rendered),
                None => grouped.push((slot.slot.clone(), vec![rendered])),
            }
        }
        for (name, mut values) in grouped {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            out.insert(name, value);
        }
        Value::Object(out)
    }

    /// Rebuild a resource from an emitted line.
    ///
    /// Any object holding a single `reference` of the form `Kind/uuid` (or an
    /// array of such objects) is read back as resolved slots; everything else
    /// stays a scalar field.
    pub fn from_json(value: &Value) -> Result<Self, ModelError> {
        let object = value
            .as_object()
            .ok_or_else(|| ModelError::MalformedResource("line is not an object".to_string()))?;
        let kind: ResourceKind = object
            .get("resourceType")
            .and_then(Value::as_str)
            .ok_or_else(|| ModelError::MalformedResource("missing resourceType".to_string()))?
            .parse()?;
        let id = object
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| ResourceId::parse(s).ok())
            .ok_or_else(|| ModelError::MalformedResource("missing or malformed id".to_string()))?;
        let identifier = object
            .get("identifier")
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(|e| ModelError::MalformedResource(e.to_string()))?
            .unwrap_or_default();

        let mut resource = TargetResource::new(kind, id, identifier);
        for (name, field) in object {
            if matches!(name.as_str(), "resourceType" | "id" | "identifier") {
                continue;
            }
            match parse_references(field) {
                Some(targets) => {
                    for (target, target_id) in targets {
                        resource
                            .references
                            .push(ReferenceSlot::resolved(name.clone(), target, target_id));
                    }
                }
                None => resource.set_field(name.clone(), field.clone()),
            }
        }
        Ok(resource)
    }
}

fn parse_reference(value: &Value) -> Option<(ResourceKind, ResourceId)> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    let reference = object.get("reference")?.as_str()?;
    let (kind, id) = reference.split_once('/')?;
    Some((kind.parse().ok()?, ResourceId::parse(id).ok()?))
}

fn parse_references(value: &Value) -> Option<Vec<(ResourceKind, ResourceId)>> {
    if let Some(single) = parse_reference(value) {
        return Some(vec![single]);
    }
    let items = value.as_array()?;
    if items.is_empty() {
        return None;
    }
    items.iter().map(parse_reference).collect()
}
