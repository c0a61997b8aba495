use serde_json::{Map, Value};

/// One untyped row read from a CDA source table.
///
/// Immutable once constructed; the typed accessors apply the trimming rules
/// shared by every mapper (blank strings read as absent).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SourceRecord {
    values: Map<String, Value>,
}

impl SourceRecord {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Trimmed, non-empty text value of a field.
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.values.get(field)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }

    /// Integer value, accepting JSON numbers and numeric strings.
    pub fn integer(&self, field: &str) -> Option<i64> {
        match self.values.get(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn boolean(&self, field: &str) -> Option<bool> {
        match self.values.get(field)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim() {
                "true" | "True" => Some(true),
                "false" | "False" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl TryFrom<Value> for SourceRecord {
    type Error = crate::error::ModelError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self::new(map)),
            other => Err(crate::error::ModelError::MalformedResource(format!(
                "expected object, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> SourceRecord {
        SourceRecord::try_from(value).unwrap()
    }

    #[test]
    fn text_trims_and_drops_blank() {
        let r = record(json!({"a": "  x  ", "b": "   ", "c": 3}));
        assert_eq!(r.text("a"), Some("x"));
        assert_eq!(r.text("b"), None);
        assert_eq!(r.text("c"), None);
        assert_eq!(r.text("missing"), None);
    }

    #[test]
    fn integer_accepts_numeric_strings() {
        let r = record(json!({"n": 42, "s": " -7 ", "bad": "x"}));
        assert_eq!(r.integer("n"), Some(42));
        assert_eq!(r.integer("s"), Some(-7));
        assert_eq!(r.integer("bad"), None);
    }

    #[test]
    fn rejects_non_object() {
        assert!(SourceRecord::try_from(json!([1, 2])).is_err());
    }
}
