use crate::coerce::percent_decode;
use crate::evaluator::EvalError;
use crate::value::Value;

/// A property path used to reach into a record.
///
/// # Examples
/// - `price` → `["price"]`
/// - `path.1` → `["path.1"]` (dots belong to the key)
/// - `(nested,property)` → `["nested", "property"]`
/// - `with%2Fslash` → `["with/slash"]` (segments are percent-decoded)
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyPath {
    /// Key the path is reported under (`select` output, normalizer)
    label: String,
    segments: Vec<String>,
}

impl PropertyPath {
    /// The empty path, resolving to the record itself
    pub fn whole() -> Self {
        PropertyPath {
            label: String::new(),
            segments: Vec::new(),
        }
    }

    /// Interpret a literal as a path: a scalar is one key, an array is a
    /// sequence of keys
    pub fn from_value(value: &Value) -> Result<Self, EvalError> {
        match value {
            Value::Array(parts) => {
                let raw: Vec<String> = parts.iter().map(Value::as_string).collect();
                Ok(PropertyPath {
                    label: raw.join(","),
                    segments: raw.iter().map(|s| decode_segment(s)).collect(),
                })
            }
            Value::Object(_) | Value::Regex(_) => Err(EvalError::TypeError(format!(
                "Cannot use {} as a property path",
                value.type_name()
            ))),
            scalar => {
                let raw = scalar.as_string();
                Ok(PropertyPath {
                    segments: vec![decode_segment(&raw)],
                    label: raw,
                })
            }
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Navigate the record; `None` as soon as a segment is missing
    pub fn resolve<'v>(&self, record: &'v Value) -> Option<&'v Value> {
        let mut current = record;
        for segment in &self.segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

fn decode_segment(raw: &str) -> String {
    percent_decode(raw).unwrap_or_else(|_| raw.to_string())
}
