//! Deep merge of a persisted settings document onto the canonical schema.
//!
//! The base document defines the complete field universe. For every field of
//! the base, the overlay wins when it has a value: nested objects are merged
//! field by field, everything else (scalars and arrays alike) is taken whole.
//! Overlay fields unknown to the base are dropped, and `null` counts as absent.

use serde_json::{Map, Value};

/// Merges `overlay` onto `base` in a single pass.
///
/// The result carries exactly the keys of `base` whenever `base` is an object,
/// so one call is enough to restore every canonical field.
#[must_use]
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_fields), Value::Object(overlay_fields)) => {
            Value::Object(merge_fields(base_fields, overlay_fields))
        }
        (_, Value::Null) => base.clone(),
        (_, overlay) => overlay.clone(),
    }
}

fn merge_fields(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    base.iter()
        .map(|(key, default)| {
            let merged = overlay
                .get(key)
                .map_or_else(|| default.clone(), |value| deep_merge(default, value));
            (key.clone(), merged)
        })
        .collect()
}
