use serde_json::{Map, Value};

use crate::{DbError, FieldUpdate};

/// Top-level keys that identify a document and may not be rewritten.
const IMMUTABLE_KEYS: [&str; 3] = ["id", "owner_id", "created_at"];

/// Apply dotted-path updates to a JSON document in order.
///
/// Missing intermediate objects are created. Writing through a non-object
/// value is an error, as is any empty path segment.
///
/// # Errors
///
/// Returns [`DbError::InvalidPath`] for a malformed, immutable, or
/// non-traversable path. `doc` may be partially updated on error.
pub fn apply_updates(doc: &mut Value, updates: &[FieldUpdate]) -> Result<(), DbError> {
    for update in updates {
        apply_one(doc, &update.path, update.value.clone())?;
    }
    Ok(())
}

fn apply_one(doc: &mut Value, path: &str, value: Value) -> Result<(), DbError> {
    let invalid = |reason: &str| DbError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid("empty segment"));
    }
    if IMMUTABLE_KEYS.contains(&segments[0]) {
        return Err(invalid("field is immutable"));
    }

    let Some((last, parents)) = segments.split_last() else {
        return Err(invalid("empty path"));
    };

    let mut cursor = doc;
    for segment in parents {
        let Value::Object(map) = cursor else {
            return Err(invalid("parent is not an object"));
        };
        cursor = map
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if cursor.is_null() {
            *cursor = Value::Object(Map::new());
        }
    }

    let Value::Object(map) = cursor else {
        return Err(invalid("parent is not an object"));
    };
    map.insert((*last).to_string(), value);
    Ok(())
}
