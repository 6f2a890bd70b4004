//! Dotted-path access into a JSON document, e.g. `appDefinitions.my-app`.

use serde_json::{Map, Value};

fn segments(key: &str) -> impl Iterator<Item = &str> {
    key.split('.').filter(|s| !s.is_empty())
}

pub fn get_path<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    segments(key).try_fold(root, |node, segment| node.as_object()?.get(segment))
}

/// Intermediate objects are created as needed; a non-object in the way is replaced.
pub fn set_path(root: &mut Value, key: &str, value: Value) {
    let parts: Vec<&str> = segments(key).collect();
    let Some((last, parents)) = parts.split_last() else {
        *root = value;
        return;
    };

    let mut node = root;
    for segment in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(obj) = node else {
            return;
        };
        node = obj
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(obj) = node {
        obj.insert(last.to_string(), value);
    }
}

/// Returns whether something was removed.
pub fn delete_path(root: &mut Value, key: &str) -> bool {
    let parts: Vec<&str> = segments(key).collect();
    let Some((last, parents)) = parts.split_last() else {
        return false;
    };

    let mut node = root;
    for segment in parents {
        match node.as_object_mut().and_then(|obj| obj.get_mut(*segment)) {
            Some(next) => node = next,
            None => return false,
        }
    }

    node.as_object_mut()
        .map(|obj| obj.remove(*last).is_some())
        .unwrap_or(false)
}
