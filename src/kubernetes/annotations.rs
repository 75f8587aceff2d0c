// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! JSON merge patches touching a single annotation

use serde_json::{json, Map, Value};

/// Build a merge patch setting one annotation, or removing it when `value` is `None`.
///
/// Only the given key is sent, so concurrent patches for other keys of the same
/// object never overwrite each other. Removing an absent key is a no-op on the server.
pub fn annotation_patch(key: &str, value: Option<&str>) -> Value {
    let mut annotations = Map::new();
    annotations.insert(
        key.to_string(),
        value.map_or(Value::Null, |v| Value::String(v.to_string())),
    );

    json!({ "metadata": { "annotations": annotations } })
}
