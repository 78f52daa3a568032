use serde_json::{Map, Value};

use crate::gvk::GroupVersionKind;
use crate::schema::Extensions;

/// Vendor extension listing the GVKs a schema type serves.
pub const EXT_GVK: &str = "x-kubernetes-group-version-kind";

/// Reads the GVKs declared by the `x-kubernetes-group-version-kind` extension.
///
/// A missing or malformed extension yields no GVKs. If any single entry is not
/// an object with string `group`, `version` and `kind` fields, the whole list is
/// discarded rather than returning the well-formed subset.
#[must_use]
pub fn extract_gvks(extensions: &Extensions) -> Vec<GroupVersionKind> {
    let Some(Value::Array(entries)) = extensions.get(EXT_GVK) else {
        return Vec::new();
    };
    entries
        .iter()
        .map(gvk_of)
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
}

fn gvk_of(entry: &Value) -> Option<GroupVersionKind> {
    let entry = entry.as_object()?;
    let field = |name: &str| entry.get(name).and_then(Value::as_str);
    Some(GroupVersionKind::new(
        field("group")?,
        field("version")?,
        field("kind")?,
    ))
}

/// Builds an extension set declaring `gvks`.
#[must_use]
pub fn gvk_extensions<'a>(gvks: impl IntoIterator<Item = &'a GroupVersionKind>) -> Extensions {
    let entries: Vec<Value> = gvks
        .into_iter()
        .map(|gvk| {
            let mut m = Map::new();
            m.insert("group".to_string(), Value::String(gvk.group.clone()));
            m.insert("kind".to_string(), Value::String(gvk.kind.clone()));
            m.insert("version".to_string(), Value::String(gvk.version.clone()));
            Value::Object(m)
        })
        .collect();

    let mut ext = Extensions::new();
    if !entries.is_empty() {
        ext.insert(EXT_GVK.to_string(), Value::Array(entries));
    }
    ext
}
