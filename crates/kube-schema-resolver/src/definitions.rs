use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::SchemaResolver;
use crate::error::{Error, Result};
use crate::extensions::{extract_gvks, gvk_extensions};
use crate::gvk::GroupVersionKind;
use crate::inline::populate_refs;
use crate::schema::{Extensions, Schema};

/// Generated OpenAPI definitions keyed by their type name
/// (e.g. `k8s.io/api/core/v1.Pod`).
///
/// References between definitions use the bare type name as `$ref`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Definitions(BTreeMap<String, Schema>);

impl Definitions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) -> Option<Schema> {
        self.0.insert(name.into(), schema)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Schema)> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Load definitions from a JSON or YAML file.
    ///
    /// The file holds either a bare `{name: schema}` map or the same map under
    /// a top-level `definitions` key.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let load_err = |source: crate::error::BoxError| Error::LoadDefinitions {
            path: path.to_path_buf(),
            source,
        };

        let bytes = std::fs::read(path).map_err(|e| load_err(e.into()))?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        let mut doc: Value = if is_yaml {
            serde_yaml::from_slice(&bytes).map_err(|e| load_err(e.into()))?
        } else {
            serde_json::from_slice(&bytes).map_err(|e| load_err(e.into()))?
        };

        if let Some(defs) = doc.get_mut("definitions")
            && defs.is_object()
        {
            doc = defs.take();
        }
        let defs = serde_json::from_value(doc).map_err(|e| load_err(e.into()))?;
        Ok(Self(defs))
    }
}

impl FromIterator<(String, Schema)> for Definitions {
    fn from_iter<I: IntoIterator<Item = (String, Schema)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// Maps a generated type name to its friendly definition name and the vendor
/// extensions describing it.
pub trait DefinitionNamer {
    fn definition_name(&self, name: &str) -> (String, Extensions);
}

impl<F> DefinitionNamer for F
where
    F: Fn(&str) -> (String, Extensions),
{
    fn definition_name(&self, name: &str) -> (String, Extensions) {
        self(name)
    }
}

/// Registry of the GVKs each generated type is served as.
#[derive(Debug, Clone, Default)]
pub struct SchemeNamer {
    types: HashMap<String, Vec<GroupVersionKind>>,
}

impl SchemeNamer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_name: impl Into<String>, gvk: GroupVersionKind) {
        let gvks = self.types.entry(type_name.into()).or_default();
        if let Err(idx) = gvks.binary_search(&gvk) {
            gvks.insert(idx, gvk);
        }
    }

    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>, gvk: GroupVersionKind) -> Self {
        self.register(type_name, gvk);
        self
    }

    /// Registers every GVK the definitions already declare in their own
    /// `x-kubernetes-group-version-kind` extension.
    #[must_use]
    pub fn from_definitions(defs: &Definitions) -> Self {
        let mut namer = Self::new();
        for (name, schema) in defs.iter() {
            for gvk in extract_gvks(&schema.extensions) {
                namer.register(name.clone(), gvk);
            }
        }
        namer
    }
}

impl DefinitionNamer for SchemeNamer {
    fn definition_name(&self, name: &str) -> (String, Extensions) {
        let ext = self
            .types
            .get(name)
            .map(|gvks| gvk_extensions(gvks))
            .unwrap_or_default();
        (friendly_name(name), ext)
    }
}

/// REST friendly name of a Go-style type name: the domain of the package path
/// is reversed and path separators become dots.
///
/// `k8s.io/api/core/v1.Pod` becomes `io.k8s.api.core.v1.Pod`.
#[must_use]
pub fn friendly_name(name: &str) -> String {
    let mut parts: Vec<String> = name.split('/').map(str::to_string).collect();
    if let Some(first) = parts.first_mut()
        && first.contains('.')
    {
        *first = first.split('.').rev().collect::<Vec<_>>().join(".");
    }
    parts.join(".")
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct IndexEntry {
    name: String,
    friendly_name: String,
}

/// Resolves schemas of built-in types from a static definition table.
///
/// The GVK index is built once on construction. Every resolution works on a
/// deep copy, so the table is never mutated and resolvers can be shared across
/// threads.
#[derive(Debug, Clone)]
pub struct DefinitionsSchemaResolver {
    defs: Definitions,
    gvk_to_schema: HashMap<GroupVersionKind, IndexEntry>,
}

impl DefinitionsSchemaResolver {
    pub fn new(defs: Definitions, namer: &impl DefinitionNamer) -> Self {
        let mut gvk_to_schema = HashMap::new();
        for (name, _) in defs.iter() {
            let (friendly_name, ext) = namer.definition_name(name);
            for gvk in extract_gvks(&ext) {
                let entry = IndexEntry {
                    name: name.clone(),
                    friendly_name: friendly_name.clone(),
                };
                if let Some(prev) = gvk_to_schema.insert(gvk.clone(), entry) {
                    tracing::debug!(%gvk, previous = %prev.name, current = %name, "duplicate gvk, later definition wins");
                }
            }
        }
        tracing::debug!(
            definitions = defs.len(),
            gvks = gvk_to_schema.len(),
            "built definitions gvk index"
        );
        Self {
            defs,
            gvk_to_schema,
        }
    }

    #[must_use]
    pub fn definitions(&self) -> &Definitions {
        &self.defs
    }

    /// Friendly name of the definition serving `gvk`.
    #[must_use]
    pub fn definition_name(&self, gvk: &GroupVersionKind) -> Option<&str> {
        self.gvk_to_schema
            .get(gvk)
            .map(|entry| entry.friendly_name.as_str())
    }

    pub fn gvks(&self) -> impl Iterator<Item = &GroupVersionKind> {
        self.gvk_to_schema.keys()
    }
}

impl SchemaResolver for DefinitionsSchemaResolver {
    fn resolve_schema(&self, gvk: &GroupVersionKind) -> Result<Schema> {
        let entry = self
            .gvk_to_schema
            .get(gvk)
            .ok_or_else(|| Error::KindNotFound(gvk.clone()))?;
        let schema = self
            .defs
            .get(&entry.name)
            .ok_or_else(|| Error::KindNotFound(gvk.clone()))?;

        let mut result = deep_copy(schema).map_err(|source| Error::Copy {
            name: entry.name.clone(),
            source,
        })?;
        populate_refs(
            |r: &str| {
                let def = self.defs.get(r)?;
                match deep_copy(def) {
                    Ok(s) => Some(s),
                    Err(err) => {
                        tracing::warn!(reference = %r, error = %err, "cannot deep copy definition");
                        None
                    }
                }
            },
            &mut result,
        )?;
        Ok(result)
    }
}

/// Deep copy of a schema through its JSON form.
///
/// Definitions are expected to be shallow, with nested types expressed as
/// `$ref`s rather than embedded schemas, so copies stay small.
pub fn deep_copy(schema: &Schema) -> serde_json::Result<Schema> {
    serde_json::to_value(schema).and_then(serde_json::from_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pod_definitions() -> Definitions {
        serde_json::from_value(json!({
            "pkg.v1.Pod": {
                "type": "object",
                "x-kubernetes-group-version-kind": [{"group": "", "version": "v1", "kind": "Pod"}],
                "properties": {
                    "spec": {
                        "description": "Specification of the desired behavior of the pod.",
                        "default": {},
                        "allOf": [{"$ref": "pkg.v1.PodSpec"}]
                    }
                }
            },
            "pkg.v1.PodSpec": {
                "type": "object",
                "properties": {
                    "hostname": {"type": "string"},
                    "nodeSelector": {
                        "type": "object",
                        "additionalProperties": {"type": "string", "default": ""}
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn bare_ref_property_is_expanded() {
        let mut defs = Definitions::new();
        defs.insert(
            "pkg.v1.Pod",
            Schema::new_type("object")
                .with_property("spec", Schema::new_ref("pkg.v1.PodSpec"))
                .with_extension(
                    crate::extensions::EXT_GVK,
                    json!([{"group": "", "version": "v1", "kind": "Pod"}]),
                ),
        );
        defs.insert(
            "pkg.v1.PodSpec",
            Schema::new_type("object")
                .with_property("hostname", Schema::new_type("string"))
                .with_property(
                    "containers",
                    Schema::new_type("array").with_items(Schema::new_ref("pkg.v1.Container")),
                ),
        );
        defs.insert(
            "pkg.v1.Container",
            Schema::new_type("object").with_property("image", Schema::new_type("string")),
        );

        let resolver = DefinitionsSchemaResolver::new(defs.clone(), &SchemeNamer::from_definitions(&defs));
        let pod = resolver
            .resolve_schema(&GroupVersionKind::new("", "v1", "Pod"))
            .unwrap();

        assert!(!pod.contains_ref());
        similar_asserts::assert_eq!(
            serde_json::to_value(pod.property("spec").unwrap()).unwrap(),
            json!({
                "type": "object",
                "properties": {
                    "containers": {
                        "type": "array",
                        "items": {"type": "object", "properties": {"image": {"type": "string"}}}
                    },
                    "hostname": {"type": "string"}
                }
            })
        );
    }

    #[test]
    fn collects_from_pairs() {
        let defs: Definitions = [
            ("pkg.v1.A".to_string(), Schema::new_type("string")),
            ("pkg.v1.B".to_string(), Schema::new_ref("pkg.v1.A")),
        ]
        .into_iter()
        .collect();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs.get("pkg.v1.B"), Some(&Schema::new_ref("pkg.v1.A")));
        assert!(!defs.is_empty());
        assert!(Definitions::new().is_empty());
    }

    #[test]
    fn friendly_names() {
        assert_eq!(friendly_name("k8s.io/api/core/v1.Pod"), "io.k8s.api.core.v1.Pod");
        assert_eq!(
            friendly_name("k8s.io/apimachinery/pkg/apis/meta/v1.ObjectMeta"),
            "io.k8s.apimachinery.pkg.apis.meta.v1.ObjectMeta"
        );
        assert_eq!(
            friendly_name("example.com/widgets/v1.Widget"),
            "com.example.widgets.v1.Widget"
        );
        assert_eq!(friendly_name("Local"), "Local");
    }

    #[test]
    fn scheme_namer_reports_registered_gvks() {
        let namer = SchemeNamer::new()
            .with_type("k8s.io/api/apps/v1.Deployment", GroupVersionKind::new("apps", "v1", "Deployment"))
            .with_type("k8s.io/api/apps/v1.Deployment", GroupVersionKind::new("apps", "v1", "Deployment"));

        let (name, ext) = namer.definition_name("k8s.io/api/apps/v1.Deployment");
        assert_eq!(name, "io.k8s.api.apps.v1.Deployment");
        assert_eq!(
            extract_gvks(&ext),
            vec![GroupVersionKind::new("apps", "v1", "Deployment")]
        );

        let (_, ext) = namer.definition_name("k8s.io/api/apps/v1.DeploymentSpec");
        assert!(ext.is_empty());
    }

    #[test]
    fn resolves_end_to_end() {
        let defs = pod_definitions();
        let resolver = DefinitionsSchemaResolver::new(defs.clone(), &SchemeNamer::from_definitions(&defs));

        let pod = resolver
            .resolve_schema(&GroupVersionKind::new("", "v1", "Pod"))
            .unwrap();

        assert!(!pod.contains_ref());
        similar_asserts::assert_eq!(
            serde_json::to_value(pod.property("spec").unwrap()).unwrap(),
            json!({
                "type": "object",
                "properties": {
                    "hostname": {"type": "string"},
                    "nodeSelector": {
                        "type": "object",
                        "additionalProperties": {"type": "string", "default": ""}
                    }
                }
            })
        );
    }

    #[test]
    fn results_are_isolated_copies() {
        let defs = pod_definitions();
        let resolver = DefinitionsSchemaResolver::new(defs.clone(), &SchemeNamer::from_definitions(&defs));
        let gvk = GroupVersionKind::new("", "v1", "Pod");

        let mut first = resolver.resolve_schema(&gvk).unwrap();
        first.description = Some("mutated".to_string());
        first.properties.clear();

        let second = resolver.resolve_schema(&gvk).unwrap();
        assert_eq!(second.description, None);
        assert!(second.property("spec").is_some());
        assert_eq!(resolver.definitions(), &defs);
    }

    #[test]
    fn unknown_gvk_is_not_found() {
        let defs = pod_definitions();
        let resolver = DefinitionsSchemaResolver::new(defs.clone(), &SchemeNamer::from_definitions(&defs));

        let err = resolver
            .resolve_schema(&GroupVersionKind::new("apps", "v1", "Deployment"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn index_uses_namer_extensions() {
        let defs = pod_definitions();
        let namer = |name: &str| {
            let ext = if name == "pkg.v1.PodSpec" {
                gvk_extensions(&[GroupVersionKind::new("example.com", "v1", "Spec")])
            } else {
                Extensions::new()
            };
            (name.to_string(), ext)
        };
        let resolver = DefinitionsSchemaResolver::new(defs, &namer);

        assert!(
            resolver
                .resolve_schema(&GroupVersionKind::new("", "v1", "Pod"))
                .unwrap_err()
                .is_not_found()
        );
        let spec = resolver
            .resolve_schema(&GroupVersionKind::new("example.com", "v1", "Spec"))
            .unwrap();
        assert!(spec.property("hostname").is_some());
        assert_eq!(
            resolver.definition_name(&GroupVersionKind::new("example.com", "v1", "Spec")),
            Some("pkg.v1.PodSpec")
        );
    }

    #[test]
    fn malformed_extension_is_not_indexed() {
        let defs: Definitions = serde_json::from_value(json!({
            "pkg.v1.Binding": {
                "type": "object",
                "x-kubernetes-group-version-kind": [
                    {"group": "", "version": "v1", "kind": "Binding"},
                    {"group": "", "version": "v1"}
                ]
            }
        }))
        .unwrap();
        let resolver = DefinitionsSchemaResolver::new(defs.clone(), &SchemeNamer::from_definitions(&defs));
        assert_eq!(resolver.gvks().count(), 0);
    }

    #[test]
    fn dangling_ref_is_an_internal_error() {
        let defs: Definitions = serde_json::from_value(json!({
            "pkg.v1.Pod": {
                "type": "object",
                "x-kubernetes-group-version-kind": [{"group": "", "version": "v1", "kind": "Pod"}],
                "properties": {"spec": {"$ref": "pkg.v1.Missing"}}
            }
        }))
        .unwrap();
        let resolver = DefinitionsSchemaResolver::new(defs.clone(), &SchemeNamer::from_definitions(&defs));
        let err = resolver
            .resolve_schema(&GroupVersionKind::new("", "v1", "Pod"))
            .unwrap_err();
        assert!(matches!(err, Error::UnresolvedRef { ref reference } if reference == "pkg.v1.Missing"));
    }

    #[test]
    fn deep_copy_is_equal() {
        let defs = pod_definitions();
        for (_, schema) in defs.iter() {
            assert_eq!(&deep_copy(schema).unwrap(), schema);
        }
    }
}
