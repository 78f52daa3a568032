use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Vendor extensions attached to a schema, keyed by extension name.
pub type Extensions = serde_json::Map<String, Value>;

/// An OpenAPI v3 schema node, as served by the Kubernetes API server.
///
/// Only the keywords that reference resolution needs are modelled as fields.
/// Every other keyword, including the `x-kubernetes-*` vendor extensions,
/// is kept verbatim in [`Schema::extensions`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<StringOrArray>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<SchemaOrArray>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

/// `additionalProperties` is either a boolean or a nested schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<Schema>),
}

/// `type` is a single name or a list of names, e.g. `["string", "null"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrArray {
    String(String),
    Array(Vec<String>),
}

impl StringOrArray {
    /// The type name when exactly one is given.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            Self::Array(names) => match names.as_slice() {
                [single] => Some(single.as_str()),
                _ => None,
            },
        }
    }
}

impl From<&str> for StringOrArray {
    fn from(name: &str) -> Self {
        Self::String(name.to_string())
    }
}

impl From<String> for StringOrArray {
    fn from(name: String) -> Self {
        Self::String(name)
    }
}

/// `items` is a single schema for every element or a positional tuple of
/// schemas. Only the single form is inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrArray {
    Array(Vec<Schema>),
    Schema(Box<Schema>),
}

impl SchemaOrArray {
    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        match self {
            Self::Schema(s) => Some(s),
            Self::Array(_) => None,
        }
    }

    pub fn schema_mut(&mut self) -> Option<&mut Schema> {
        match self {
            Self::Schema(s) => Some(s),
            Self::Array(_) => None,
        }
    }
}

impl AdditionalProperties {
    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        match self {
            Self::Schema(s) => Some(s),
            Self::Bool(_) => None,
        }
    }

    pub fn schema_mut(&mut self) -> Option<&mut Schema> {
        match self {
            Self::Schema(s) => Some(s),
            Self::Bool(_) => None,
        }
    }
}

impl Schema {
    /// A schema that is nothing but a `$ref`.
    pub fn new_ref(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    pub fn new_type(ty: impl Into<StringOrArray>) -> Self {
        Self {
            schema_type: Some(ty.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    #[must_use]
    pub fn with_items(mut self, items: Schema) -> Self {
        self.items = Some(SchemaOrArray::Schema(Box::new(items)));
        self
    }

    #[must_use]
    pub fn with_additional_properties(mut self, schema: Schema) -> Self {
        self.additional_properties = Some(AdditionalProperties::Schema(Box::new(schema)));
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_extension(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Schema> {
        self.properties.get(name)
    }

    /// The single type name, if the schema declares exactly one.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.schema_type.as_ref().and_then(StringOrArray::as_str)
    }

    /// The `$ref` of this node itself, ignoring blank values.
    #[must_use]
    pub fn own_ref(&self) -> Option<&str> {
        self.reference.as_deref().filter(|r| !r.trim().is_empty())
    }

    /// The element schema when `items` is the single-schema form.
    #[must_use]
    pub fn items_schema(&self) -> Option<&Schema> {
        self.items.as_ref().and_then(SchemaOrArray::schema)
    }

    pub fn items_schema_mut(&mut self) -> Option<&mut Schema> {
        self.items.as_mut().and_then(SchemaOrArray::schema_mut)
    }

    #[must_use]
    pub fn additional_properties_schema(&self) -> Option<&Schema> {
        self.additional_properties
            .as_ref()
            .and_then(AdditionalProperties::schema)
    }

    /// Whether any node reachable through `properties`, `additionalProperties`,
    /// single-schema `items` or `allOf` still carries a non-blank `$ref`.
    #[must_use]
    pub fn contains_ref(&self) -> bool {
        self.own_ref().is_some()
            || self.properties.values().any(Schema::contains_ref)
            || self
                .additional_properties_schema()
                .is_some_and(Schema::contains_ref)
            || self.items_schema().is_some_and(Schema::contains_ref)
            || self.all_of.iter().any(Schema::contains_ref)
    }
}
