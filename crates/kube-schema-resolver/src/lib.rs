//! Resolve the OpenAPI schema of a Kubernetes kind into a self-contained tree.
//!
//! Two [`SchemaResolver`]s are provided: [`DiscoveryResolver`] fetches the
//! group-version document from the API server's OpenAPI v3 discovery on every
//! call, and [`DefinitionsSchemaResolver`] serves built-in types from a static
//! definition table. Both return schemas with every `$ref` under `properties`,
//! `additionalProperties` and `items` inlined.

mod combined;
pub mod definitions;
pub mod discovery;
pub mod error;
pub mod extensions;
pub mod gvk;
pub mod inline;
pub mod schema;

pub use combined::ChainSchemaResolver;
pub use definitions::{
    DefinitionNamer, Definitions, DefinitionsSchemaResolver, SchemeNamer, deep_copy,
};
pub use discovery::{
    DiscoveryResolver, GroupVersionDocument, HttpDiscovery, OpenApiV3Discovery,
};
pub use error::{Error, Result};
pub use extensions::{EXT_GVK, extract_gvks};
pub use gvk::{GroupVersion, GroupVersionKind};
pub use inline::{populate_refs, ref_of};
pub use schema::{AdditionalProperties, Extensions, Schema, SchemaOrArray, StringOrArray};

use std::sync::Arc;

/// Resolves the schema of a resource type by its group, version and kind.
pub trait SchemaResolver {
    /// Returns the schema for `gvk` with all references inlined.
    fn resolve_schema(&self, gvk: &GroupVersionKind) -> Result<Schema>;
}

impl<T> SchemaResolver for &T
where
    T: SchemaResolver + ?Sized,
{
    fn resolve_schema(&self, gvk: &GroupVersionKind) -> Result<Schema> {
        (**self).resolve_schema(gvk)
    }
}

impl<T> SchemaResolver for Box<T>
where
    T: SchemaResolver + ?Sized,
{
    fn resolve_schema(&self, gvk: &GroupVersionKind) -> Result<Schema> {
        (**self).resolve_schema(gvk)
    }
}

impl<T> SchemaResolver for Arc<T>
where
    T: SchemaResolver + ?Sized,
{
    fn resolve_schema(&self, gvk: &GroupVersionKind) -> Result<Schema> {
        (**self).resolve_schema(gvk)
    }
}
