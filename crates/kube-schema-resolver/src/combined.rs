use crate::SchemaResolver;
use crate::error::Result;
use crate::gvk::GroupVersionKind;
use crate::schema::Schema;

/// Asks `first`, falling back to `second` when `first` does not know the type.
///
/// Errors other than not-found from `first` are returned without consulting
/// `second`.
#[derive(Debug, Clone)]
pub struct ChainSchemaResolver<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> ChainSchemaResolver<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A, B> SchemaResolver for ChainSchemaResolver<A, B>
where
    A: SchemaResolver,
    B: SchemaResolver,
{
    fn resolve_schema(&self, gvk: &GroupVersionKind) -> Result<Schema> {
        match self.first.resolve_schema(gvk) {
            Err(err) if err.is_not_found() => {
                tracing::debug!(%gvk, "falling back to second resolver");
                self.second.resolve_schema(gvk)
            }
            other => other,
        }
    }
}
