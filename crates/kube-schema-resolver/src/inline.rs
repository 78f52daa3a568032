use crate::error::{Error, Result};
use crate::schema::Schema;

/// Returns the `$ref` this schema stands for, if any.
///
/// The API server wraps a `$ref` in a single-element `allOf` when it needs to
/// keep a sibling `description`
/// (see <https://github.com/kubernetes/kubernetes/issues/106387>), so `allOf`
/// members are searched as well.
#[must_use]
pub fn ref_of(schema: &Schema) -> Option<&str> {
    schema
        .own_ref()
        .or_else(|| schema.all_of.iter().find_map(ref_of))
}

/// Replaces every `$ref` reachable from `schema` with the schema it names.
///
/// A referencing node is replaced wholesale: sibling keywords of the `$ref`
/// (such as the `description` kept next to an `allOf`-wrapped ref) are dropped.
/// Substituted content is itself walked, so transitive references are expanded
/// as well. `properties`, `additionalProperties` and single-schema `items` are
/// descended into; tuple-form `items` are left as they are.
///
/// `schema_of` looks up the schema for a `$ref` string. On error the tree may be
/// left partially expanded.
pub fn populate_refs<F>(schema_of: F, schema: &mut Schema) -> Result<()>
where
    F: Fn(&str) -> Option<Schema>,
{
    let mut in_flight = Vec::new();
    populate(&schema_of, schema, &mut in_flight)
}

fn populate<F>(schema_of: &F, schema: &mut Schema, in_flight: &mut Vec<String>) -> Result<()>
where
    F: Fn(&str) -> Option<Schema>,
{
    let depth = in_flight.len();

    while let Some(reference) = ref_of(schema).map(str::to_string) {
        if in_flight.contains(&reference) {
            return Err(Error::CyclicRef { reference });
        }
        let Some(resolved) = schema_of(&reference) else {
            return Err(Error::UnresolvedRef { reference });
        };
        tracing::trace!(%reference, "inlining $ref");
        *schema = resolved;
        in_flight.push(reference);
    }

    for prop in schema.properties.values_mut() {
        populate(schema_of, prop, in_flight)?;
    }
    if let Some(additional) = schema
        .additional_properties
        .as_mut()
        .and_then(|ap| ap.schema_mut())
    {
        populate(schema_of, additional, in_flight)?;
    }
    if let Some(items) = schema.items_schema_mut() {
        populate(schema_of, items, in_flight)?;
    }

    in_flight.truncate(depth);
    Ok(())
}
