//! GraphQL operation definitions for Shopify Admin API.
//!
//! Uses `graphql_client` to generate type-safe Rust code from the operations
//! in `graphql/admin/queries/`, checked against `graphql/admin/schema.graphql`.

use graphql_client::GraphQLQuery;

// =============================================================================
// Custom scalar type aliases (used by graphql_client)
// =============================================================================

/// URL string.
#[allow(clippy::upper_case_acronyms)]
type URL = String;

/// Unsigned 64-bit integer as string.
type UnsignedInt64 = String;

// =============================================================================
// File mutations
// =============================================================================

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/files.graphql",
    response_derives = "Debug, Clone"
)]
pub struct StagedUploadsCreate;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/files.graphql",
    response_derives = "Debug, Clone"
)]
pub struct FileCreate;

/// Join `userErrors` into one `field: message; field: message` string.
pub(crate) fn format_user_errors<'a>(
    errors: impl IntoIterator<Item = (Option<&'a [String]>, &'a str)>,
) -> String {
    errors
        .into_iter()
        .map(|(field, message)| {
            let field = field.map_or_else(String::new, |f| f.join("."));
            format!("{field}: {message}")
        })
        .collect::<Vec<_>>()
        .join("; ")
}
