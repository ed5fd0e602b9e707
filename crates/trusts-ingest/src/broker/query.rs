//! Broker catalog queries

/// Predicate linking a catalog resource to its asset type
pub const ASSET_TYPE_PREDICATE: &str = "https://www.trusts-data.eu/ontology/asset_type";

/// Namespace asset type classes live in
pub const ONTOLOGY_BASE: &str = "https://www.trusts-data.eu/ontology/";

/// Render a URI in N3 form, tolerating one that is already bracketed.
pub fn n3(uri: &str) -> String {
    format!("<{}>", strip_brackets(uri))
}

/// Strip one leading `<` and one trailing `>` if present.
pub fn strip_brackets(uri: &str) -> &str {
    let bare = uri.strip_prefix('<').unwrap_or(uri);
    bare.strip_suffix('>').unwrap_or(bare)
}

/// Query selecting every offered resource with its type and external
/// (`owl:sameAs`) name.
///
/// `resource_type` narrows the result to one asset type class, e.g.
/// `"dataset"` selects `<https://www.trusts-data.eu/ontology/Dataset>`. The
/// literal `"None"` is treated like no filter.
pub fn sparql_all_resources(resource_type: Option<&str>) -> String {
    let predicate = n3(ASSET_TYPE_PREDICATE);
    let mut query = String::from(
        "PREFIX owl: <http://www.w3.org/2002/07/owl#>\n\
         PREFIX ids: <https://w3id.org/idsa/core/>\n\
         SELECT ?resultUri ?type ?externalname\n\
         WHERE\n\
         { ?resultUri a ?type .\n\
         \x20 ?conn <https://w3id.org/idsa/core/offeredResource> ?resultUri .\n\
         \x20 ?resultUri owl:sameAs ?externalname .\n",
    );

    match resource_type.filter(|t| *t != "None") {
        None => {
            query.push_str(&format!("  ?resultUri {} ?assettype.\n", predicate));
        },
        Some(resource_type) => {
            let type_uri = n3(&format!("{}{}", ONTOLOGY_BASE, capitalize(resource_type)));
            query.push_str(&format!("  ?resultUri {} {}.\n", predicate, type_uri));
            query.push_str(&format!("  BIND( {} AS ?assettype) .\n", type_uri));
        },
    }

    query.push('}');
    query
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
