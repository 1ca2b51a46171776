pub const SCHEMA_CLASS: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/templates/Schema.php.tpl"
));

pub const SCHEMA_CLASS_NAME: &str = "Schema";

/// Route import pointing the router at the bundle's controller directory.
pub const ROUTE_BLOCK: &str = "\ngraphql:\n    resource: \"@GraphQLBundle/Controller/\"\n";

pub fn render_schema_class(namespace: &str, class_name: &str) -> String {
    SCHEMA_CLASS
        .replace("{{namespace}}", namespace)
        .replace("{{class}}", class_name)
}

/// The `graph_ql:` block that points the bundle at the generated schema class.
///
/// Backslashes are doubled because the class name sits in a double-quoted YAML scalar.
pub fn config_block(bundle: &str, class_name: &str) -> String {
    format!("graph_ql:\n    schema_class: \"{bundle}\\\\GraphQL\\\\{class_name}\"\n\n")
}
