//! Keeping `#/$defs/<key>` pointers consistent with the definition list.
//!
//! The walk covers field schemas, their nested `properties` and single-schema
//! `items`, every definition except an excluded one, and the root node.
//! Tuple `items` and combinator fragments are not visited.

use jsonschema_schema::keywords::{definition_key, definition_ref};
use jsonschema_schema::{FormNode, FormSchema, Items, Schema};
use tracing::debug;

/// Rewrite every `$ref` to `old_key` so it points at `new_key`.
///
/// With `new_key = None` matching references are cleared to `""`, leaving
/// the field in place. `exclude_definition` names a definition index whose
/// subtree is left alone (the one being renamed or removed).
///
/// Returns the number of references rewritten.
pub fn update_references(
    form: &mut FormSchema,
    old_key: &str,
    new_key: Option<&str>,
    exclude_definition: Option<usize>,
) -> usize {
    let from = definition_ref(old_key);
    let to = new_key.map(definition_ref).unwrap_or_default();

    let mut rewritten = 0;
    for field in &mut form.properties {
        rewritten += rewrite_schema(&mut field.schema, &from, &to);
    }
    for (index, def) in form.definitions.iter_mut().enumerate() {
        if Some(index) != exclude_definition {
            rewritten += rewrite_schema(&mut def.schema, &from, &to);
        }
    }
    rewritten += rewrite_node(&mut form.root, &from, &to);

    debug!(%from, %to, rewritten, "updated definition references");
    rewritten
}

fn rewrite_schema(schema: &mut Schema<FormNode>, from: &str, to: &str) -> usize {
    schema
        .as_node_mut()
        .map_or(0, |node| rewrite_node(node, from, to))
}

fn rewrite_node(node: &mut FormNode, from: &str, to: &str) -> usize {
    let mut rewritten = 0;
    if node.reference.as_deref() == Some(from) {
        node.reference = Some(to.to_string());
        rewritten += 1;
    }
    if let Some(fields) = &mut node.properties {
        for field in fields {
            rewritten += rewrite_schema(&mut field.schema, from, to);
        }
    }
    if let Some(item) = node.items.as_mut().and_then(Items::as_single_mut) {
        rewritten += rewrite_node(item, from, to);
    }
    rewritten
}

/// Collect `#/$defs/<key>` references whose target definition does not exist.
///
/// Visits the same nodes as [`update_references`]. Cleared (`""`) references
/// are not reported.
pub fn dangling_references(form: &FormSchema) -> Vec<String> {
    let mut found = Vec::new();
    let mut visit = |node: &FormNode| collect_refs(node, &mut found);
    let schemas = form
        .properties
        .iter()
        .map(|field| &field.schema)
        .chain(form.definitions.iter().map(|def| &def.schema));
    for node in schemas.filter_map(Schema::as_node) {
        visit(node);
    }
    visit(&form.root);

    found.retain(|reference| {
        definition_key(reference).is_some_and(|key| form.definition_index(key).is_none())
    });
    found
}

fn collect_refs(node: &FormNode, found: &mut Vec<String>) {
    if let Some(reference) = &node.reference
        && !reference.is_empty()
        && !found.contains(reference)
    {
        found.push(reference.clone());
    }
    for field in node.properties.iter().flatten() {
        if let Some(schema) = field.schema.as_node() {
            collect_refs(schema, found);
        }
    }
    if let Some(item) = node.items.as_ref().and_then(Items::as_single) {
        collect_refs(item, found);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonschema_schema::{DefinitionItem, FieldItem, SchemaType};

    fn ref_node(target: &str) -> FormNode {
        let mut node = FormNode::of_type(SchemaType::Ref);
        node.reference = Some(definition_ref(target));
        node
    }

    fn object_with(fields: Vec<FieldItem>) -> FormNode {
        let mut node = FormNode::of_type(SchemaType::Object);
        node.properties = Some(fields);
        node
    }

    fn sample() -> FormSchema {
        let mut list = FormNode::of_type(SchemaType::Array);
        list.items = Some(Items::Single(Box::new(
            object_with(vec![FieldItem::new("5", "entry", ref_node("old"))]).into(),
        )));

        let mut tuple = FormNode::of_type(SchemaType::Array);
        tuple.items = Some(Items::Tuple(vec![Schema::Bool(true), ref_node("old").into()]));

        let mut root = FormNode::of_type(SchemaType::Object);
        root.reference = Some(definition_ref("old"));

        FormSchema {
            root,
            properties: vec![
                FieldItem::new("1", "direct", ref_node("old")),
                FieldItem::new(
                    "2",
                    "nested",
                    object_with(vec![
                        FieldItem::new("3", "deep", ref_node("old")),
                        FieldItem::new("4", "unrelated", ref_node("other")),
                    ]),
                ),
                FieldItem::new("6", "list", list),
                FieldItem::new("7", "pair", tuple),
            ],
            definitions: vec![
                DefinitionItem::new(
                    "8",
                    "old",
                    object_with(vec![FieldItem::new("9", "self", ref_node("old"))]),
                ),
                DefinitionItem::new(
                    "10",
                    "user",
                    object_with(vec![FieldItem::new("11", "x", ref_node("old"))]),
                ),
                DefinitionItem::new("12", "other", FormNode::of_type(SchemaType::String)),
            ],
            ..FormSchema::default()
        }
    }

    fn node(schema: &Schema<FormNode>) -> &FormNode {
        schema.as_node().expect("schema object")
    }

    fn count_refs(form: &FormSchema, target: &str) -> usize {
        let serialized = serde_json::to_string(form).expect("serializable");
        serialized.matches(&format!("\"{target}\"")).count()
    }

    #[test]
    fn rename_rewrites_every_visited_reference() {
        let mut form = sample();
        form.definitions[0].key = "new".to_string();
        let rewritten = update_references(&mut form, "old", Some("new"), Some(0));

        // direct, deep, list entry, other definition, root
        assert_eq!(rewritten, 5);
        assert_eq!(node(&form.properties[0].schema).reference.as_deref(), Some("#/$defs/new"));
        assert_eq!(form.root.reference.as_deref(), Some("#/$defs/new"));
        let nested = node(&form.properties[1].schema).properties.as_ref().expect("nested");
        assert_eq!(node(&nested[0].schema).reference.as_deref(), Some("#/$defs/new"));
        assert_eq!(node(&nested[1].schema).reference.as_deref(), Some("#/$defs/other"));
    }

    #[test]
    fn tuple_items_and_excluded_definition_are_not_visited() {
        let mut form = sample();
        update_references(&mut form, "old", Some("new"), Some(0));
        // the tuple entry and the renamed definition's own self reference
        assert_eq!(count_refs(&form, "#/$defs/old"), 2);
        assert_eq!(count_refs(&form, "#/$defs/new"), 5);
    }

    #[test]
    fn removal_clears_references() {
        let mut form = sample();
        let cleared = update_references(&mut form, "old", None, Some(0));
        assert_eq!(cleared, 5);
        assert_eq!(node(&form.properties[0].schema).reference.as_deref(), Some(""));
        assert_eq!(node(&form.properties[0].schema).type_name(), Some(SchemaType::Ref));
    }

    #[test]
    fn no_match_is_a_no_op() {
        let mut form = sample();
        let before = form.clone();
        assert_eq!(update_references(&mut form, "missing", Some("x"), None), 0);
        assert_eq!(form, before);
    }

    #[test]
    fn prefix_keys_do_not_match() {
        let mut form = FormSchema {
            properties: vec![FieldItem::new("1", "a", ref_node("older"))],
            ..FormSchema::default()
        };
        assert_eq!(update_references(&mut form, "old", Some("new"), None), 0);
    }

    #[test]
    fn dangling_references_are_reported_once() {
        let form = FormSchema {
            properties: vec![
                FieldItem::new("1", "a", ref_node("Gone")),
                FieldItem::new("2", "b", ref_node("Gone")),
                FieldItem::new("3", "c", ref_node("Here")),
            ],
            definitions: vec![DefinitionItem::new("4", "Here", FormNode::default())],
            ..FormSchema::default()
        };
        assert_eq!(dangling_references(&form), ["#/$defs/Gone"]);
    }

    #[test]
    fn boolean_schemas_are_skipped() {
        let mut form = FormSchema {
            properties: vec![
                FieldItem::new("1", "open", Schema::Bool(true)),
                FieldItem::new("2", "a", ref_node("old")),
            ],
            definitions: vec![DefinitionItem::new("3", "old", Schema::Bool(false))],
            ..FormSchema::default()
        };
        form.definitions[0].key = "new".to_string();
        assert_eq!(update_references(&mut form, "old", Some("new"), Some(0)), 1);
        assert_eq!(form.properties[0].schema, Schema::Bool(true));
        assert!(dangling_references(&form).is_empty());
    }
}
