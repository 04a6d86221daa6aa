//! Conversion between the form tree and the canonical document.
//!
//! Both directions are total: malformed parts have already been dropped when
//! the trees were read, so nothing here can fail.

use indexmap::IndexMap;
use jsonschema_schema::{
    DefinitionItem, FieldItem, FormNode, FormSchema, Schema, SchemaNode, SchemaType, TypeKeyword,
};
use serde_json::Value;
use tracing::trace;

use crate::ids::IdGenerator;

/// Build the canonical document for a form tree.
///
/// Fields with an empty key never become properties. `required` lists the
/// keys of required fields in field order, followed by any names the root
/// requires that no field stands for.
pub fn to_schema(form: &FormSchema) -> SchemaNode {
    let mut schema = node_to_schema(&form.root);

    if form.declares_properties || !form.properties.is_empty() {
        let (properties, required) = fields_to_schema(&form.properties);
        schema.properties = Some(properties);
        schema.required = merge_required(required, schema.required.take());
        if schema.required.is_some() {
            schema.keywords.shift_remove("required");
        }
    }

    let defs: IndexMap<String, Schema<SchemaNode>> = form
        .definitions
        .iter()
        .filter(|def| !def.key.is_empty())
        .map(|def| (def.key.clone(), def.schema.map(node_to_schema)))
        .collect();
    if !defs.is_empty() {
        schema.defs.get_or_insert_with(IndexMap::new).extend(defs);
    }

    schema
}

/// Build a form tree for a canonical document.
///
/// Every field and definition gets a fresh id from `ids`; field order follows
/// the document's property order.
pub fn to_form(schema: &SchemaNode, ids: &mut IdGenerator) -> FormSchema {
    let mut root = node_to_form(schema, ids);
    let declares_properties = root.properties.is_some();
    let properties = root.properties.take().unwrap_or_default();
    let definitions = root
        .defs
        .take()
        .map(|defs| {
            defs.iter()
                .map(|(key, def)| {
                    let id = ids.next_id();
                    DefinitionItem::new(id, key.clone(), def.map(|node| node_to_form(node, ids)))
                })
                .collect()
        })
        .unwrap_or_default();

    FormSchema {
        root,
        properties,
        definitions,
        declares_properties,
    }
}

/// Convert one form node.
pub fn node_to_schema(node: &FormNode) -> SchemaNode {
    let mut keywords = node.keywords.clone();

    let loose = take_required(&mut keywords);
    let (properties, required) = match &node.properties {
        Some(fields) => {
            let (properties, required) = fields_to_schema(fields);
            let required = merge_required(required, loose);
            if required.is_some() {
                keywords.shift_remove("required");
            }
            (Some(properties), required)
        }
        None => (None, loose),
    };

    let schema_type = match &node.schema_type {
        Some(TypeKeyword::Name(SchemaType::Ref)) => None,
        other => other.clone(),
    };

    SchemaNode {
        schema_type,
        reference: node.reference.clone(),
        keywords,
        properties,
        required,
        items: node.items.as_ref().map(|items| items.map(node_to_schema)),
        additional_properties: node.additional_properties.clone(),
        all_of: node.all_of.clone(),
        any_of: node.any_of.clone(),
        one_of: node.one_of.clone(),
        not: node.not.clone(),
        defs: node.defs.clone(),
    }
}

/// Convert one canonical node.
pub fn node_to_form(node: &SchemaNode, ids: &mut IdGenerator) -> FormNode {
    let mut keywords = node.keywords.clone();

    // Required names without a matching property stay in the keyword map.
    let required = node.required.as_deref().unwrap_or_default();
    let loose: Option<Vec<&String>> = match &node.properties {
        Some(properties) => {
            let loose: Vec<&String> = required
                .iter()
                .filter(|name| !properties.contains_key(*name))
                .collect();
            (!loose.is_empty()).then_some(loose)
        }
        None => node.required.as_ref().map(|names| names.iter().collect()),
    };
    if let Some(loose) = loose {
        keywords.insert(
            "required".to_string(),
            Value::Array(loose.into_iter().cloned().map(Value::String).collect()),
        );
    }
    let properties = node
        .properties
        .as_ref()
        .map(|properties| fields_to_form(properties, required, ids));

    let schema_type = match (&node.schema_type, &node.reference) {
        (None, Some(_)) => Some(SchemaType::Ref.into()),
        (ty, _) => ty.clone(),
    };

    let items = node.items.as_ref().map(|items| items.map(|item| node_to_form(item, ids)));

    FormNode {
        schema_type,
        reference: node.reference.clone(),
        keywords,
        properties,
        items,
        additional_properties: node.additional_properties.clone(),
        all_of: node.all_of.clone(),
        any_of: node.any_of.clone(),
        one_of: node.one_of.clone(),
        not: node.not.clone(),
        defs: node.defs.clone(),
    }
}

fn fields_to_schema(
    fields: &[FieldItem],
) -> (IndexMap<String, Schema<SchemaNode>>, Option<Vec<String>>) {
    let mut properties = IndexMap::with_capacity(fields.len());
    let mut required: Vec<String> = Vec::new();
    for field in fields {
        if field.key.is_empty() {
            trace!(id = %field.id, "skipping field without a key");
            continue;
        }
        // Duplicate keys: the later field replaces the earlier one in place.
        properties.insert(field.key.clone(), field.schema.map(node_to_schema));
        if field.is_required && !required.contains(&field.key) {
            required.push(field.key.clone());
        }
    }
    let required = (!required.is_empty()).then_some(required);
    (properties, required)
}

fn fields_to_form(
    properties: &IndexMap<String, Schema<SchemaNode>>,
    required: &[String],
    ids: &mut IdGenerator,
) -> Vec<FieldItem> {
    properties
        .iter()
        .map(|(key, schema)| {
            let id = ids.next_id();
            FieldItem::new(id, key.clone(), schema.map(|node| node_to_form(node, ids)))
                .required(required.contains(key))
        })
        .collect()
}

/// Field-derived names first, then loose names not already listed.
fn merge_required(
    from_fields: Option<Vec<String>>,
    loose: Option<Vec<String>>,
) -> Option<Vec<String>> {
    match (from_fields, loose) {
        (Some(mut names), Some(loose)) => {
            for name in loose {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            Some(names)
        }
        (names, None) => names,
        (None, loose) => loose,
    }
}

/// Move a well-formed `required` keyword out of the untyped keyword map.
fn take_required(keywords: &mut IndexMap<String, Value>) -> Option<Vec<String>> {
    let Some(Value::Array(values)) = keywords.get("required") else {
        return None;
    };
    let names: Option<Vec<String>> = values
        .iter()
        .map(|v| v.as_str().map(String::from))
        .collect();
    if names.is_some() {
        keywords.shift_remove("required");
    }
    names
}
