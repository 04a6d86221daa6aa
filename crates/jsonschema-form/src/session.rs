use indexmap::IndexMap;
use jsonschema_schema::{
    AdditionalProperties, DRAFT_2020_12, DefinitionItem, FieldItem, FormNode, FormSchema,
    SchemaNode, SchemaType,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::form_state::FormState;
use crate::ids::IdGenerator;
use crate::meta::{
    DraftMetaValidator, FragmentError, MetaError, MetaSchemaError, MetaValidator,
    validate_keyword_text,
};
use crate::path::{self, PathError};
use crate::projection::project_errors;
use crate::refs::{dangling_references, update_references};
use crate::transform::{to_form, to_schema};

/// Callback receiving the derived schema whenever it changes.
pub type OnChange = Box<dyn FnMut(&SchemaNode)>;

/// Shape of the document's root.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, strum::EnumString, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum RootType {
    #[default]
    Object,
    Array,
}

impl RootType {
    pub fn schema_type(self) -> SchemaType {
        match self {
            Self::Object => SchemaType::Object,
            Self::Array => SchemaType::Array,
        }
    }
}

/// Settings for [`EditorSession::new`].
pub struct SessionOptions {
    pub root_type: RootType,
    /// Initial document. When absent the session starts from the default
    /// tree for `root_type`.
    pub default_value: Option<SchemaNode>,
    pub on_change: Option<OnChange>,
    /// `$schema` written into fresh roots.
    pub dialect: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            root_type: RootType::default(),
            default_value: None,
            on_change: None,
            dialect: DRAFT_2020_12.to_string(),
        }
    }
}

/// Which field's settings panel is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SettingsFocus {
    #[default]
    Closed,
    Open(String),
}

/// Text typed into a keyword editor that has not been accepted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingText {
    pub text: String,
    pub error: FragmentError,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("failed to serialize the form tree: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    MetaSchema(#[from] MetaSchemaError),
    #[error("no field at '{0}'")]
    NoField(String),
    #[error("no definition at index {0}")]
    NoDefinition(usize),
}

/// A live editing session over one schema document.
///
/// Every mutation goes through the form container and is followed by a
/// recompute: derive the canonical schema, and when its serialized form
/// changed, notify `on_change`, meta-validate it and project the errors
/// onto field paths.
pub struct EditorSession<V = DraftMetaValidator> {
    form: FormState,
    ids: IdGenerator,
    root_type: RootType,
    dialect: String,
    validator: V,
    on_change: Option<OnChange>,
    schema: SchemaNode,
    serialized: String,
    validation: Option<Vec<MetaError>>,
    focus: SettingsFocus,
    pending: IndexMap<String, PendingText>,
}

impl EditorSession<DraftMetaValidator> {
    /// Start a session validated against the draft 2020-12 meta-schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the meta-schema cannot be compiled.
    pub fn new(options: SessionOptions) -> Result<Self, SessionError> {
        Self::with_validator(options, DraftMetaValidator::new()?)
    }
}

impl<V: MetaValidator> EditorSession<V> {
    /// Start a session with a custom meta-validator.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial tree cannot be serialized.
    pub fn with_validator(options: SessionOptions, validator: V) -> Result<Self, SessionError> {
        let mut ids = IdGenerator::new();
        let tree = match &options.default_value {
            Some(schema) => to_form(schema, &mut ids),
            None => default_form(options.root_type, &options.dialect, &mut ids),
        };
        let mut session = Self {
            form: FormState::new(&tree)?,
            ids,
            root_type: options.root_type,
            dialect: options.dialect,
            validator,
            on_change: options.on_change,
            schema: SchemaNode::default(),
            serialized: String::new(),
            validation: None,
            focus: SettingsFocus::Closed,
            pending: IndexMap::new(),
        };
        session.sync()?;
        Ok(session)
    }

    /// Replace the change callback.
    pub fn on_change(&mut self, callback: impl FnMut(&SchemaNode) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    // ------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------

    /// The canonical schema derived from the current form tree.
    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    /// Meta-validation errors of the derived schema, `None` when valid.
    pub fn validation_errors(&self) -> Option<&[MetaError]> {
        self.validation.as_deref()
    }

    /// Field errors keyed by form path.
    pub fn field_errors(&self) -> &IndexMap<String, String> {
        self.form.errors()
    }

    /// The form tree as typed values.
    pub fn form(&self) -> FormSchema {
        self.form.watch()
    }

    pub fn form_state(&self) -> &FormState {
        &self.form
    }

    pub fn fields(&self) -> Vec<FieldItem> {
        self.form.watch().properties
    }

    pub fn definitions(&self) -> Vec<DefinitionItem> {
        self.form.watch().definitions
    }

    pub fn focus(&self) -> &SettingsFocus {
        &self.focus
    }

    pub fn root_type(&self) -> RootType {
        self.root_type
    }

    pub fn value(&self, path: &str) -> Option<&Value> {
        self.form.get(path)
    }

    /// Text held back by a keyword editor, with the reason it was rejected.
    pub fn pending_text(&self, path: &str) -> Option<&PendingText> {
        self.pending.get(path)
    }

    // ------------------------------------------------------------------
    // Fields
    // ------------------------------------------------------------------

    /// Append a top-level field. Returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the form tree cannot be updated.
    pub fn add_field(&mut self) -> Result<String, SessionError> {
        self.append_field("properties")
    }

    /// Append a field under `parent_path`, which addresses either a field
    /// (`properties.0`) or a node (`properties.1.schema.items`). Returns the
    /// new field's id.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoField`] if nothing exists at `parent_path`.
    pub fn add_nested_field(&mut self, parent_path: &str) -> Result<String, SessionError> {
        let list = self.nested_list_path(parent_path)?;
        self.append_field(&list)
    }

    /// Remove the top-level field at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn remove_field(&mut self, index: usize) -> Result<(), SessionError> {
        self.form.remove("properties", index)?;
        self.sync()
    }

    /// Remove the field at `index` under `parent_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent or the index does not exist.
    pub fn remove_nested_field(
        &mut self,
        parent_path: &str,
        index: usize,
    ) -> Result<(), SessionError> {
        let list = self.nested_list_path(parent_path)?;
        self.form.remove(&list, index)?;
        self.sync()
    }

    /// Replace the schema of the field at `field_path` with the starting
    /// schema for `new_type`. Keywords of the previous type are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoField`] if there is no field at `field_path`.
    pub fn handle_type_change(
        &mut self,
        field_path: &str,
        new_type: SchemaType,
    ) -> Result<(), SessionError> {
        if self.form.get(field_path).is_none() {
            return Err(SessionError::NoField(field_path.to_string()));
        }
        let schema = serde_json::to_value(schema_for_type(new_type))?;
        self.form.set(&format!("{field_path}.schema"), schema)?;
        self.sync()
    }

    // ------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------

    /// Append a definition. Returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the form tree cannot be updated.
    pub fn add_definition(&mut self) -> Result<String, SessionError> {
        let id = self.ids.next_id();
        let mut schema = FormNode::of_type(SchemaType::Object);
        schema.additional_properties = Some(AdditionalProperties::Bool(true));
        let def = DefinitionItem::new(id.clone(), format!("def_{id}"), schema);
        self.form.append("definitions", serde_json::to_value(&def)?)?;
        self.sync()?;
        Ok(id)
    }

    /// Rename the definition at `index`, rewriting references to it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoDefinition`] if `index` is out of range.
    pub fn rename_definition(&mut self, index: usize, new_key: &str) -> Result<(), SessionError> {
        let mut tree = self.form.watch();
        let def = tree
            .definitions
            .get_mut(index)
            .ok_or(SessionError::NoDefinition(index))?;
        let old_key = core::mem::replace(&mut def.key, new_key.to_string());
        if old_key != new_key && !old_key.is_empty() {
            update_references(&mut tree, &old_key, Some(new_key), Some(index));
        }
        self.write_tree(&tree)?;
        self.sync()
    }

    /// Remove the definition at `index`, clearing references to it first.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoDefinition`] if `index` is out of range.
    pub fn remove_definition(&mut self, index: usize) -> Result<(), SessionError> {
        let mut tree = self.form.watch();
        let key = tree
            .definitions
            .get(index)
            .map(|def| def.key.clone())
            .ok_or(SessionError::NoDefinition(index))?;
        if !key.is_empty() {
            update_references(&mut tree, &key, None, Some(index));
        }
        tree.definitions.remove(index);
        self.write_tree(&tree)?;
        self.sync()
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    /// Set a single value in the form tree.
    ///
    /// Writing `definitions.<i>.key` is a rename and rewrites references.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be written.
    pub fn set_value(&mut self, path: &str, value: Value) -> Result<(), SessionError> {
        if let (Some(index), Value::String(key)) = (definition_key_index(path), &value) {
            return self.rename_definition(index, key);
        }
        self.form.set(path, value)?;
        self.sync()
    }

    /// Accept text from a free-form keyword editor (`allOf`, `not`,
    /// `additionalProperties`, ...).
    ///
    /// Text that parses and passes meta-validation is written to `path`.
    /// Otherwise the text and the reason are kept as pending and the form
    /// value stays as it was.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is empty or cannot be written.
    pub fn set_keyword_text(&mut self, path: &str, text: &str) -> Result<(), SessionError> {
        let keyword = path::segments(path).last().ok_or(PathError::Empty)?;
        match validate_keyword_text(&self.validator, keyword, text) {
            Ok(value) => {
                self.pending.shift_remove(path);
                self.set_value(path, value)
            }
            Err(error) => {
                debug!(path, %error, "keyword text rejected");
                self.pending.insert(
                    path.to_string(),
                    PendingText {
                        text: text.to_string(),
                        error,
                    },
                );
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    pub fn open_settings(&mut self, path: impl Into<String>) {
        self.focus = SettingsFocus::Open(path.into());
    }

    pub fn close_settings(&mut self) {
        self.focus = SettingsFocus::Closed;
    }

    /// Go back to the default tree for the root type, dropping definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the default tree cannot be serialized.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        let tree = default_form(self.root_type, &self.dialect, &mut self.ids);
        self.form.reset(&tree)?;
        self.pending.clear();
        self.sync()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn append_field(&mut self, list_path: &str) -> Result<String, SessionError> {
        let field = new_field(&mut self.ids);
        let id = field.id.clone();
        self.form.append(list_path, serde_json::to_value(&field)?)?;
        self.sync()?;
        Ok(id)
    }

    fn nested_list_path(&self, parent_path: &str) -> Result<String, SessionError> {
        if parent_path.is_empty() || parent_path == "root" {
            return Ok("properties".to_string());
        }
        let parent = self
            .form
            .get(parent_path)
            .and_then(Value::as_object)
            .ok_or_else(|| SessionError::NoField(parent_path.to_string()))?;
        Ok(if parent.contains_key("schema") {
            format!("{parent_path}.schema.properties")
        } else {
            format!("{parent_path}.properties")
        })
    }

    fn write_tree(&mut self, tree: &FormSchema) -> Result<(), SessionError> {
        self.form.set("root", serde_json::to_value(&tree.root)?)?;
        self.form
            .set("properties", serde_json::to_value(&tree.properties)?)?;
        self.form
            .set("definitions", serde_json::to_value(&tree.definitions)?)?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(revision = self.form.revision()))]
    fn sync(&mut self) -> Result<(), SessionError> {
        let tree = self.form.watch();
        let schema = to_schema(&tree);
        let serialized = serde_json::to_string(&schema)?;
        if serialized == self.serialized {
            debug!("derived schema unchanged");
            return Ok(());
        }
        self.serialized = serialized;
        self.schema = schema;

        if let Some(on_change) = self.on_change.as_mut() {
            on_change(&self.schema);
        }

        let document = serde_json::to_value(&self.schema)?;
        self.validation = self.validator.validate(&document);
        self.form.clear_errors();
        if let Some(errors) = &self.validation {
            debug!(count = errors.len(), "derived schema failed meta-validation");
            for error in project_errors(&tree, errors) {
                self.form.set_field_error(error.path, error.message);
            }
        }

        for reference in dangling_references(&tree) {
            warn!(%reference, "reference to a missing definition");
        }
        for keyword in self.schema.unrecognized_keywords() {
            warn!(keyword, "keyword is not editable in the form");
        }
        Ok(())
    }
}

/// The tree a fresh session starts from.
fn default_form(root_type: RootType, dialect: &str, ids: &mut IdGenerator) -> FormSchema {
    let mut root = FormNode::of_type(root_type.schema_type());
    root.keywords
        .insert("$schema".to_string(), Value::String(dialect.to_string()));
    let properties = match root_type {
        RootType::Object => {
            let mut field = new_field(ids);
            field.schema = FormNode::of_type(SchemaType::Number).into();
            vec![field]
        }
        RootType::Array => Vec::new(),
    };
    FormSchema {
        root,
        properties,
        definitions: Vec::new(),
        declares_properties: root_type == RootType::Object,
    }
}

fn new_field(ids: &mut IdGenerator) -> FieldItem {
    let id = ids.next_id();
    let key = format!("field_{id}");
    FieldItem::new(id, key, FormNode::of_type(SchemaType::String))
}

/// Starting schema for a field switched to `ty`.
fn schema_for_type(ty: SchemaType) -> FormNode {
    let mut node = FormNode::of_type(ty);
    match ty {
        SchemaType::Object => {
            node.properties = Some(Vec::new());
            node.additional_properties = Some(AdditionalProperties::Bool(true));
        }
        SchemaType::Ref => node.reference = Some(String::new()),
        _ => {}
    }
    node
}

/// `definitions.<i>.key` → `i`.
fn definition_key_index(path: &str) -> Option<usize> {
    let parts: Vec<&str> = path::segments(path).collect();
    match parts.as_slice() {
        ["definitions", index, "key"] => index.parse().ok(),
        _ => None,
    }
}
