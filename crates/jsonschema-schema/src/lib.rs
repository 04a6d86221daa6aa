#![doc = include_str!("../README.md")]

mod form;
pub mod keywords;
mod lenient;
mod node;

pub use form::{DefinitionItem, FieldItem, FormNode, FormSchema};
pub use keywords::{DRAFT_2020_12, SchemaType, TypeKeyword};
pub use node::{AdditionalProperties, Items, Schema, SchemaNode};
