//! Deserializers that degrade malformed keyword values to "absent".
//!
//! Editors hold documents that are half-typed most of the time. A keyword
//! with the wrong shape must not make the whole node unreadable, so each
//! helper reads the raw JSON value first and keeps only what converts.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{AdditionalProperties, Items};

fn convert<N: DeserializeOwned>(value: Value) -> Option<N> {
    serde_json::from_value(value).ok()
}

pub(crate) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

pub(crate) fn string_list<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(values) => Some(
            values
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

pub(crate) fn list<'de, D, N>(d: D) -> Result<Option<Vec<N>>, D::Error>
where
    D: Deserializer<'de>,
    N: DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        Value::Array(values) => Some(values.into_iter().filter_map(convert).collect()),
        _ => None,
    })
}

pub(crate) fn vec<'de, D, N>(d: D) -> Result<Vec<N>, D::Error>
where
    D: Deserializer<'de>,
    N: DeserializeOwned,
{
    list(d).map(Option::unwrap_or_default)
}

pub(crate) fn map<'de, D, N>(d: D) -> Result<Option<IndexMap<String, N>>, D::Error>
where
    D: Deserializer<'de>,
    N: DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        Value::Object(entries) => Some(
            entries
                .into_iter()
                .filter_map(|(key, v)| convert(v).map(|node| (key, node)))
                .collect(),
        ),
        _ => None,
    })
}

pub(crate) fn boxed<'de, D, N>(d: D) -> Result<Option<Box<N>>, D::Error>
where
    D: Deserializer<'de>,
    N: DeserializeOwned,
{
    Ok(convert(Value::deserialize(d)?).map(Box::new))
}

pub(crate) fn items<'de, D, N>(d: D) -> Result<Option<Items<N>>, D::Error>
where
    D: Deserializer<'de>,
    N: DeserializeOwned,
{
    Ok(Items::from_value(Value::deserialize(d)?))
}

pub(crate) fn additional_properties<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<AdditionalProperties>, D::Error> {
    Ok(AdditionalProperties::from_value(Value::deserialize(d)?))
}
