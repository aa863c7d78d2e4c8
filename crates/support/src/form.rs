//! Mapping between flat string bags and serde records.
//!
//! Field names come from the record's serde names, so
//! `#[serde(rename = "no-cache")]` is the external key.

use crate::error::{FormError, Result};
use serde::de::value::{MapDeserializer, StrDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer, Visitor};
use serde::{forward_to_deserialize_any, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Flat name-value bag exchanged with hosts.
pub type FormValues = BTreeMap<String, String>;

/// Encode `record` into a bag.
///
/// Only null and empty-string fields are omitted: `false`, `0` and empty
/// collections are kept so they survive a decode. Scalars use their plain
/// text; nested values are stored as compact JSON.
pub fn encode<T: Serialize>(record: &T) -> Result<FormValues> {
    let value = serde_json::to_value(record)?;
    let Value::Object(fields) = value else {
        return Err(FormError::NotARecord(value.to_string()));
    };

    let mut values = FormValues::new();
    for (name, field) in fields {
        let text = match field {
            Value::Null => continue,
            Value::String(text) if text.is_empty() => continue,
            Value::String(text) => text,
            Value::Bool(flag) => flag.to_string(),
            Value::Number(number) => number.to_string(),
            nested @ (Value::Array(_) | Value::Object(_)) => serde_json::to_string(&nested)?,
        };
        values.insert(name, text);
    }
    Ok(values)
}

/// Decode a record from `values`. Unknown keys are ignored; missing keys
/// follow the record's serde defaults.
pub fn decode<T: DeserializeOwned>(values: &FormValues) -> Result<T> {
    let entries = values
        .iter()
        .map(|(name, text)| (name.as_str(), FormValue(text.as_str())));
    let deserializer: MapDeserializer<'_, _, FormError> = MapDeserializer::new(entries);
    T::deserialize(deserializer)
}

/// One bag value, parsed according to what the record asks for.
#[derive(Clone, Copy)]
struct FormValue<'a>(&'a str);

impl FormValue<'_> {
    fn parse<N: FromStr>(self, expected: &'static str) -> Result<N> {
        self.0.trim().parse().map_err(|_| FormError::InvalidValue {
            value: self.0.to_string(),
            expected,
        })
    }

    fn parse_bool(self) -> Result<bool> {
        match self.0.trim() {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            _ => Err(FormError::InvalidValue {
                value: self.0.to_string(),
                expected: "boolean",
            }),
        }
    }
}

impl<'de> IntoDeserializer<'de, FormError> for FormValue<'_> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

macro_rules! deserialize_number {
    ($($method:ident => $visit:ident: $ty:ty, $expected:literal;)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                visitor.$visit(self.parse::<$ty>($expected)?)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for FormValue<'_> {
    type Error = FormError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_str(self.0)
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_bool(self.parse_bool()?)
    }

    deserialize_number! {
        deserialize_i8 => visit_i8: i8, "integer";
        deserialize_i16 => visit_i16: i16, "integer";
        deserialize_i32 => visit_i32: i32, "integer";
        deserialize_i64 => visit_i64: i64, "integer";
        deserialize_u8 => visit_u8: u8, "unsigned integer";
        deserialize_u16 => visit_u16: u16, "unsigned integer";
        deserialize_u32 => visit_u32: u32, "unsigned integer";
        deserialize_u64 => visit_u64: u64, "unsigned integer";
        deserialize_f32 => visit_f32: f32, "float";
        deserialize_f64 => visit_f64: f64, "float";
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.0.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let unit: StrDeserializer<'_, FormError> = self.0.into_deserializer();
        unit.deserialize_enum(name, variants, visitor)
    }

    forward_to_deserialize_any! {
        char str string bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Options {
        #[serde(rename = "contracts-dir")]
        contracts_dir: String,
        #[serde(rename = "no-cache")]
        no_cache: bool,
        retries: u32,
        offset: i64,
        ratio: f64,
        label: Option<String>,
        mode: Mode,
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Mode {
        #[default]
        Fast,
        Full,
    }

    fn bag(pairs: &[(&str, &str)]) -> FormValues {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn decodes_every_scalar_kind() {
        let options: Options = decode(&bag(&[
            ("contracts-dir", "./api"),
            ("no-cache", "true"),
            ("retries", "3"),
            ("offset", "-7"),
            ("ratio", "0.5"),
            ("label", "nightly"),
            ("mode", "full"),
        ]))
        .unwrap();
        assert_eq!(
            options,
            Options {
                contracts_dir: "./api".to_string(),
                no_cache: true,
                retries: 3,
                offset: -7,
                ratio: 0.5,
                label: Some("nightly".to_string()),
                mode: Mode::Full,
            }
        );
    }

    #[test]
    fn unknown_keys_are_ignored_and_missing_keys_default() {
        let options: Options = decode(&bag(&[("project", "{}"), ("no-cache", "1")])).unwrap();
        assert_eq!(
            options,
            Options {
                no_cache: true,
                ..Options::default()
            }
        );
    }

    #[test]
    fn empty_optional_decodes_as_none() {
        let options: Options = decode(&bag(&[("label", "")])).unwrap();
        assert_eq!(options.label, None);
    }

    #[test]
    fn malformed_number_names_the_value() {
        let err = decode::<Options>(&bag(&[("retries", "many")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid unsigned integer value: \"many\"");
    }

    #[test]
    fn encode_omits_only_null_and_empty_strings() {
        let values = encode(&Options {
            retries: 2,
            label: None,
            ..Options::default()
        })
        .unwrap();
        assert_eq!(
            values,
            bag(&[
                ("mode", "fast"),
                ("no-cache", "false"),
                ("offset", "0"),
                ("ratio", "0.0"),
                ("retries", "2"),
            ])
        );
    }

    #[test]
    fn encode_rejects_non_records() {
        assert!(matches!(encode(&3), Err(FormError::NotARecord(_))));
    }
}
