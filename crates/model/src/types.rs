use serde::{Deserialize, Serialize};

/// Kind of a named type in [`crate::Project::types`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Struct,
    Alias,
    Interface,
    Any,
    Chan,
    Function,
    /// Builtin scalar (`int`, `string`, `time:Time` rendered by value, ...)
    Basic,
}

/// Named type resolved from a TypeID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Type {
    pub kind: TypeKind,

    /// Populated for [`TypeKind::Struct`]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub struct_fields: Vec<StructField>,

    /// Populated for [`TypeKind::Alias`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            struct_fields: Vec::new(),
            alias_of: None,
        }
    }

    pub fn structure(fields: Vec<StructField>) -> Self {
        Self {
            struct_fields: fields,
            ..Self::new(TypeKind::Struct)
        }
    }

    pub fn alias(target: impl Into<String>) -> Self {
        Self {
            alias_of: Some(target.into()),
            ..Self::new(TypeKind::Alias)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructField {
    pub name: String,
    pub type_ref: TypeRef,
}

impl StructField {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
        }
    }
}

/// Possibly composite reference to a type.
///
/// A slice keeps its element in `type_id` and sets `is_slice`. A map carries
/// its key and value shapes; `type_id` may then be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    #[serde(default)]
    pub type_id: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_slice: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_key: Option<Box<TypeRef>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_value: Option<Box<TypeRef>>,
}

impl TypeRef {
    pub fn named(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            ..Self::default()
        }
    }

    pub fn slice_of(type_id: impl Into<String>) -> Self {
        Self {
            is_slice: true,
            ..Self::named(type_id)
        }
    }

    pub fn map_of(key: TypeRef, value: TypeRef) -> Self {
        Self {
            map_key: Some(Box::new(key)),
            map_value: Some(Box::new(value)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_map(&self) -> bool {
        self.map_key.is_some() || self.map_value.is_some()
    }
}
