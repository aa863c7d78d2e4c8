use crate::ids::{ANNOTATION_HTTP_SERVER, CONTEXT_TYPE_ID, ERROR_TYPE_ID};
use crate::types::{Type, TypeRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Annotation name → value. Ordered so serialized projects are byte-stable.
pub type Annotations = BTreeMap<String, String>;

/// Root aggregate produced by one ingestion.
///
/// `project_id` and `marker` are stamped by the ingestion core right before the
/// project is cached; a project loaded from cache carries the values it was
/// validated against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub module_path: String,

    #[serde(default)]
    pub project_id: String,

    #[serde(default)]
    pub marker: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitMeta>,

    #[serde(default)]
    pub contracts: Vec<Contract>,

    #[serde(default)]
    pub types: BTreeMap<String, Type>,

    #[serde(default)]
    pub annotations: Annotations,
}

impl Project {
    pub fn new(module_path: impl Into<String>) -> Self {
        Self {
            module_path: module_path.into(),
            ..Self::default()
        }
    }

    /// Resolve a TypeID through the project type map.
    pub fn type_of(&self, type_id: &str) -> Option<&Type> {
        self.types.get(type_id)
    }

    pub fn contract(&self, id: &str) -> Option<&Contract> {
        self.contracts.iter().find(|c| c.id == id)
    }

    /// Branch recorded at ingestion, empty when unknown.
    pub fn branch(&self) -> &str {
        self.git.as_ref().map_or("", |git| git.branch.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitMeta {
    pub branch: String,

    /// Normalized remote URL (`host/path`), empty without an `origin` remote
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remote: String,
}

/// A named service interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub name: String,
    pub pkg_path: String,

    #[serde(default)]
    pub methods: Vec<Method>,

    #[serde(default)]
    pub implementations: Vec<Implementation>,

    #[serde(default)]
    pub annotations: Annotations,
}

impl Contract {
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.contains_key(name)
    }

    pub fn is_http_server(&self) -> bool {
        self.has_annotation(ANNOTATION_HTTP_SERVER)
    }
}

/// Concrete type implementing a contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Implementation {
    pub name: String,
    pub pkg_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub name: String,

    #[serde(default)]
    pub args: Vec<Variable>,

    #[serde(default)]
    pub results: Vec<Variable>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: Annotations,
}

/// Argument or result of a method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    #[serde(default)]
    pub name: String,
    pub type_ref: TypeRef,
}

impl Variable {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
        }
    }

    pub fn type_id(&self) -> &str {
        &self.type_ref.type_id
    }

    pub fn is_context(&self) -> bool {
        self.type_id() == CONTEXT_TYPE_ID
    }

    pub fn is_error(&self) -> bool {
        self.type_id() == ERROR_TYPE_ID
    }
}
