//! # tg model
//!
//! Canonical semantic model shared by the ingestion core and the emitters.
//!
//! ```text
//! Project
//!     ├── contracts[]   ── methods[] ── args[] / results[]  (Variable → TypeRef)
//!     ├── types{}       ── TypeID → Type (struct fields / alias target)
//!     └── annotations{}
//! ```
//!
//! Types are referenced by symbolic `TypeID` strings and resolved through
//! [`Project::types`]; the graph may be cyclic.

mod ids;
mod project;
mod types;

pub use ids::{
    is_anonymous_interface, is_generic_instance, ANNOTATION_HTTP_SERVER, ANONYMOUS_INTERFACE_MARK,
    CONTEXT_TYPE_ID, EMPTY_INTERFACE_TYPE_ID, ERROR_TYPE_ID, IO_READER_TYPE_ID,
    IO_READ_CLOSER_TYPE_ID, UNSAFE_POINTER_TYPE_ID,
};
pub use project::{Annotations, Contract, GitMeta, Implementation, Method, Project, Variable};
pub use types::{StructField, Type, TypeKind, TypeRef};
