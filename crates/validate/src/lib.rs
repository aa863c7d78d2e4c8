//! # tg validate
//!
//! Admissibility rules for contract signatures. A method may only carry
//! types that can cross a transport boundary:
//!
//! ```text
//! Variable ──> TypeRef ──┬── type_id  ──> Project::types ──┬── struct fields ─┐
//!                        ├── map key                        └── alias target ──┤
//!                        └── map value                                         │
//!                              ^───────────── (visited set closes cycles) ─────┘
//! ```
//!
//! Generic instantiations, channels, functions, `unsafe:Pointer` and
//! non-allowlisted interfaces are rejected wherever they appear.

mod error;
mod validator;

pub use error::{Rejection, Result, ValidationError, VarRole};
pub use validator::{validate_contract, validate_project};
