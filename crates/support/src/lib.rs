//! # tg support
//!
//! Helpers at the host boundary of the ingestion core:
//!
//! - [`form`]: flat `name → value` bags to and from serde records
//! - [`ContractFilter`]: `contracts` selection lists (`Users,Orders` or `!Billing`)
//! - [`ResponseBuilder`]: the core→host response bag

mod error;
pub mod form;
mod response;
mod selection;

pub use error::{FormError, Result};
pub use form::FormValues;
pub use response::{Response, ResponseBuilder, RESPONSE_OUT, RESPONSE_PROJECT};
pub use selection::{split_list, ContractFilter};
