//! Bidirectional mapping between abstract contracts and WSDL documents:
//! exporting [`wisp_contract::ContractDescription`]s to WSDL portTypes,
//! messages, schema elements and SOAP bindings, and importing document sets
//! back into contracts.

pub mod diag;
pub mod error;
pub mod export;
pub mod faults;
pub mod import;
pub mod naming;
pub mod parts;
pub mod segregate;
pub mod session;
pub mod shape;
pub mod strategy;
pub mod style;

pub use diag::{Diagnostic, Diagnostics};
pub use error::Error;
pub use export::{export_contract, ExportResult};
pub use import::{import_contracts, ImportResult};
pub use session::{ExportOptions, ImportOptions, ReturnPolicy};
