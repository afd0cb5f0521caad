//! Per-session state. Every export or import runs against a fresh session;
//! nothing here is shared across compilation units.

use std::collections::{HashMap, HashSet};

use wisp_contract::{ContractDescription, Direction, MessageDescription};
use wisp_wsdl::schema::SchemaSet;
use wisp_wsdl::types::{Definition, DocumentSet, QName};

use crate::diag::Diagnostics;
use crate::error::Error;
use crate::naming::NamingResolver;
use crate::segregate::{self, SegregatedSchemas};

/// Tie-break policy for the reply part promoted to return value when no
/// explicit parameter order exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnPolicy {
    /// The first reply body part becomes the return value unless an
    /// identically named and namespaced part exists in the request (a byref
    /// echo, not a genuine return).
    InferFromRequest,
    /// Never promote a part; all reply parts stay ordinary parts.
    Never,
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Enables the wrapped-parameters convention.
    pub wrapped: bool,
    /// Resolve fault details through the operation's active strategy rather
    /// than the always-available fallback.
    pub use_message_format_faults: bool,
    pub return_policy: ReturnPolicy,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            wrapped: true,
            use_message_format_faults: false,
            return_policy: ReturnPolicy::InferFromRequest,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Also emit a SOAP binding for the exported portType.
    pub emit_binding: bool,
    pub transport: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            emit_binding: true,
            transport: "http://schemas.xmlsoap.org/soap/http".to_owned(),
        }
    }
}

/// State for one contract export.
pub struct ExportSession<'a> {
    pub options: &'a ExportOptions,
    pub document: Definition,
    pub schemas: SchemaSet,
    pub naming: NamingResolver,
    pub diagnostics: Diagnostics,
    exported: HashSet<(String, Direction)>,
    typed_messages: HashMap<(String, String), String>,
    typed_header_messages: HashMap<(String, String), String>,
}

impl<'a> ExportSession<'a> {
    pub fn new(contract: &ContractDescription, options: &'a ExportOptions) -> Self {
        Self {
            options,
            document: Definition::new(&contract.namespace),
            schemas: SchemaSet::default(),
            naming: NamingResolver::new(),
            diagnostics: Diagnostics::default(),
            exported: HashSet::new(),
            typed_messages: HashMap::new(),
            typed_header_messages: HashMap::new(),
        }
    }

    /// Exporting the same operation message twice in one session is a
    /// programmer error, not something to silently deduplicate.
    pub fn claim_export(&mut self, operation: &str, direction: Direction) -> Result<(), Error> {
        if !self.exported.insert((operation.to_owned(), direction)) {
            return Err(Error::DuplicateExport {
                operation: operation.to_owned(),
                message: match direction {
                    Direction::Input => "input".to_owned(),
                    Direction::Output => "output".to_owned(),
                },
            });
        }
        Ok(())
    }

    /// Already-exported WSDL message for a typed message identity, if any.
    pub fn typed_message(&self, message_type: &(String, String)) -> Option<&String> {
        self.typed_messages.get(message_type)
    }

    pub fn record_typed_message(&mut self, message_type: (String, String), name: String) {
        self.typed_messages.insert(message_type, name);
    }

    pub fn typed_header_message(&self, message_type: &(String, String)) -> Option<&String> {
        self.typed_header_messages.get(message_type)
    }

    pub fn record_typed_header_message(
        &mut self,
        message_type: (String, String),
        name: String,
    ) {
        self.typed_header_messages.insert(message_type, name);
    }

    /// Attaches the accumulated schema content and hands the document back.
    pub fn finish(mut self) -> (Definition, Diagnostics) {
        self.document.schema = self.schemas;
        (self.document, self.diagnostics)
    }
}

/// State for one document-set import.
pub struct ImportSession<'a> {
    pub options: &'a ImportOptions,
    pub docs: &'a DocumentSet,
    pub segregated: SegregatedSchemas,
    pub diagnostics: Diagnostics,
    /// PortTypes whose import already failed; dependents short-circuit.
    pub failed_port_types: HashSet<QName>,
    /// One wire message reachable from several operations maps to one
    /// abstract message, keyed by contract namespace, message identity and
    /// direction.
    pub message_cache: HashMap<(String, QName, Direction), MessageDescription>,
}

impl<'a> ImportSession<'a> {
    pub fn new(docs: &'a DocumentSet, options: &'a ImportOptions) -> Self {
        let mut diagnostics = Diagnostics::default();
        let segregated = segregate::segregate(docs, &mut diagnostics);
        Self {
            options,
            docs,
            segregated,
            diagnostics,
            failed_port_types: HashSet::new(),
            message_cache: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_export_is_detected() {
        let contract = ContractDescription::new("Svc", "urn:t");
        let options = ExportOptions::default();
        let mut session = ExportSession::new(&contract, &options);
        session.claim_export("Op", Direction::Input).unwrap();
        session.claim_export("Op", Direction::Output).unwrap();
        assert!(matches!(
            session.claim_export("Op", Direction::Input),
            Err(Error::DuplicateExport { .. })
        ));
    }
}
