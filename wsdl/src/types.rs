//! Object model for a parsed WSDL document set: messages, port types,
//! bindings with their SOAP extension elements, and services.

use std::fmt;

use crate::schema::SchemaSet;

/// A namespace-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub namespace: String,
    pub name: String,
}

impl QName {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.name)
        }
    }
}

/// SOAP body convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapStyle {
    Rpc,
    Document,
}

/// SOAP serialization convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapUse {
    Literal,
    Encoded,
}

/// One part of a WSDL message. Either `element` or `type_name` is set,
/// never both; neither being set is a malformed document the importer
/// reports rather than rejects at parse time.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub element: Option<QName>,
    pub type_name: Option<QName>,
}

impl Part {
    pub fn element(name: &str, element: QName) -> Self {
        Self {
            name: name.to_owned(),
            element: Some(element),
            type_name: None,
        }
    }

    pub fn typed(name: &str, type_name: QName) -> Self {
        Self {
            name: name.to_owned(),
            element: None,
            type_name: Some(type_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub name: String,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            parts: Vec::new(),
        }
    }

    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|part| part.name == name)
    }
}

/// Input or output of a portType operation. `message` is required by the
/// WSDL schema but kept optional so a missing attribute can be reported.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationMessage {
    pub name: Option<String>,
    pub message: Option<QName>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationFault {
    pub name: String,
    pub message: Option<QName>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub name: String,
    pub documentation: Option<String>,
    pub parameter_order: Option<Vec<String>>,
    pub input: Option<OperationMessage>,
    pub output: Option<OperationMessage>,
    pub faults: Vec<OperationFault>,
}

impl Operation {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            documentation: None,
            parameter_order: None,
            input: None,
            output: None,
            faults: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortType {
    pub name: String,
    pub operations: Vec<Operation>,
}

impl PortType {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            operations: Vec::new(),
        }
    }
}

/// soap:binding extension on a wsdl:binding; carries the default style.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapBinding {
    pub style: Option<SoapStyle>,
    pub transport: Option<String>,
}

/// soap:operation extension on a binding operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapOperationBinding {
    pub soap_action: Option<String>,
    pub style: Option<SoapStyle>,
}

/// soap:body extension. `parts` restricts which named message parts travel
/// in the body; `None` means all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapBodyBinding {
    pub use_: SoapUse,
    pub namespace: Option<String>,
    pub encoding: Option<String>,
    pub parts: Option<Vec<String>>,
}

impl SoapBodyBinding {
    pub fn literal() -> Self {
        Self {
            use_: SoapUse::Literal,
            namespace: None,
            encoding: None,
            parts: None,
        }
    }

    pub fn encoded() -> Self {
        Self {
            use_: SoapUse::Encoded,
            namespace: None,
            encoding: None,
            parts: None,
        }
    }
}

/// soap:header extension; points at a (message, part) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapHeaderBinding {
    pub message: Option<QName>,
    pub part: Option<String>,
    pub use_: SoapUse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoapFaultBinding {
    pub name: Option<String>,
    pub use_: SoapUse,
}

/// Binding of one operation input or output message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageBinding {
    pub body: Option<SoapBodyBinding>,
    pub headers: Vec<SoapHeaderBinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaultBinding {
    pub name: Option<String>,
    pub soap_fault: Option<SoapFaultBinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationBinding {
    pub name: String,
    pub soap_operation: Option<SoapOperationBinding>,
    pub input: Option<MessageBinding>,
    pub output: Option<MessageBinding>,
    pub faults: Vec<FaultBinding>,
}

impl OperationBinding {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            soap_operation: None,
            input: None,
            output: None,
            faults: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub port_type: QName,
    pub soap: Option<SoapBinding>,
    pub operations: Vec<OperationBinding>,
}

impl Binding {
    pub fn new(name: &str, port_type: QName) -> Self {
        Self {
            name: name.to_owned(),
            port_type,
            soap: None,
            operations: Vec::new(),
        }
    }

    /// Default style from the soap:binding extension.
    pub fn default_style(&self) -> Option<SoapStyle> {
        self.soap.as_ref().and_then(|soap| soap.style)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub name: String,
    pub binding: QName,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub name: String,
    pub ports: Vec<Port>,
}

/// One WSDL document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definition {
    pub target_namespace: String,
    pub messages: Vec<Message>,
    pub port_types: Vec<PortType>,
    pub bindings: Vec<Binding>,
    pub services: Vec<Service>,
    /// Inline `wsdl:types` schemas.
    pub schema: SchemaSet,
}

impl Definition {
    pub fn new(target_namespace: &str) -> Self {
        Self {
            target_namespace: target_namespace.to_owned(),
            ..Default::default()
        }
    }

    pub fn message(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|message| message.name == name)
    }

    pub fn has_message(&self, name: &str) -> bool {
        self.message(name).is_some()
    }
}

/// A collection of WSDL documents plus the merged schema set covering all of
/// their inline schemas. Built once per import session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSet {
    pub documents: Vec<Definition>,
    pub schemas: SchemaSet,
}

impl DocumentSet {
    pub fn new(documents: Vec<Definition>) -> Self {
        let mut schemas = SchemaSet::default();
        for document in &documents {
            schemas.merge(document.schema.clone());
        }
        Self { documents, schemas }
    }

    pub fn find_message(&self, name: &QName) -> Option<&Message> {
        self.documents
            .iter()
            .filter(|doc| doc.target_namespace == name.namespace)
            .find_map(|doc| doc.message(&name.name))
    }

    pub fn find_port_type(&self, name: &QName) -> Option<(&Definition, &PortType)> {
        self.documents
            .iter()
            .filter(|doc| doc.target_namespace == name.namespace)
            .find_map(|doc| {
                doc.port_types
                    .iter()
                    .find(|pt| pt.name == name.name)
                    .map(|pt| (doc, pt))
            })
    }

    /// All bindings (with their owning documents) whose `type` attribute
    /// references the given portType.
    pub fn bindings_for(&self, port_type: &QName) -> Vec<(&Definition, &Binding)> {
        self.documents
            .iter()
            .flat_map(|doc| doc.bindings.iter().map(move |binding| (doc, binding)))
            .filter(|(_, binding)| binding.port_type == *port_type)
            .collect()
    }

    /// Every binding operation that binds the named operation of a portType.
    pub fn operation_bindings_for(
        &self,
        port_type: &QName,
        operation: &str,
    ) -> Vec<(&Binding, &OperationBinding)> {
        self.bindings_for(port_type)
            .into_iter()
            .flat_map(|(_, binding)| {
                binding
                    .operations
                    .iter()
                    .filter(move |op| op.name == operation)
                    .map(move |op| (binding, op))
            })
            .collect()
    }
}
