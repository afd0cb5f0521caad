//! Abstract RPC contract model: operations, typed messages, headers and
//! faults, independent of any wire description. Built by a caller (or by the
//! WSDL importer) and consumed by the WSDL exporter.

/// Reference to the abstract type backing a message part or fault detail.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A schema-named type.
    Named { namespace: String, name: String },
    /// An anonymous type, known only through the global element declaring it.
    /// Cannot be named in a bare `type=` attribute.
    Anonymous {
        element_namespace: String,
        element_name: String,
    },
    /// The whole message is an untyped placeholder (generic message body).
    AnyMessage,
    /// The body is a raw stream.
    Stream,
}

impl TypeRef {
    pub fn named(namespace: &str, name: &str) -> Self {
        TypeRef::Named {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, TypeRef::Stream)
    }

    pub fn is_any_message(&self) -> bool {
        matches!(self, TypeRef::AnyMessage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Document,
    Rpc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessagePartDescription {
    pub name: String,
    pub namespace: String,
    pub ty: TypeRef,
    pub multiple: bool,
    /// Serialization order within the body.
    pub index: usize,
    /// Collision-adjusted WSDL part name, back-filled during export.
    pub unique_part_name: Option<String>,
}

impl MessagePartDescription {
    pub fn new(name: &str, namespace: &str, ty: TypeRef) -> Self {
        Self {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            ty,
            multiple: false,
            index: 0,
            unique_part_name: None,
        }
    }

    /// The part name to use on the wire once collisions are resolved.
    pub fn wire_name(&self) -> &str {
        self.unique_part_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageHeaderDescription {
    pub part: MessagePartDescription,
    pub must_understand: bool,
    pub actor: Option<String>,
    pub relay: bool,
    /// Marker for the "unknown header collection"; never a body part and
    /// never bound on the wire.
    pub unknown_headers: bool,
}

impl MessageHeaderDescription {
    pub fn new(part: MessagePartDescription) -> Self {
        Self {
            part,
            must_understand: false,
            actor: None,
            relay: false,
            unknown_headers: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageBody {
    /// Non-empty iff the wrapped convention applies to this message.
    pub wrapper_name: Option<String>,
    pub wrapper_namespace: Option<String>,
    pub parts: Vec<MessagePartDescription>,
    /// At most one; only meaningful on reply messages.
    pub return_value: Option<MessagePartDescription>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageDescription {
    pub direction: Direction,
    pub action: Option<String>,
    /// Explicit WSDL message name; generated from the operation when absent.
    pub message_name: Option<String>,
    /// Identity of a reusable typed message, used to deduplicate the wire
    /// message across operations. (namespace, name) of the message type.
    pub message_type: Option<(String, String)>,
    pub body: MessageBody,
    pub headers: Vec<MessageHeaderDescription>,
}

impl MessageDescription {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            action: None,
            message_name: None,
            message_type: None,
            body: MessageBody::default(),
            headers: Vec::new(),
        }
    }

    /// True when the body reduces to the untyped-message placeholder.
    pub fn is_untyped(&self) -> bool {
        let single = match (&self.body.return_value, self.body.parts.as_slice()) {
            (Some(ret), []) => Some(ret),
            (None, [part]) => Some(part),
            _ => None,
        };
        single.map(|part| part.ty.is_any_message()).unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaultDescription {
    pub name: String,
    pub action: Option<String>,
    /// Name/namespace of the detail element carried inside the SOAP fault.
    pub element_name: Option<String>,
    pub namespace: Option<String>,
    pub detail_type: Option<TypeRef>,
}

impl FaultDescription {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            action: None,
            element_name: None,
            namespace: None,
            detail_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescription {
    pub name: String,
    /// Request first, optional reply second.
    pub messages: Vec<MessageDescription>,
    pub faults: Vec<FaultDescription>,
    pub known_types: Vec<TypeRef>,
    pub style: Style,
    pub is_encoded: bool,
    /// Callback operations get "Callback" worked into generated message names.
    pub is_server_initiated: bool,
}

impl OperationDescription {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            messages: Vec::new(),
            faults: Vec::new(),
            known_types: Vec::new(),
            style: Style::Document,
            is_encoded: false,
            is_server_initiated: false,
        }
    }

    pub fn request(&self) -> Option<&MessageDescription> {
        self.messages.first()
    }

    pub fn reply(&self) -> Option<&MessageDescription> {
        self.messages.get(1)
    }

    pub fn is_one_way(&self) -> bool {
        self.messages.len() < 2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractDescription {
    pub name: String,
    pub namespace: String,
    pub operations: Vec<OperationDescription>,
}

impl ContractDescription {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            operations: Vec::new(),
        }
    }
}
