use quick_xml::{
    events::{attributes::Attributes, BytesStart, BytesText, Event},
    Reader,
};
use std::{
    collections::HashMap,
    io::{BufRead, BufReader},
};
use tracing::{debug, trace, warn};
use url::Url;

use super::{
    error,
    schema::{
        AnyElement, ComplexType, ElementDef, LocalElement, MaxOccurs, Particle, Schema,
        SchemaSet, SchemaType, SequenceItem, SimpleType, TypeDef,
    },
    types::{
        Binding, Definition, DocumentSet, FaultBinding, Message, MessageBinding, Operation,
        OperationBinding, OperationFault, OperationMessage, Part, Port, PortType, QName, Service,
        SoapBinding, SoapBodyBinding, SoapFaultBinding, SoapHeaderBinding, SoapOperationBinding,
        SoapStyle, SoapUse,
    },
};

fn get_attributes<B: BufRead, const N: usize>(
    reader: &Reader<B>,
    attributes: Attributes<'_>,
    names: [&'static str; N],
) -> Result<[Option<String>; N], error::Error> {
    const INIT: Option<String> = None;
    let mut result = [INIT; N];

    for attribute in attributes {
        let attribute = attribute?;
        let key = reader.decode(attribute.key)?;

        for (index, name) in names.iter().enumerate() {
            if key == *name {
                result[index] = Some(reader.decode(attribute.value.as_ref())?.to_owned());
                break;
            }
        }
    }

    Ok(result)
}

fn split_namespaced_name(prefixed_name: &str) -> (Option<&str>, &str) {
    let mut split = prefixed_name.split(':');
    let first = split.next().unwrap_or(prefixed_name);
    let second = split.next();

    if let Some(second) = second {
        (Some(first), second)
    } else {
        (None, first)
    }
}

fn require(
    value: Option<String>,
    element: &'static str,
    attribute: &'static str,
) -> Result<String, error::Error> {
    value.ok_or(error::Error::MissingAttribute { element, attribute })
}

fn parse_flag(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some("true") | Some("1"))
}

fn parse_qualified(value: Option<String>) -> Option<bool> {
    value.map(|value| value == "qualified")
}

fn parse_style(value: Option<String>) -> Result<Option<SoapStyle>, error::Error> {
    match value.as_deref() {
        None => Ok(None),
        Some("rpc") => Ok(Some(SoapStyle::Rpc)),
        Some("document") => Ok(Some(SoapStyle::Document)),
        Some(other) => Err(error::Error::InvalidAttribute {
            attribute: "style",
            value: other.to_owned(),
        }),
    }
}

fn parse_use(value: Option<String>) -> Result<SoapUse, error::Error> {
    match value.as_deref() {
        None | Some("literal") => Ok(SoapUse::Literal),
        Some("encoded") => Ok(SoapUse::Encoded),
        Some(other) => Err(error::Error::InvalidAttribute {
            attribute: "use",
            value: other.to_owned(),
        }),
    }
}

fn parse_min_occurs(value: Option<String>) -> Result<u32, error::Error> {
    match value {
        None => Ok(1),
        Some(value) => match value.parse() {
            Ok(count) => Ok(count),
            Err(_) => Err(error::Error::InvalidAttribute {
                attribute: "minOccurs",
                value,
            }),
        },
    }
}

fn parse_max_occurs(value: Option<String>) -> Result<MaxOccurs, error::Error> {
    match value.as_deref() {
        None => Ok(MaxOccurs::default()),
        Some("unbounded") => Ok(MaxOccurs::Unbounded),
        Some(count) => match count.parse() {
            Ok(count) => Ok(MaxOccurs::Bounded(count)),
            Err(_) => Err(error::Error::InvalidAttribute {
                attribute: "maxOccurs",
                value: count.to_owned(),
            }),
        },
    }
}

#[derive(Clone, Default)]
struct CurrentNamespaces {
    target: Vec<String>,
    namespaces: HashMap<Option<String>, String>,
}

impl CurrentNamespaces {
    fn push_target_namespace(&mut self, namespace: String) {
        self.target.push(namespace);
    }

    fn pop_target_namespace(&mut self) {
        self.target.pop();
    }

    fn add_namespace_prefix(&mut self, prefix: Option<String>, namespace: &str) {
        self.namespaces.insert(prefix, namespace.to_owned());
    }

    fn resolve(&self, prefixed_name: &str) -> Result<QName, error::Error> {
        let (prefix, local_name) = split_namespaced_name(prefixed_name);

        if let Some(namespace) = self.namespaces.get(&prefix.map(ToOwned::to_owned)) {
            return Ok(QName::new(namespace, local_name));
        }

        match prefix {
            // tns conventionally mirrors the enclosing targetNamespace even
            // when the declaration is missing.
            Some("tns") => match self.target.last() {
                Some(target) => Ok(QName::new(target, local_name)),
                None => Err(error::Error::UnboundPrefix("tns".to_owned())),
            },

            Some(prefix) => Err(error::Error::UnboundPrefix(prefix.to_owned())),

            // An unprefixed name with no default namespace is unqualified.
            None => Ok(QName::new("", local_name)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Sequence,
    Choice,
    All,
}

impl GroupKind {
    fn particle(self, items: Vec<SequenceItem>) -> Particle {
        match self {
            GroupKind::Sequence => Particle::Sequence(items),
            GroupKind::Choice => Particle::Choice(items),
            GroupKind::All => Particle::All(items),
        }
    }
}

#[derive(Debug)]
enum ParseState {
    Definitions,

    Types,
    Schema(Schema),
    GlobalElement(ElementDef),
    ComplexType {
        name: Option<String>,
        particle: Option<Particle>,
    },
    SimpleType {
        name: Option<String>,
        base: Option<QName>,
    },
    Restriction {
        base: QName,
    },
    Group {
        kind: GroupKind,
        items: Vec<SequenceItem>,
    },
    LocalElement(LocalElement),
    AnyWildcard(AnyElement),

    Message(Message),
    Part(Part),

    PortType(PortType),
    Operation(Operation),
    Documentation(Option<String>),
    Input(OperationMessage),
    Output(OperationMessage),
    PortTypeFault(OperationFault),

    Binding(Binding),
    SoapBindingExt(SoapBinding),
    BindingOperation(OperationBinding),
    SoapOperationExt(SoapOperationBinding),
    BindingInput(MessageBinding),
    BindingOutput(MessageBinding),
    SoapBody(SoapBodyBinding),
    SoapHeader(SoapHeaderBinding),
    BindingFault(FaultBinding),
    SoapFaultExt(SoapFaultBinding),

    Service(Service),
    Port(Port),
    Address {
        location: String,
    },

    Import {
        namespace: Option<String>,
    },

    Other(String),
}

struct Parser {
    root: Option<Url>,

    documents: Vec<Definition>,
    schemas: SchemaSet,
    current_namespaces: CurrentNamespaces,
}

impl Parser {
    fn new(root: Option<Url>) -> Self {
        Self {
            root,

            documents: Vec::new(),
            schemas: SchemaSet::default(),
            current_namespaces: Default::default(),
        }
    }

    fn document_mut(&mut self) -> Result<&mut Definition, error::Error> {
        self.documents
            .last_mut()
            .ok_or(error::Error::UnbalancedDocument)
    }

    fn resolve_namespace(&self, prefixed_name: &str) -> Result<QName, error::Error> {
        self.current_namespaces.resolve(prefixed_name)
    }

    fn resolve_optional(
        &self,
        prefixed_name: Option<String>,
    ) -> Result<Option<QName>, error::Error> {
        prefixed_name
            .map(|name| self.resolve_namespace(&name))
            .transpose()
    }

    fn parse(mut self) -> Result<DocumentSet, error::Error> {
        if let Some(root) = self.root.clone() {
            self.parse_url(root)?;
        }
        Ok(DocumentSet {
            documents: self.documents,
            schemas: self.schemas,
        })
    }

    fn parse_url(&mut self, url: Url) -> Result<(), error::Error> {
        debug!(%url, "fetching document");

        match url.scheme() {
            "file" => self.parse_xml(Reader::from_file(
                url.to_file_path()
                    .map_err(|()| error::Error::PathConversionError(None))?,
            )
            .map_err(error::Error::FileOpenError)?),

            "http" | "https" => self.parse_xml(Reader::from_reader(BufReader::new(
                reqwest::blocking::get(url)?,
            ))),

            other => Err(error::Error::UnsupportedScheme(other.into())),
        }
    }

    /// Fetch a referenced document relative to the root URL. Programmatic
    /// input with no base URL cannot follow external references.
    fn follow_location(&mut self, location: &str) -> Result<(), error::Error> {
        match self.root.clone() {
            Some(root) => self.parse_url(root.join(location)?),
            None => Err(error::Error::NoBaseUrl),
        }
    }

    fn parse_xml<B: BufRead>(&mut self, mut reader: Reader<B>) -> Result<(), error::Error> {
        let mut stack = Vec::new();
        let mut buffer = Vec::new();
        let mut namespace_buffer = Vec::new();

        loop {
            let (_, event) = reader.read_namespaced_event(&mut buffer, &mut namespace_buffer)?;

            match event {
                Event::Decl(..) | Event::Comment(..) => (),

                Event::Start(start) => self.handle_start(&mut stack, &reader, start)?,
                Event::End(..) => self.handle_end(&mut stack),

                Event::Empty(start) => {
                    self.handle_start(&mut stack, &reader, start)?;
                    self.handle_end(&mut stack);
                }

                Event::Text(text) => self.handle_text(&mut stack, &reader, text)?,

                Event::Eof => break,

                event => trace!(?event, "skipping event"),
            }
        }

        Ok(())
    }

    fn handle_start<B: BufRead>(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<B>,
        start: BytesStart<'_>,
    ) -> Result<(), error::Error> {
        let name = reader.decode(start.name())?.to_owned();
        let (_, local_name) = split_namespaced_name(&name);

        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = reader.decode(attribute.key)?;
            let (prefix, value) = split_namespaced_name(key);

            if prefix == Some("xmlns") {
                self.current_namespaces.add_namespace_prefix(
                    Some(value.to_owned()),
                    reader.decode(attribute.value.as_ref())?,
                );
            } else if prefix.is_none() && value == "xmlns" {
                self.current_namespaces
                    .add_namespace_prefix(None, reader.decode(attribute.value.as_ref())?);
            }
        }

        let mut state = stack.pop();
        let mut new_state = Some(ParseState::Other(local_name.to_owned()));

        match state {
            None => match local_name {
                "definitions" => {
                    let [namespace] =
                        get_attributes(reader, start.attributes(), ["targetNamespace"])?;
                    let namespace =
                        namespace.ok_or(error::Error::MissingTargetNamespace)?;

                    self.current_namespaces
                        .push_target_namespace(namespace.clone());
                    self.documents.push(Definition::new(&namespace));

                    new_state = Some(ParseState::Definitions);
                }

                "schema" => new_state = Some(self.start_schema(reader, &start)?),

                other => warn!(element = other, "unexpected document root"),
            },

            Some(ParseState::Definitions) => match local_name {
                "import" => {
                    let [location, namespace] =
                        get_attributes(reader, start.attributes(), ["location", "namespace"])?;

                    if let Some(location) = location {
                        self.follow_location(&location)?;
                    }

                    new_state = Some(ParseState::Import { namespace });
                }

                "types" => new_state = Some(ParseState::Types),

                "message" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    let name = require(name, "message", "name")?;

                    new_state = Some(ParseState::Message(Message::new(&name)));
                }

                "portType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    let name = require(name, "portType", "name")?;

                    new_state = Some(ParseState::PortType(PortType::new(&name)));
                }

                "binding" => {
                    let [name, ty] = get_attributes(reader, start.attributes(), ["name", "type"])?;
                    let name = require(name, "binding", "name")?;
                    let ty = require(ty, "binding", "type")?;
                    let port_type = self.resolve_namespace(&ty)?;

                    new_state = Some(ParseState::Binding(Binding::new(&name, port_type)));
                }

                "service" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    let name = require(name, "service", "name")?;

                    new_state = Some(ParseState::Service(Service {
                        name,
                        ports: Vec::new(),
                    }));
                }

                other => trace!(element = other, "skipping definitions child"),
            },

            Some(ParseState::Types) => match local_name {
                "schema" => new_state = Some(self.start_schema(reader, &start)?),

                other => trace!(element = other, "skipping types child"),
            },

            Some(ParseState::Schema(ref mut schema)) => match local_name {
                "element" => {
                    let [name, ty, nillable] =
                        get_attributes(reader, start.attributes(), ["name", "type", "nillable"])?;
                    let name = require(name, "element", "name")?;

                    let mut element = ElementDef::new(&name);
                    element.type_name = self.resolve_optional(ty)?;
                    element.nillable = parse_flag(&nillable);

                    new_state = Some(ParseState::GlobalElement(element));
                }

                "complexType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    let name = require(name, "complexType", "name")?;

                    new_state = Some(ParseState::ComplexType {
                        name: Some(name),
                        particle: None,
                    });
                }

                "simpleType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    let name = require(name, "simpleType", "name")?;

                    new_state = Some(ParseState::SimpleType {
                        name: Some(name),
                        base: None,
                    });
                }

                "import" => {
                    let [location, namespace] = get_attributes(
                        reader,
                        start.attributes(),
                        ["schemaLocation", "namespace"],
                    )?;

                    if let Some(ref namespace) = namespace {
                        schema.add_import(namespace);
                    }

                    if let Some(location) = location {
                        self.follow_location(&location)?;
                    }

                    new_state = Some(ParseState::Import { namespace });
                }

                "include" => {
                    let [location] =
                        get_attributes(reader, start.attributes(), ["schemaLocation"])?;

                    if let Some(location) = location {
                        self.follow_location(&location)?;
                    }

                    new_state = Some(ParseState::Import { namespace: None });
                }

                other => trace!(element = other, "skipping schema child"),
            },

            Some(ParseState::GlobalElement(..)) => match local_name {
                "complexType" => {
                    new_state = Some(ParseState::ComplexType {
                        name: None,
                        particle: None,
                    })
                }

                "simpleType" => {
                    new_state = Some(ParseState::SimpleType {
                        name: None,
                        base: None,
                    })
                }

                other => trace!(element = other, "skipping element child"),
            },

            Some(ParseState::ComplexType { .. }) => match local_name {
                "sequence" => {
                    new_state = Some(ParseState::Group {
                        kind: GroupKind::Sequence,
                        items: Vec::new(),
                    })
                }

                "choice" => {
                    new_state = Some(ParseState::Group {
                        kind: GroupKind::Choice,
                        items: Vec::new(),
                    })
                }

                "all" => {
                    new_state = Some(ParseState::Group {
                        kind: GroupKind::All,
                        items: Vec::new(),
                    })
                }

                other => trace!(element = other, "skipping complexType child"),
            },

            Some(ParseState::Group { .. }) => match local_name {
                "element" => {
                    let [name, ref_name, ty, nillable, min, max, form] = get_attributes(
                        reader,
                        start.attributes(),
                        [
                            "name",
                            "ref",
                            "type",
                            "nillable",
                            "minOccurs",
                            "maxOccurs",
                            "form",
                        ],
                    )?;

                    let element = LocalElement {
                        name,
                        ref_name: self.resolve_optional(ref_name)?,
                        type_name: self.resolve_optional(ty)?,
                        inline_type: None,
                        nillable: parse_flag(&nillable),
                        min_occurs: parse_min_occurs(min)?,
                        max_occurs: parse_max_occurs(max)?,
                        form_qualified: parse_qualified(form),
                    };

                    new_state = Some(ParseState::LocalElement(element));
                }

                "any" => {
                    let [namespace, min, max] = get_attributes(
                        reader,
                        start.attributes(),
                        ["namespace", "minOccurs", "maxOccurs"],
                    )?;

                    new_state = Some(ParseState::AnyWildcard(AnyElement {
                        namespace,
                        min_occurs: parse_min_occurs(min)?,
                        max_occurs: parse_max_occurs(max)?,
                    }));
                }

                "sequence" | "choice" | "all" => {
                    let kind = match local_name {
                        "sequence" => GroupKind::Sequence,
                        "choice" => GroupKind::Choice,
                        _ => GroupKind::All,
                    };
                    new_state = Some(ParseState::Group {
                        kind,
                        items: Vec::new(),
                    });
                }

                other => trace!(element = other, "skipping particle child"),
            },

            Some(ParseState::LocalElement(..)) => match local_name {
                "complexType" => {
                    new_state = Some(ParseState::ComplexType {
                        name: None,
                        particle: None,
                    })
                }

                "simpleType" => {
                    new_state = Some(ParseState::SimpleType {
                        name: None,
                        base: None,
                    })
                }

                other => trace!(element = other, "skipping local element child"),
            },

            Some(ParseState::SimpleType { .. }) => match local_name {
                "restriction" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;
                    let base = require(base, "restriction", "base")?;
                    let base = self.resolve_namespace(&base)?;

                    new_state = Some(ParseState::Restriction { base });
                }

                other => trace!(element = other, "skipping simpleType child"),
            },

            Some(ParseState::Message(..)) => match local_name {
                "part" => {
                    let [name, element, ty] =
                        get_attributes(reader, start.attributes(), ["name", "element", "type"])?;
                    let name = require(name, "part", "name")?;

                    new_state = Some(ParseState::Part(Part {
                        name,
                        element: self.resolve_optional(element)?,
                        type_name: self.resolve_optional(ty)?,
                    }));
                }

                other => trace!(element = other, "skipping message child"),
            },

            Some(ParseState::PortType(..)) => match local_name {
                "operation" => {
                    let [name, order] =
                        get_attributes(reader, start.attributes(), ["name", "parameterOrder"])?;
                    let name = require(name, "operation", "name")?;

                    let mut operation = Operation::new(&name);
                    operation.parameter_order = order
                        .map(|order| order.split_whitespace().map(ToOwned::to_owned).collect());

                    new_state = Some(ParseState::Operation(operation));
                }

                other => trace!(element = other, "skipping portType child"),
            },

            Some(ParseState::Operation(..)) => match local_name {
                "documentation" => new_state = Some(ParseState::Documentation(None)),

                "input" | "output" => {
                    let [name, message] =
                        get_attributes(reader, start.attributes(), ["name", "message"])?;

                    let message = OperationMessage {
                        name,
                        message: self.resolve_optional(message)?,
                        action: None,
                    };

                    if local_name == "input" {
                        new_state = Some(ParseState::Input(message));
                    } else {
                        new_state = Some(ParseState::Output(message));
                    }
                }

                "fault" => {
                    let [name, message] =
                        get_attributes(reader, start.attributes(), ["name", "message"])?;
                    let name = require(name, "fault", "name")?;

                    new_state = Some(ParseState::PortTypeFault(OperationFault {
                        name,
                        message: self.resolve_optional(message)?,
                        action: None,
                    }));
                }

                other => trace!(element = other, "skipping operation child"),
            },

            Some(ParseState::Binding(..)) => match local_name {
                // soap:binding inside wsdl:binding.
                "binding" => {
                    let [style, transport] =
                        get_attributes(reader, start.attributes(), ["style", "transport"])?;

                    new_state = Some(ParseState::SoapBindingExt(SoapBinding {
                        style: parse_style(style)?,
                        transport,
                    }));
                }

                "operation" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    let name = require(name, "operation", "name")?;

                    new_state = Some(ParseState::BindingOperation(OperationBinding::new(&name)));
                }

                other => trace!(element = other, "skipping binding child"),
            },

            Some(ParseState::BindingOperation(..)) => match local_name {
                // soap:operation.
                "operation" => {
                    let [action, style] =
                        get_attributes(reader, start.attributes(), ["soapAction", "style"])?;

                    new_state = Some(ParseState::SoapOperationExt(SoapOperationBinding {
                        soap_action: action,
                        style: parse_style(style)?,
                    }));
                }

                "input" => new_state = Some(ParseState::BindingInput(MessageBinding::default())),
                "output" => new_state = Some(ParseState::BindingOutput(MessageBinding::default())),

                "fault" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::BindingFault(FaultBinding {
                        name,
                        soap_fault: None,
                    }));
                }

                other => trace!(element = other, "skipping binding operation child"),
            },

            Some(ParseState::BindingInput(..) | ParseState::BindingOutput(..)) => {
                match local_name {
                    "body" => {
                        let [body_use, namespace, encoding, parts] = get_attributes(
                            reader,
                            start.attributes(),
                            ["use", "namespace", "encodingStyle", "parts"],
                        )?;

                        new_state = Some(ParseState::SoapBody(SoapBodyBinding {
                            use_: parse_use(body_use)?,
                            namespace,
                            encoding,
                            parts: parts.map(|parts| {
                                parts.split_whitespace().map(ToOwned::to_owned).collect()
                            }),
                        }));
                    }

                    "header" => {
                        let [message, part, header_use] = get_attributes(
                            reader,
                            start.attributes(),
                            ["message", "part", "use"],
                        )?;

                        new_state = Some(ParseState::SoapHeader(SoapHeaderBinding {
                            message: self.resolve_optional(message)?,
                            part,
                            use_: parse_use(header_use)?,
                        }));
                    }

                    other => trace!(element = other, "skipping message binding child"),
                }
            }

            Some(ParseState::BindingFault(..)) => match local_name {
                // soap:fault.
                "fault" => {
                    let [name, fault_use] =
                        get_attributes(reader, start.attributes(), ["name", "use"])?;

                    new_state = Some(ParseState::SoapFaultExt(SoapFaultBinding {
                        name,
                        use_: parse_use(fault_use)?,
                    }));
                }

                other => trace!(element = other, "skipping binding fault child"),
            },

            Some(ParseState::Service(..)) => match local_name {
                "port" => {
                    let [name, binding] =
                        get_attributes(reader, start.attributes(), ["name", "binding"])?;
                    let name = require(name, "port", "name")?;
                    let binding = require(binding, "port", "binding")?;
                    let binding = self.resolve_namespace(&binding)?;

                    new_state = Some(ParseState::Port(Port {
                        name,
                        binding,
                        location: None,
                    }));
                }

                other => trace!(element = other, "skipping service child"),
            },

            Some(ParseState::Port(..)) => match local_name {
                "address" => {
                    let [location] = get_attributes(reader, start.attributes(), ["location"])?;
                    let location = require(location, "address", "location")?;

                    new_state = Some(ParseState::Address { location });
                }

                other => trace!(element = other, "skipping port child"),
            },

            Some(
                ParseState::Documentation(..)
                | ParseState::Restriction { .. }
                | ParseState::AnyWildcard(..)
                | ParseState::Part(..)
                | ParseState::Input(..)
                | ParseState::Output(..)
                | ParseState::PortTypeFault(..)
                | ParseState::SoapBindingExt(..)
                | ParseState::SoapOperationExt(..)
                | ParseState::SoapBody(..)
                | ParseState::SoapHeader(..)
                | ParseState::SoapFaultExt(..)
                | ParseState::Address { .. }
                | ParseState::Import { .. },
            ) => trace!(element = local_name, "skipping leaf child"),

            Some(ParseState::Other(ref parent)) => {
                trace!(element = local_name, parent = %parent, "skipping unknown content");
            }
        }

        stack.extend(state);
        stack.extend(new_state);

        Ok(())
    }

    fn handle_end(&mut self, stack: &mut Vec<ParseState>) {
        let finished_state = stack.pop();
        let mut next_state = stack.pop();

        match finished_state {
            Some(ParseState::Definitions) => self.current_namespaces.pop_target_namespace(),

            Some(ParseState::Schema(schema)) => {
                self.current_namespaces.pop_target_namespace();
                self.schemas.push(schema);
            }

            Some(ParseState::GlobalElement(element)) => match next_state {
                Some(ParseState::Schema(ref mut schema)) => schema.elements.push(element),
                _ => warn!(element = %element.name, "dropping misplaced element declaration"),
            },

            Some(ParseState::ComplexType { name, particle }) => {
                let ty = SchemaType::Complex(ComplexType { particle });

                match next_state {
                    Some(ParseState::Schema(ref mut schema)) => match name {
                        Some(name) => schema.types.push(TypeDef { name, ty }),
                        None => warn!("dropping anonymous top-level complexType"),
                    },

                    Some(ParseState::GlobalElement(ref mut element)) => {
                        element.inline_type = Some(ty);
                    }

                    Some(ParseState::LocalElement(ref mut element)) => {
                        element.inline_type = Some(ty);
                    }

                    _ => warn!("dropping misplaced complexType"),
                }
            }

            Some(ParseState::SimpleType { name, base }) => {
                let ty = SchemaType::Simple(SimpleType { base });

                match next_state {
                    Some(ParseState::Schema(ref mut schema)) => match name {
                        Some(name) => schema.types.push(TypeDef { name, ty }),
                        None => warn!("dropping anonymous top-level simpleType"),
                    },

                    Some(ParseState::GlobalElement(ref mut element)) => {
                        element.inline_type = Some(ty);
                    }

                    Some(ParseState::LocalElement(ref mut element)) => {
                        element.inline_type = Some(ty);
                    }

                    _ => warn!("dropping misplaced simpleType"),
                }
            }

            Some(ParseState::Restriction { base }) => match next_state {
                Some(ParseState::SimpleType {
                    base: ref mut ty_base,
                    ..
                }) => *ty_base = Some(base),
                _ => warn!("dropping misplaced restriction"),
            },

            Some(ParseState::Group { kind, items }) => match next_state {
                Some(ParseState::ComplexType {
                    ref mut particle, ..
                }) if particle.is_none() => *particle = Some(kind.particle(items)),

                // Nested groups flatten into the enclosing particle.
                Some(ParseState::Group {
                    items: ref mut outer,
                    ..
                }) => outer.extend(items),

                _ => warn!("dropping misplaced model group"),
            },

            Some(ParseState::LocalElement(element)) => match next_state {
                Some(ParseState::Group { ref mut items, .. }) => {
                    items.push(SequenceItem::Element(element))
                }
                _ => warn!("dropping misplaced local element"),
            },

            Some(ParseState::AnyWildcard(any)) => match next_state {
                Some(ParseState::Group { ref mut items, .. }) => {
                    items.push(SequenceItem::Any(any))
                }
                _ => warn!("dropping misplaced wildcard"),
            },

            Some(ParseState::Message(message)) => match self.document_mut() {
                Ok(document) => document.messages.push(message),
                Err(_) => warn!(message = %message.name, "dropping message outside definitions"),
            },

            Some(ParseState::Part(part)) => match next_state {
                Some(ParseState::Message(ref mut message)) => message.parts.push(part),
                _ => warn!(part = %part.name, "dropping misplaced part"),
            },

            Some(ParseState::PortType(port_type)) => match self.document_mut() {
                Ok(document) => document.port_types.push(port_type),
                Err(_) => warn!(port_type = %port_type.name, "dropping portType outside definitions"),
            },

            Some(ParseState::Operation(operation)) => match next_state {
                Some(ParseState::PortType(ref mut port_type)) => {
                    port_type.operations.push(operation)
                }
                _ => warn!(operation = %operation.name, "dropping misplaced operation"),
            },

            Some(ParseState::Documentation(text)) => match next_state {
                Some(ParseState::Operation(ref mut operation)) => operation.documentation = text,
                _ => (),
            },

            Some(ParseState::Input(message)) => match next_state {
                Some(ParseState::Operation(ref mut operation)) if operation.input.is_none() => {
                    operation.input = Some(message)
                }
                _ => warn!("dropping misplaced input"),
            },

            Some(ParseState::Output(message)) => match next_state {
                Some(ParseState::Operation(ref mut operation)) if operation.output.is_none() => {
                    operation.output = Some(message)
                }
                _ => warn!("dropping misplaced output"),
            },

            Some(ParseState::PortTypeFault(fault)) => match next_state {
                Some(ParseState::Operation(ref mut operation)) => operation.faults.push(fault),
                _ => warn!(fault = %fault.name, "dropping misplaced fault"),
            },

            Some(ParseState::Binding(binding)) => match self.document_mut() {
                Ok(document) => document.bindings.push(binding),
                Err(_) => warn!(binding = %binding.name, "dropping binding outside definitions"),
            },

            Some(ParseState::SoapBindingExt(soap)) => match next_state {
                Some(ParseState::Binding(ref mut binding)) => binding.soap = Some(soap),
                _ => warn!("dropping misplaced soap:binding"),
            },

            Some(ParseState::BindingOperation(operation)) => match next_state {
                Some(ParseState::Binding(ref mut binding)) => binding.operations.push(operation),
                _ => warn!(operation = %operation.name, "dropping misplaced binding operation"),
            },

            Some(ParseState::SoapOperationExt(soap)) => match next_state {
                Some(ParseState::BindingOperation(ref mut operation)) => {
                    operation.soap_operation = Some(soap)
                }
                _ => warn!("dropping misplaced soap:operation"),
            },

            Some(ParseState::BindingInput(input)) => match next_state {
                Some(ParseState::BindingOperation(ref mut operation)) => {
                    operation.input = Some(input)
                }
                _ => warn!("dropping misplaced binding input"),
            },

            Some(ParseState::BindingOutput(output)) => match next_state {
                Some(ParseState::BindingOperation(ref mut operation)) => {
                    operation.output = Some(output)
                }
                _ => warn!("dropping misplaced binding output"),
            },

            Some(ParseState::SoapBody(body)) => match next_state {
                Some(
                    ParseState::BindingInput(ref mut binding)
                    | ParseState::BindingOutput(ref mut binding),
                ) => binding.body = Some(body),
                _ => warn!("dropping misplaced soap:body"),
            },

            Some(ParseState::SoapHeader(header)) => match next_state {
                Some(
                    ParseState::BindingInput(ref mut binding)
                    | ParseState::BindingOutput(ref mut binding),
                ) => binding.headers.push(header),
                _ => warn!("dropping misplaced soap:header"),
            },

            Some(ParseState::BindingFault(fault)) => match next_state {
                Some(ParseState::BindingOperation(ref mut operation)) => {
                    operation.faults.push(fault)
                }
                _ => warn!("dropping misplaced binding fault"),
            },

            Some(ParseState::SoapFaultExt(soap)) => match next_state {
                Some(ParseState::BindingFault(ref mut fault)) => fault.soap_fault = Some(soap),
                _ => warn!("dropping misplaced soap:fault"),
            },

            Some(ParseState::Service(service)) => match self.document_mut() {
                Ok(document) => document.services.push(service),
                Err(_) => warn!(service = %service.name, "dropping service outside definitions"),
            },

            Some(ParseState::Port(port)) => match next_state {
                Some(ParseState::Service(ref mut service)) => service.ports.push(port),
                _ => warn!(port = %port.name, "dropping misplaced port"),
            },

            Some(ParseState::Address { location }) => match next_state {
                Some(ParseState::Port(ref mut port)) => port.location = Some(location),
                _ => warn!("dropping misplaced address"),
            },

            Some(
                ParseState::Types | ParseState::Import { .. } | ParseState::Other(..),
            )
            | None => (),
        }

        stack.extend(next_state);
    }

    fn handle_text<B: BufRead>(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<B>,
        text: BytesText<'_>,
    ) -> Result<(), error::Error> {
        let unescaped = text.unescaped()?;
        let text = reader.decode(unescaped.as_ref())?;
        let mut state = stack.pop();

        if let Some(ParseState::Documentation(ref mut docs)) = state {
            *docs = Some(text.trim().to_owned());
        }

        stack.extend(state);
        Ok(())
    }

    fn start_schema<B: BufRead>(
        &mut self,
        reader: &Reader<B>,
        start: &BytesStart<'_>,
    ) -> Result<ParseState, error::Error> {
        let [namespace, form] = get_attributes(
            reader,
            start.attributes(),
            ["targetNamespace", "elementFormDefault"],
        )?;
        let namespace = namespace.ok_or(error::Error::MissingTargetNamespace)?;

        self.current_namespaces
            .push_target_namespace(namespace.clone());

        let mut schema = Schema::new(&namespace);
        schema.element_form_qualified = parse_qualified(form).unwrap_or(false);

        Ok(ParseState::Schema(schema))
    }
}

pub fn parse(url: Url) -> Result<DocumentSet, error::Error> {
    Parser::new(Some(url)).parse()
}

pub fn parse_reader<B: BufRead>(reader: Reader<B>) -> Result<DocumentSet, error::Error> {
    let mut parser = Parser::new(None);
    parser.parse_xml(reader)?;
    Ok(DocumentSet {
        documents: parser.documents,
        schemas: parser.schemas,
    })
}
