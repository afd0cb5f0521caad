//! Contract-to-WSDL export driver. Walks a `ContractDescription` and emits
//! the portType, messages, schema content and (optionally) a SOAP binding
//! into a fresh WSDL document.

use tracing::debug;
use wisp_contract::{
    ContractDescription, Direction, MessageDescription, MessagePartDescription,
    OperationDescription, Style, TypeRef,
};
use wisp_wsdl::schema::{
    any_message_type, base64_binary, stream_body_type, AnyElement, ComplexType, ElementDef,
    LocalElement, MaxOccurs, Particle, SchemaSet, SchemaType, SequenceItem, SimpleType, TypeDef,
    MESSAGE_NS, SOAP_ENCODING_NS,
};
use wisp_wsdl::types::{
    Binding, Definition, FaultBinding, Message, MessageBinding, Operation, OperationBinding,
    OperationMessage, Part, PortType, QName, SoapBinding, SoapBodyBinding, SoapFaultBinding,
    SoapHeaderBinding, SoapOperationBinding, SoapStyle, SoapUse,
};

use crate::diag::Diagnostics;
use crate::error::Error;
use crate::faults;
use crate::parts;
use crate::session::{ExportOptions, ExportSession};
use crate::shape::PARAMETERS_PART;

#[derive(Debug)]
pub struct ExportResult {
    pub document: Definition,
    pub diagnostics: Diagnostics,
}

/// Exports one contract into one WSDL document. Operation-scoped failures
/// are recorded as fatal diagnostics and skip only that operation; naming
/// collisions and session-level errors abort the whole unit.
pub fn export_contract(
    contract: &mut ContractDescription,
    options: &ExportOptions,
) -> Result<ExportResult, Error> {
    let mut session = ExportSession::new(&*contract, options);
    let mut port_type = PortType::new(&contract.name);
    let mut binding = Binding::new(
        &format!("{}Soap", contract.name),
        QName::new(&contract.namespace, &contract.name),
    );
    binding.soap = Some(SoapBinding {
        style: Some(style_attr(
            contract
                .operations
                .first()
                .map(|operation| operation.style)
                .unwrap_or(Style::Document),
        )),
        transport: Some(options.transport.clone()),
    });

    let contract_name = contract.name.clone();
    let contract_namespace = contract.namespace.clone();

    for operation in &mut contract.operations {
        let name = operation.name.clone();
        match export_operation(&mut session, &contract_name, &contract_namespace, operation) {
            Ok((wsdl_operation, operation_binding)) => {
                port_type.operations.push(wsdl_operation);
                binding.operations.push(operation_binding);
            }
            Err(
                error @ (Error::NamingCollision { .. }
                | Error::DuplicateExport { .. }
                | Error::NameSuffixesExhausted { .. }),
            ) => return Err(error),
            Err(error) => {
                session
                    .diagnostics
                    .fatal(format!("Operation {} was not exported: {}", name, error));
            }
        }
    }

    session.document.port_types.push(port_type);
    if options.emit_binding {
        session.document.bindings.push(binding);
    }

    let (document, diagnostics) = session.finish();
    Ok(ExportResult {
        document,
        diagnostics,
    })
}

fn style_attr(style: Style) -> SoapStyle {
    match style {
        Style::Document => SoapStyle::Document,
        Style::Rpc => SoapStyle::Rpc,
    }
}

fn export_operation(
    session: &mut ExportSession<'_>,
    contract_name: &str,
    contract_namespace: &str,
    operation: &mut OperationDescription,
) -> Result<(Operation, OperationBinding), Error> {
    debug!(operation = %operation.name, style = ?operation.style, "exporting operation");

    let mut wsdl_operation = Operation::new(&operation.name);
    let mut operation_binding = OperationBinding::new(&operation.name);
    operation_binding.soap_operation = Some(SoapOperationBinding {
        soap_action: operation
            .messages
            .first()
            .and_then(|message| message.action.clone()),
        style: Some(style_attr(operation.style)),
    });

    let style = operation.style;
    let encoded = operation.is_encoded;
    let operation_name = operation.name.clone();
    let callback = operation.is_server_initiated;

    for message in &mut operation.messages {
        let direction = message.direction;
        session.claim_export(&operation_name, direction)?;

        let (message_name, headers) = export_message(
            session,
            contract_name,
            contract_namespace,
            &operation_name,
            callback,
            style,
            encoded,
            message,
        )?;

        let reference = OperationMessage {
            name: None,
            message: Some(QName::new(
                &session.document.target_namespace,
                &message_name,
            )),
            action: message.action.clone(),
        };
        let message_binding = MessageBinding {
            body: Some(body_binding(style, encoded, message)),
            headers,
        };
        match direction {
            Direction::Input => {
                wsdl_operation.input = Some(reference);
                operation_binding.input = Some(message_binding);
            }
            Direction::Output => {
                wsdl_operation.output = Some(reference);
                operation_binding.output = Some(message_binding);
            }
        }
    }

    if style == Style::Rpc {
        wsdl_operation.parameter_order = Some(parameter_order(operation));
    }

    for fault in &operation.faults {
        let wsdl_fault = faults::export_fault(
            &mut session.schemas,
            &mut session.naming,
            &mut session.document,
            contract_name,
            &operation_name,
            contract_namespace,
            fault,
        )?;
        operation_binding.faults.push(FaultBinding {
            name: Some(wsdl_fault.name.clone()),
            soap_fault: Some(SoapFaultBinding {
                name: Some(wsdl_fault.name.clone()),
                use_: use_attr(encoded),
            }),
        });
        wsdl_operation.faults.push(wsdl_fault);
    }

    Ok((wsdl_operation, operation_binding))
}

fn use_attr(encoded: bool) -> SoapUse {
    if encoded {
        SoapUse::Encoded
    } else {
        SoapUse::Literal
    }
}

fn body_binding(style: Style, encoded: bool, message: &MessageDescription) -> SoapBodyBinding {
    SoapBodyBinding {
        use_: use_attr(encoded),
        // rpc bodies carry the wrapper namespace on the binding.
        namespace: if style == Style::Rpc {
            message.body.wrapper_namespace.clone()
        } else {
            None
        },
        encoding: encoded.then(|| SOAP_ENCODING_NS.to_owned()),
        parts: None,
    }
}

/// Part names in serialization order, excluding the return value.
fn parameter_order(operation: &OperationDescription) -> Vec<String> {
    let mut names = Vec::new();
    for message in &operation.messages {
        for part in &message.body.parts {
            let name = part.wire_name().to_owned();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Emits the WSDL message (and header message) for one abstract message,
/// returning the assigned message name and the soap:header bindings.
#[allow(clippy::too_many_arguments)]
fn export_message(
    session: &mut ExportSession<'_>,
    contract_name: &str,
    contract_namespace: &str,
    operation_name: &str,
    callback: bool,
    style: Style,
    encoded: bool,
    message: &mut MessageDescription,
) -> Result<(String, Vec<SoapHeaderBinding>), Error> {
    // A typed message already exported in this session is reused wholesale.
    if let Some(message_type) = &message.message_type {
        if let Some(existing) = session.typed_message(message_type) {
            let name = existing.clone();
            let headers = header_bindings_for(session, encoded, message);
            return Ok((name, headers));
        }
    }

    let message_name = match &message.message_name {
        Some(explicit) => session.naming.claim_message_name(explicit)?,
        None => session.naming.message_name(
            contract_name,
            operation_name,
            message.direction,
            callback,
        )?,
    };

    parts::assign_unique_part_names(&mut message.body, style == Style::Rpc)?;

    let mut wsdl_message = Message::new(&message_name);
    wsdl_message.parts = export_body_parts(session, contract_namespace, operation_name, style, message)?;
    session.document.messages.push(wsdl_message);

    let header_bindings = if message.headers.is_empty() {
        Vec::new()
    } else {
        export_headers(session, operation_name, encoded, message, &message_name)?
    };

    if let Some(message_type) = &message.message_type {
        session.record_typed_message(message_type.clone(), message_name.clone());
    }

    Ok((message_name, header_bindings))
}

/// Body parts in wire order: the return value precedes the parameter parts
/// on reply messages.
fn ordered_parts(message: &MessageDescription) -> Vec<&MessagePartDescription> {
    message
        .body
        .return_value
        .iter()
        .chain(message.body.parts.iter())
        .collect()
}

fn export_body_parts(
    session: &mut ExportSession<'_>,
    contract_namespace: &str,
    operation_name: &str,
    style: Style,
    message: &MessageDescription,
) -> Result<Vec<Part>, Error> {
    let ordered = ordered_parts(message);

    // Untyped placeholder: the whole body is one generic-message part.
    if message.is_untyped() {
        ensure_message_schema(&mut session.schemas);
        return Ok(vec![Part::typed(
            ordered[0].wire_name(),
            any_message_type(),
        )]);
    }

    // Stream body, bare or wrapped.
    if ordered.len() == 1 && ordered[0].ty.is_stream() {
        return export_stream_body(
            session,
            contract_namespace,
            operation_name,
            message,
            ordered[0],
        );
    }

    match (&message.body.wrapper_name, style) {
        (Some(wrapper_name), Style::Document) => {
            let wrapper_namespace = message
                .body
                .wrapper_namespace
                .as_deref()
                .unwrap_or(contract_namespace)
                .to_owned();
            let mut items = Vec::with_capacity(ordered.len());
            for &part in &ordered {
                items.push(SequenceItem::Element(parts::export_local_element(
                    &mut session.schemas,
                    &mut session.naming,
                    operation_name,
                    &wrapper_namespace,
                    part,
                )?));
            }

            let wrapper = QName::new(&wrapper_namespace, wrapper_name);
            export_wrapper_element(session, operation_name, &wrapper, items)?;
            Ok(vec![Part::element(PARAMETERS_PART, wrapper)])
        }

        // rpc parts are bare type references; the wrapper is implied by the
        // operation name on the wire.
        (_, Style::Rpc) => {
            let mut wsdl_parts = Vec::with_capacity(ordered.len());
            for &part in &ordered {
                wsdl_parts.push(parts::export_type_part(part)?);
            }
            Ok(wsdl_parts)
        }

        (None, Style::Document) => {
            let mut wsdl_parts = Vec::with_capacity(ordered.len());
            for &part in &ordered {
                wsdl_parts.push(parts::export_element_part(
                    &mut session.schemas,
                    &mut session.naming,
                    operation_name,
                    part,
                )?);
            }
            Ok(wsdl_parts)
        }
    }
}

fn export_stream_body(
    session: &mut ExportSession<'_>,
    contract_namespace: &str,
    operation_name: &str,
    message: &MessageDescription,
    part: &MessagePartDescription,
) -> Result<Vec<Part>, Error> {
    ensure_message_schema(&mut session.schemas);

    match &message.body.wrapper_name {
        Some(wrapper_name) => {
            let wrapper_namespace = message
                .body
                .wrapper_namespace
                .as_deref()
                .unwrap_or(contract_namespace)
                .to_owned();
            let items = vec![SequenceItem::Element(LocalElement::named(
                part.wire_name(),
                stream_body_type(),
            ))];
            let wrapper = QName::new(&wrapper_namespace, wrapper_name);
            export_wrapper_element(session, operation_name, &wrapper, items)?;
            parts::ensure_import(&mut session.schemas, &wrapper_namespace, MESSAGE_NS);
            Ok(vec![Part::element(PARAMETERS_PART, wrapper)])
        }
        None => Ok(vec![Part::typed(part.wire_name(), stream_body_type())]),
    }
}

/// Registers and emits a wrapper element with an anonymous complex type
/// holding the given sequence.
fn export_wrapper_element(
    session: &mut ExportSession<'_>,
    operation_name: &str,
    wrapper: &QName,
    items: Vec<SequenceItem>,
) -> Result<(), Error> {
    let mut element = ElementDef::new(&wrapper.name);
    element.inline_type = Some(SchemaType::Complex(ComplexType {
        particle: Some(Particle::Sequence(items)),
    }));

    if session
        .naming
        .register_element(wrapper.clone(), &element, operation_name)?
    {
        parts::target_schema(&mut session.schemas, &wrapper.namespace)
            .elements
            .push(element);
    }
    Ok(())
}

fn export_headers(
    session: &mut ExportSession<'_>,
    operation_name: &str,
    encoded: bool,
    message: &MessageDescription,
    body_message_name: &str,
) -> Result<Vec<SoapHeaderBinding>, Error> {
    let header_message_name = match &message.message_type {
        Some(message_type) => match session.typed_header_message(message_type) {
            Some(existing) => existing.clone(),
            None => {
                let name = session.naming.header_message_name(body_message_name)?;
                session.record_typed_header_message(message_type.clone(), name.clone());
                name
            }
        },
        None => session.naming.header_message_name(body_message_name)?,
    };

    let mut header_message = Message::new(&header_message_name);
    for header in &message.headers {
        // The unknown-header collection never appears on the wire.
        if header.unknown_headers {
            continue;
        }
        header_message.parts.push(parts::export_element_part(
            &mut session.schemas,
            &mut session.naming,
            operation_name,
            &header.part,
        )?);
    }

    if header_message.parts.is_empty() {
        return Ok(Vec::new());
    }

    // Headers travel with the same use as the body; a mismatch would make
    // the binding internally inconsistent.
    let bindings = header_message
        .parts
        .iter()
        .map(|part| SoapHeaderBinding {
            message: Some(QName::new(
                &session.document.target_namespace,
                &header_message_name,
            )),
            part: Some(part.name.clone()),
            use_: use_attr(encoded),
        })
        .collect();

    if session
        .document
        .message(&header_message_name)
        .is_none()
    {
        session.document.messages.push(header_message);
    }

    Ok(bindings)
}

fn header_bindings_for(
    session: &ExportSession<'_>,
    encoded: bool,
    message: &MessageDescription,
) -> Vec<SoapHeaderBinding> {
    let Some(message_type) = &message.message_type else {
        return Vec::new();
    };
    let Some(header_message_name) = session.typed_header_message(message_type) else {
        return Vec::new();
    };

    session
        .document
        .message(header_message_name)
        .map(|header_message| {
            header_message
                .parts
                .iter()
                .map(|part| SoapHeaderBinding {
                    message: Some(QName::new(
                        &session.document.target_namespace,
                        header_message_name,
                    )),
                    part: Some(part.name.clone()),
                    use_: use_attr(encoded),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Definitions for the well-known placeholder body types, emitted on first
/// use: a generic message body accepting any content, and the stream body
/// as a base64Binary restriction.
fn ensure_message_schema(schemas: &mut SchemaSet) {
    let schema = parts::target_schema(schemas, MESSAGE_NS);

    if schema.type_def("MessageBody").is_none() {
        schema.types.push(TypeDef {
            name: "MessageBody".to_owned(),
            ty: SchemaType::Complex(ComplexType {
                particle: Some(Particle::Sequence(vec![SequenceItem::Any(AnyElement {
                    namespace: Some("##any".to_owned()),
                    min_occurs: 0,
                    max_occurs: MaxOccurs::Unbounded,
                })])),
            }),
        });
    }

    if schema.type_def("StreamBody").is_none() {
        schema.types.push(TypeDef {
            name: "StreamBody".to_owned(),
            ty: SchemaType::Simple(SimpleType {
                base: Some(base64_binary()),
            }),
        });
    }
}
