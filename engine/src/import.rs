//! WSDL-to-contract import driver. Runs schema segregation once per
//! document set, then builds one contract per portType; a fatal error
//! aborts only its portType, and bindings that depend on a failed portType
//! short-circuit instead of re-attempting the work.

use tracing::debug;
use wisp_contract::{
    ContractDescription, Direction, MessageDescription, MessageHeaderDescription,
    MessagePartDescription, OperationDescription, Style, TypeRef,
};
use wisp_wsdl::schema::SchemaSet;
use wisp_wsdl::types::{
    Binding, Definition, DocumentSet, Message, Operation, OperationBinding, OperationMessage,
    PortType, QName,
};

use crate::diag::Diagnostics;
use crate::error::Error;
use crate::faults;
use crate::session::{ImportOptions, ImportSession, ReturnPolicy};
use crate::shape::{self, MessageShape};
use crate::strategy::{self, SerializationStrategy};
use crate::style::{self, OperationInfo};

pub struct ImportResult {
    pub contracts: Vec<ContractDescription>,
    pub diagnostics: Diagnostics,
}

/// Imports every portType of a document set into a contract.
pub fn import_contracts(docs: &DocumentSet, options: &ImportOptions) -> ImportResult {
    let mut session = ImportSession::new(docs, options);
    let mut contracts = Vec::new();

    for document in &docs.documents {
        for port_type in &document.port_types {
            let qname = QName::new(&document.target_namespace, &port_type.name);
            debug!(port_type = %qname, "importing portType");

            match import_port_type(&mut session, document, port_type) {
                Ok(contract) => contracts.push(contract),
                Err(error) => {
                    session
                        .diagnostics
                        .fatal(format!("PortType {} was not imported: {}", qname, error));
                    session.failed_port_types.insert(qname);
                }
            }
        }
    }

    for document in &docs.documents {
        for binding in &document.bindings {
            if session.failed_port_types.contains(&binding.port_type) {
                let error = Error::DependencyFailed {
                    unit: binding.name.clone(),
                    dependency: binding.port_type.to_string(),
                };
                session.diagnostics.fatal(error.to_string());
            } else if docs.find_port_type(&binding.port_type).is_none() {
                session.diagnostics.warn(format!(
                    "Binding {} references unknown portType {} and was skipped",
                    binding.name, binding.port_type
                ));
            }
        }
    }

    ImportResult {
        contracts,
        diagnostics: session.diagnostics,
    }
}

fn import_port_type(
    session: &mut ImportSession<'_>,
    document: &Definition,
    port_type: &PortType,
) -> Result<ContractDescription, Error> {
    let mut contract = ContractDescription::new(&port_type.name, &document.target_namespace);
    let port_type_name = QName::new(&document.target_namespace, &port_type.name);
    let namespace = contract.namespace.clone();

    let strategy = select_strategy(session, &port_type_name, port_type);
    debug!(
        port_type = %port_type_name,
        strategy = strategy.name(),
        "selected serialization strategy"
    );

    for operation in &port_type.operations {
        if let Some(imported) =
            import_operation(session, strategy, &port_type_name, operation, &namespace)?
        {
            contract.operations.push(imported);
        }
    }

    Ok(contract)
}

/// The first strategy whose capabilities cover every operation of the
/// portType. When none does, the rpc strategy is still used so the
/// concrete failures surface per operation.
fn select_strategy(
    session: &ImportSession<'_>,
    port_type_name: &QName,
    port_type: &PortType,
) -> &'static dyn SerializationStrategy {
    for candidate in strategy::strategies() {
        if port_type
            .operations
            .iter()
            .all(|operation| can_import_operation(session, candidate, port_type_name, operation))
        {
            return candidate;
        }
    }
    &strategy::RPC_STRATEGY
}

fn parts_importable(
    strategy: &dyn SerializationStrategy,
    schemas: &SchemaSet,
    message: &Message,
) -> bool {
    message.parts.iter().all(|part| {
        if let Some(element) = &part.element {
            strategy.can_import_element(schemas, element)
        } else if let Some(type_name) = &part.type_name {
            strategy.can_import_type(schemas, type_name)
        } else {
            // Skipped with a warning during the real import.
            true
        }
    })
}

fn can_import_operation(
    session: &ImportSession<'_>,
    strategy: &dyn SerializationStrategy,
    port_type_name: &QName,
    operation: &Operation,
) -> bool {
    let docs = session.docs;
    let bindings = docs.operation_bindings_for(port_type_name, &operation.name);
    let mut scratch = Diagnostics::default();
    let info = style::resolve_operation(docs, operation, &bindings, &mut scratch);

    if strategy
        .validate_style_use(&operation.name, info.style_use)
        .is_err()
    {
        return false;
    }

    let schemas = session.segregated.for_use(info.is_encoded());
    let wrapped = info.all_wrapped && session.options.wrapped;

    for operation_message in [&operation.input, &operation.output].into_iter().flatten() {
        let Some(name) = &operation_message.message else {
            continue;
        };
        let Some(message) = docs.find_message(name) else {
            return false;
        };

        match shape::classify(schemas, message, wrapped) {
            MessageShape::AnyMessage { .. } | MessageShape::Stream { .. } => (),
            MessageShape::WrappedParameters { element } => {
                if !strategy.can_import_wrapper_element(schemas, &element)
                    && !parts_importable(strategy, schemas, message)
                {
                    return false;
                }
            }
            MessageShape::General => {
                if !parts_importable(strategy, schemas, message) {
                    return false;
                }
            }
        }
    }
    true
}

fn import_operation(
    session: &mut ImportSession<'_>,
    strategy: &dyn SerializationStrategy,
    port_type_name: &QName,
    operation: &Operation,
    contract_namespace: &str,
) -> Result<Option<OperationDescription>, Error> {
    let docs = session.docs;
    let bindings = docs.operation_bindings_for(port_type_name, &operation.name);
    let info = style::resolve_operation(docs, operation, &bindings, &mut session.diagnostics);
    strategy.validate_style_use(&operation.name, info.style_use)?;

    let mut imported = OperationDescription::new(&operation.name);
    imported.style = info.style();
    imported.is_encoded = info.is_encoded();

    let request = match &operation.input {
        Some(input) => match import_message(
            session,
            strategy,
            operation,
            input,
            Direction::Input,
            info,
            &bindings,
            contract_namespace,
            None,
        )? {
            Some(message) => Some(message),
            // Already warned; skip the whole operation.
            None => return Ok(None),
        },
        None => None,
    };

    let reply = match &operation.output {
        Some(output) => match import_message(
            session,
            strategy,
            operation,
            output,
            Direction::Output,
            info,
            &bindings,
            contract_namespace,
            request.as_ref(),
        )? {
            Some(message) => Some(message),
            None => return Ok(None),
        },
        None => None,
    };

    imported.messages.extend(request);
    imported.messages.extend(reply);

    let schemas = session.segregated.for_use(info.is_encoded());
    for fault in &operation.faults {
        if let Some(imported_fault) = faults::import_fault(
            docs,
            schemas,
            strategy,
            session.options.use_message_format_faults,
            fault,
            &mut session.diagnostics,
        ) {
            imported.faults.push(imported_fault);
        }
    }

    Ok(Some(imported))
}

#[allow(clippy::too_many_arguments)]
fn import_message(
    session: &mut ImportSession<'_>,
    strategy: &dyn SerializationStrategy,
    operation: &Operation,
    operation_message: &OperationMessage,
    direction: Direction,
    info: OperationInfo,
    bindings: &[(&Binding, &OperationBinding)],
    contract_namespace: &str,
    request: Option<&MessageDescription>,
) -> Result<Option<MessageDescription>, Error> {
    let docs = session.docs;

    let Some(message_name) = &operation_message.message else {
        let error = Error::MissingMessageRef {
            operation: operation.name.clone(),
        };
        session.diagnostics.warn(error.to_string());
        return Ok(None);
    };

    let cache_key = (contract_namespace.to_owned(), message_name.clone(), direction);
    if let Some(cached) = session.message_cache.get(&cache_key) {
        return Ok(Some(cached.clone()));
    }

    let wsdl_message = docs
        .find_message(message_name)
        .ok_or_else(|| Error::MessageNotFound(message_name.clone()))?;

    let schemas = session.segregated.for_use(info.is_encoded());
    let wrapped = info.all_wrapped && session.options.wrapped;

    let mut description = MessageDescription::new(direction);
    description.message_name = Some(wsdl_message.name.clone());
    description.action = match direction {
        Direction::Input => bindings.iter().find_map(|(_, operation_binding)| {
            operation_binding
                .soap_operation
                .as_ref()
                .and_then(|soap| soap.soap_action.clone())
        }),
        Direction::Output => None,
    };

    match shape::classify(schemas, wsdl_message, wrapped) {
        MessageShape::AnyMessage { part_name } => {
            description.body.parts.push(MessagePartDescription::new(
                &part_name,
                "",
                TypeRef::AnyMessage,
            ));
        }

        MessageShape::Stream { wrapper, part_name } => {
            let namespace = wrapper
                .as_ref()
                .map(|wrapper| wrapper.namespace.clone())
                .unwrap_or_default();
            if let Some(wrapper) = wrapper {
                description.body.wrapper_name = Some(wrapper.name);
                description.body.wrapper_namespace = Some(wrapper.namespace);
            }
            description.body.parts.push(MessagePartDescription::new(
                &part_name,
                &namespace,
                TypeRef::Stream,
            ));
        }

        MessageShape::WrappedParameters { element } => {
            if strategy.can_import_wrapper_element(schemas, &element) {
                description.body.parts = strategy.import_wrapper_element(schemas, &element)?;
                description.body.wrapper_name = Some(element.name);
                description.body.wrapper_namespace = Some(element.namespace);
            } else {
                description.body.parts = import_general_parts(
                    strategy,
                    schemas,
                    wsdl_message,
                    bindings,
                    direction,
                    &mut session.diagnostics,
                )?;
            }
        }

        MessageShape::General => {
            description.body.parts = import_general_parts(
                strategy,
                schemas,
                wsdl_message,
                bindings,
                direction,
                &mut session.diagnostics,
            )?;
        }
    }

    if info.style() == Style::Rpc {
        set_rpc_wrapper(&mut description, operation, direction, bindings, contract_namespace);
    }

    if direction == Direction::Output {
        infer_return_value(
            &mut description,
            operation,
            request,
            session.options.return_policy,
        );
    }

    import_headers(
        docs,
        schemas,
        strategy,
        bindings,
        direction,
        &mut description,
        &mut session.diagnostics,
    );

    session.message_cache.insert(cache_key, description.clone());
    Ok(Some(description))
}

/// rpc wrappers are implied rather than declared: the request wrapper takes
/// the operation name, the reply wrapper `{Operation}Response`, in the
/// contract namespace unless a soap:body binding overrides it.
fn set_rpc_wrapper(
    description: &mut MessageDescription,
    operation: &Operation,
    direction: Direction,
    bindings: &[(&Binding, &OperationBinding)],
    contract_namespace: &str,
) {
    description.body.wrapper_name = Some(match direction {
        Direction::Input => operation.name.clone(),
        Direction::Output => format!("{}Response", operation.name),
    });

    let binding_namespace = bindings.iter().find_map(|(_, operation_binding)| {
        let message_binding = match direction {
            Direction::Input => operation_binding.input.as_ref(),
            Direction::Output => operation_binding.output.as_ref(),
        };
        message_binding
            .and_then(|message_binding| message_binding.body.as_ref())
            .and_then(|body| body.namespace.clone())
    });
    description.body.wrapper_namespace =
        Some(binding_namespace.unwrap_or_else(|| contract_namespace.to_owned()));
}

/// Promotes one reply part to the return value: the part missing from an
/// explicit parameterOrder, or by policy the first part that is not just a
/// byref echo of a request part.
fn infer_return_value(
    description: &mut MessageDescription,
    operation: &Operation,
    request: Option<&MessageDescription>,
    policy: ReturnPolicy,
) {
    let special = description
        .body
        .parts
        .first()
        .map(|part| part.ty.is_any_message() || part.ty.is_stream())
        .unwrap_or(true);
    if special {
        return;
    }

    let promoted = match &operation.parameter_order {
        Some(order) => description
            .body
            .parts
            .iter()
            .position(|part| !order.contains(&part.name)),
        None => match policy {
            ReturnPolicy::Never => None,
            ReturnPolicy::InferFromRequest => {
                let part = &description.body.parts[0];
                let echoed = request
                    .map(|request| {
                        request.body.parts.iter().any(|req| {
                            req.name == part.name && req.namespace == part.namespace
                        })
                    })
                    .unwrap_or(false);
                if echoed {
                    None
                } else {
                    Some(0)
                }
            }
        },
    };

    if let Some(index) = promoted {
        let part = description.body.parts.remove(index);
        description.body.return_value = Some(part);
        for (index, part) in description.body.parts.iter_mut().enumerate() {
            part.index = index;
        }
    }
}

fn import_general_parts(
    strategy: &dyn SerializationStrategy,
    schemas: &SchemaSet,
    message: &Message,
    bindings: &[(&Binding, &OperationBinding)],
    direction: Direction,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<MessagePartDescription>, Error> {
    // A body binding may restrict which named parts travel in the body.
    let subset = bindings.iter().find_map(|(_, operation_binding)| {
        let message_binding = match direction {
            Direction::Input => operation_binding.input.as_ref(),
            Direction::Output => operation_binding.output.as_ref(),
        };
        message_binding
            .and_then(|message_binding| message_binding.body.as_ref())
            .and_then(|body| body.parts.clone())
    });

    let mut parts = Vec::new();
    for part in &message.parts {
        if let Some(subset) = &subset {
            if !subset.contains(&part.name) {
                continue;
            }
        }

        let imported = if let Some(element) = &part.element {
            strategy.import_element(schemas, element)?
        } else if let Some(type_name) = &part.type_name {
            strategy.import_type(schemas, &part.name, type_name)?
        } else {
            let error = Error::PartNeedsElementOrType {
                part: part.name.clone(),
            };
            diagnostics.warn(format!("{}; the part was skipped", error));
            continue;
        };
        parts.push(imported);
    }

    for (index, part) in parts.iter_mut().enumerate() {
        part.index = index;
    }
    Ok(parts)
}

fn import_headers(
    docs: &DocumentSet,
    schemas: &SchemaSet,
    strategy: &dyn SerializationStrategy,
    bindings: &[(&Binding, &OperationBinding)],
    direction: Direction,
    description: &mut MessageDescription,
    diagnostics: &mut Diagnostics,
) {
    for (_, operation_binding) in bindings {
        let message_binding = match direction {
            Direction::Input => operation_binding.input.as_ref(),
            Direction::Output => operation_binding.output.as_ref(),
        };
        let Some(message_binding) = message_binding else {
            continue;
        };

        for header in &message_binding.headers {
            let (Some(message_name), Some(part_name)) = (&header.message, &header.part) else {
                diagnostics
                    .warn("soap:header binding is missing its message or part and was skipped");
                continue;
            };

            let Some(message) = docs.find_message(message_name) else {
                diagnostics.warn(format!(
                    "soap:header binding references missing message {} and was skipped",
                    message_name
                ));
                continue;
            };
            let Some(part) = message.part(part_name) else {
                diagnostics.warn(format!(
                    "soap:header binding references missing part {} of message {} and was skipped",
                    part_name, message_name
                ));
                continue;
            };

            let imported = if let Some(element) = &part.element {
                strategy.import_element(schemas, element)
            } else if let Some(type_name) = &part.type_name {
                strategy.import_type(schemas, &part.name, type_name)
            } else {
                diagnostics.warn(format!(
                    "Header part {} declares neither element nor type and was skipped",
                    part.name
                ));
                continue;
            };

            match imported {
                Ok(imported) => {
                    // The same header bound by several bindings imports once.
                    if !description
                        .headers
                        .iter()
                        .any(|existing| existing.part.name == imported.name)
                    {
                        description
                            .headers
                            .push(MessageHeaderDescription::new(imported));
                    }
                }
                Err(error) => {
                    diagnostics.warn(format!(
                        "Header part {} was skipped: {}",
                        part.name, error
                    ));
                }
            }
        }
    }
}
