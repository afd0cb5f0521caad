//! Bidirectional fault detail mapping. A fault detail is always a single
//! element; faults that cannot satisfy that shape are dropped with a
//! warning on import.

use tracing::debug;
use wisp_contract::{FaultDescription, TypeRef};
use wisp_wsdl::schema::{any_type, SchemaSet};
use wisp_wsdl::types::{
    Definition, DocumentSet, Message, OperationFault, Part, QName,
};

use crate::diag::Diagnostics;
use crate::error::Error;
use crate::naming::NamingResolver;
use crate::parts;
use crate::strategy::{self, SerializationStrategy};

/// Validates and imports one WSDL fault. Returns `None` (with a warning)
/// when the fault does not reference exactly one single-element-part
/// message, or when resolution fails.
pub fn import_fault(
    docs: &DocumentSet,
    schemas: &SchemaSet,
    active: &dyn SerializationStrategy,
    use_message_format: bool,
    fault: &OperationFault,
    diagnostics: &mut Diagnostics,
) -> Option<FaultDescription> {
    let Some(message_name) = &fault.message else {
        diagnostics.warn(format!(
            "Fault {} has no message reference and was skipped",
            fault.name
        ));
        return None;
    };

    let Some(message) = docs.find_message(message_name) else {
        diagnostics.warn(format!(
            "Fault {} references missing message {} and was skipped",
            fault.name, message_name
        ));
        return None;
    };

    let [part] = message.parts.as_slice() else {
        diagnostics.warn(format!(
            "Fault {} must reference a message with exactly one part and was skipped",
            fault.name
        ));
        return None;
    };

    // Fault details are always elements, never bare types.
    let Some(element) = &part.element else {
        diagnostics.warn(format!(
            "Fault {} has a non-element detail part and was skipped",
            fault.name
        ));
        return None;
    };

    let resolver = if use_message_format && active.can_import_fault(schemas, element) {
        active
    } else {
        strategy::fault_fallback()
    };

    match resolver.import_fault(schemas, &fault.name, element) {
        Ok(mut imported) => {
            imported.action = fault.action.clone();
            Some(imported)
        }
        Err(error) => {
            diagnostics.warn(format!("Fault {} was skipped: {}", fault.name, error));
            None
        }
    }
}

/// Exports one fault: a nillable global detail element, a single-part fault
/// message, and the portType fault entry referencing it.
pub fn export_fault(
    schemas: &mut SchemaSet,
    naming: &mut NamingResolver,
    document: &mut Definition,
    port_type_name: &str,
    operation_name: &str,
    contract_namespace: &str,
    fault: &FaultDescription,
) -> Result<OperationFault, Error> {
    let element_name = fault.element_name.as_deref().unwrap_or(&fault.name);
    let namespace = fault.namespace.as_deref().unwrap_or(contract_namespace);
    let element = QName::new(namespace, element_name);

    match &fault.detail_type {
        // The element declaring an anonymous type already exists.
        Some(TypeRef::Anonymous { .. }) => (),
        Some(TypeRef::Named {
            namespace: type_namespace,
            name: type_name,
        }) => {
            export_detail_element(
                schemas,
                naming,
                operation_name,
                &element,
                &QName::new(type_namespace, type_name),
            )?;
        }
        Some(TypeRef::AnyMessage | TypeRef::Stream) | None => {
            export_detail_element(schemas, naming, operation_name, &element, &any_type())?;
        }
    }

    let message_name =
        naming.fault_message_name(port_type_name, operation_name, &fault.name)?;
    let mut message = Message::new(&message_name);
    message.parts.push(Part::element("detail", element));
    document.messages.push(message);

    debug!(
        operation = operation_name,
        fault = %fault.name,
        message = %message_name,
        "exported fault message"
    );

    Ok(OperationFault {
        name: fault.name.clone(),
        message: Some(QName::new(&document.target_namespace, &message_name)),
        action: fault.action.clone(),
    })
}

fn export_detail_element(
    schemas: &mut SchemaSet,
    naming: &mut NamingResolver,
    operation: &str,
    element: &QName,
    type_name: &QName,
) -> Result<(), Error> {
    parts::export_global_element(schemas, naming, operation, element, type_name, true)
}
