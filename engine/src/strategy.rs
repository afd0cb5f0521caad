//! Pluggable serialization strategies. A strategy is chosen once per
//! contract and resolves every part of every operation; the two concrete
//! strategies differ in whether bare-type parts and encoded content are
//! expressible.

use wisp_contract::{FaultDescription, MessagePartDescription};
use wisp_wsdl::schema::{Particle, SchemaSet, SequenceItem};
use wisp_wsdl::types::QName;

use crate::error::Error;
use crate::parts;
use crate::style::StyleAndUse;

pub trait SerializationStrategy {
    fn name(&self) -> &'static str;

    fn can_import_element(&self, schemas: &SchemaSet, element: &QName) -> bool;
    fn import_element(
        &self,
        schemas: &SchemaSet,
        element: &QName,
    ) -> Result<MessagePartDescription, Error>;

    fn can_import_type(&self, schemas: &SchemaSet, type_name: &QName) -> bool;
    fn import_type(
        &self,
        schemas: &SchemaSet,
        part_name: &str,
        type_name: &QName,
    ) -> Result<MessagePartDescription, Error>;

    fn can_import_wrapper_element(&self, schemas: &SchemaSet, element: &QName) -> bool {
        wrapper_elements(schemas, element)
            .map(|elements| {
                elements.iter().all(|local| match &local.ref_name {
                    Some(ref_name) => self.can_import_element(schemas, ref_name),
                    None => true,
                })
            })
            .unwrap_or(false)
    }

    fn import_wrapper_element(
        &self,
        schemas: &SchemaSet,
        element: &QName,
    ) -> Result<Vec<MessagePartDescription>, Error> {
        import_wrapper(schemas, element)
    }

    fn can_import_fault(&self, schemas: &SchemaSet, element: &QName) -> bool {
        parts::element_exists(schemas, element)
    }

    fn import_fault(
        &self,
        schemas: &SchemaSet,
        name: &str,
        element: &QName,
    ) -> Result<FaultDescription, Error> {
        import_fault_detail(schemas, name, element)
    }

    /// Rejects style/use combinations the strategy cannot express.
    fn validate_style_use(&self, operation: &str, style_use: StyleAndUse) -> Result<(), Error>;
}

/// Strict document-oriented resolution: every part must come through a
/// global element, literal use only.
pub struct DocumentStrategy;

/// Rpc-oriented resolution: additionally accepts bare-type parts and
/// encoded content, except the document+encoded combination.
pub struct RpcStrategy;

impl SerializationStrategy for DocumentStrategy {
    fn name(&self) -> &'static str {
        "document"
    }

    fn can_import_element(&self, schemas: &SchemaSet, element: &QName) -> bool {
        parts::element_exists(schemas, element)
    }

    fn import_element(
        &self,
        schemas: &SchemaSet,
        element: &QName,
    ) -> Result<MessagePartDescription, Error> {
        parts::import_element_part(schemas, element)
    }

    fn can_import_type(&self, _schemas: &SchemaSet, _type_name: &QName) -> bool {
        false
    }

    fn import_type(
        &self,
        _schemas: &SchemaSet,
        part_name: &str,
        _type_name: &QName,
    ) -> Result<MessagePartDescription, Error> {
        Err(Error::BareTypeNotSupported {
            strategy: self.name(),
            part: part_name.to_owned(),
        })
    }

    fn validate_style_use(&self, operation: &str, style_use: StyleAndUse) -> Result<(), Error> {
        if style_use.is_encoded() {
            return Err(Error::EncodedNotSupported {
                strategy: self.name(),
                operation: operation.to_owned(),
            });
        }
        Ok(())
    }
}

impl SerializationStrategy for RpcStrategy {
    fn name(&self) -> &'static str {
        "rpc"
    }

    fn can_import_element(&self, schemas: &SchemaSet, element: &QName) -> bool {
        parts::element_exists(schemas, element)
    }

    fn import_element(
        &self,
        schemas: &SchemaSet,
        element: &QName,
    ) -> Result<MessagePartDescription, Error> {
        parts::import_element_part(schemas, element)
    }

    fn can_import_type(&self, schemas: &SchemaSet, type_name: &QName) -> bool {
        parts::type_exists(schemas, type_name)
    }

    fn import_type(
        &self,
        schemas: &SchemaSet,
        part_name: &str,
        type_name: &QName,
    ) -> Result<MessagePartDescription, Error> {
        if !parts::type_exists(schemas, type_name) {
            return Err(Error::TypeNotFound(type_name.clone()));
        }
        Ok(parts::import_type_part(part_name, type_name))
    }

    fn validate_style_use(&self, operation: &str, style_use: StyleAndUse) -> Result<(), Error> {
        if style_use == StyleAndUse::DocumentEncoded {
            return Err(Error::DocumentEncodedNotSupported {
                operation: operation.to_owned(),
            });
        }
        Ok(())
    }
}

pub static DOCUMENT_STRATEGY: DocumentStrategy = DocumentStrategy;
pub static RPC_STRATEGY: RpcStrategy = RpcStrategy;

/// Strategies in selection order; the first whose capabilities cover every
/// operation of a contract wins.
pub fn strategies() -> [&'static dyn SerializationStrategy; 2] {
    [&DOCUMENT_STRATEGY, &RPC_STRATEGY]
}

/// The always-available fault fallback, used when message-format fault
/// import is disabled or the active strategy cannot express a fault.
pub fn fault_fallback() -> &'static dyn SerializationStrategy {
    &DOCUMENT_STRATEGY
}

/// The wrapper's local elements, when its particle is a flat sequence of
/// elements. Groups, choices and wildcards disqualify the wrapper.
fn wrapper_elements(
    schemas: &SchemaSet,
    element: &QName,
) -> Option<Vec<wisp_wsdl::schema::LocalElement>> {
    let resolved = schemas.element_complex_type(element)?;
    let items = match &resolved.complex.particle {
        None => return Some(Vec::new()),
        Some(Particle::Sequence(items)) => items,
        Some(_) => return None,
    };

    let mut elements = Vec::with_capacity(items.len());
    for item in items {
        match item {
            SequenceItem::Element(local) => elements.push(local.clone()),
            SequenceItem::Any(_) => return None,
        }
    }
    Some(elements)
}

fn import_wrapper(
    schemas: &SchemaSet,
    element: &QName,
) -> Result<Vec<MessagePartDescription>, Error> {
    let resolved = schemas
        .element_complex_type(element)
        .ok_or_else(|| Error::ElementNotFound(element.clone()))?;
    let namespace = resolved.schema.target_namespace.clone();
    let qualified = resolved.qualified;

    let elements =
        wrapper_elements(schemas, element).ok_or_else(|| Error::ElementNotFound(element.clone()))?;

    let mut imported = Vec::with_capacity(elements.len());
    for (index, local) in elements.iter().enumerate() {
        let mut part = parts::import_local_element(schemas, &namespace, qualified, local)?;
        part.index = index;
        imported.push(part);
    }
    Ok(imported)
}

fn import_fault_detail(
    schemas: &SchemaSet,
    name: &str,
    element: &QName,
) -> Result<FaultDescription, Error> {
    let detail_type = parts::resolve_element_type(schemas, element)?;
    let mut fault = FaultDescription::new(name);
    fault.element_name = Some(element.name.clone());
    fault.namespace = Some(element.namespace.clone());
    fault.detail_type = Some(detail_type);
    Ok(fault)
}
