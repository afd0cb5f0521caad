//! Part-to-type mapping: one WSDL part (element or type reference) to or
//! from one abstract part description.

use std::collections::HashSet;

use wisp_contract::{MessageBody, MessagePartDescription, TypeRef};
use wisp_wsdl::schema::{
    any_message_type, stream_body_type, ElementDef, LocalElement, MaxOccurs, Schema, SchemaSet,
    XSD_NS,
};
use wisp_wsdl::types::{Part, QName};

use crate::error::Error;
use crate::naming::NamingResolver;

/// The type behind a global element: a named type reference, or the element
/// itself when the type is declared inline (anonymous). An element with
/// neither resolves to `xs:anyType`.
pub fn resolve_element_type(schemas: &SchemaSet, name: &QName) -> Result<TypeRef, Error> {
    let (_, element) = schemas
        .find_element(name)
        .ok_or_else(|| Error::ElementNotFound(name.clone()))?;

    if let Some(type_name) = &element.type_name {
        Ok(TypeRef::named(&type_name.namespace, &type_name.name))
    } else if element.inline_type.is_some() {
        Ok(TypeRef::Anonymous {
            element_namespace: name.namespace.clone(),
            element_name: name.name.clone(),
        })
    } else {
        Ok(TypeRef::named(XSD_NS, "anyType"))
    }
}

pub fn element_exists(schemas: &SchemaSet, name: &QName) -> bool {
    schemas.find_element(name).is_some()
}

/// Built-in XSD types need no definition; everything else must be declared.
pub fn type_exists(schemas: &SchemaSet, name: &QName) -> bool {
    name.namespace == XSD_NS || schemas.find_type(name).is_some()
}

/// Imports a part referencing a global element. The abstract part takes the
/// element's name and namespace.
pub fn import_element_part(
    schemas: &SchemaSet,
    element_name: &QName,
) -> Result<MessagePartDescription, Error> {
    let ty = resolve_element_type(schemas, element_name)?;
    Ok(MessagePartDescription::new(
        &element_name.name,
        &element_name.namespace,
        ty,
    ))
}

/// Imports one local element of a wrapper sequence. A `ref=` resolves
/// through the referenced global element; an inline declaration takes its
/// namespace from the schema's form rules.
pub fn import_local_element(
    schemas: &SchemaSet,
    defining_namespace: &str,
    qualified_default: bool,
    element: &LocalElement,
) -> Result<MessagePartDescription, Error> {
    let mut part = if let Some(ref_name) = &element.ref_name {
        import_element_part(schemas, ref_name)?
    } else {
        let name = element
            .name
            .as_deref()
            .ok_or_else(|| Error::PartNeedsElementOrType {
                part: "<local element>".to_owned(),
            })?;

        let namespace = if element.form_qualified.unwrap_or(qualified_default) {
            defining_namespace
        } else {
            ""
        };

        let ty = if let Some(type_name) = &element.type_name {
            TypeRef::named(&type_name.namespace, &type_name.name)
        } else if element.inline_type.is_some() {
            TypeRef::Anonymous {
                element_namespace: namespace.to_owned(),
                element_name: name.to_owned(),
            }
        } else {
            TypeRef::named(XSD_NS, "anyType")
        };

        MessagePartDescription::new(name, namespace, ty)
    };

    part.multiple = element.max_occurs.is_multiple();
    Ok(part)
}

/// Imports a bare `type=` part: rpc convention, empty part namespace.
pub fn import_type_part(part_name: &str, type_name: &QName) -> MessagePartDescription {
    MessagePartDescription::new(
        part_name,
        "",
        TypeRef::named(&type_name.namespace, &type_name.name),
    )
}

/// The schema type name a part's abstract type maps to. Anonymous types have
/// no name to put in a `type=` attribute.
pub fn type_ref_qname(part: &MessagePartDescription) -> Result<QName, Error> {
    match &part.ty {
        TypeRef::Named { namespace, name } => Ok(QName::new(namespace, name)),
        TypeRef::AnyMessage => Ok(any_message_type()),
        TypeRef::Stream => Ok(stream_body_type()),
        TypeRef::Anonymous { .. } => Err(Error::AnonymousType {
            part: part.name.clone(),
        }),
    }
}

/// The schema content is emitted into during export. Exported schemas always
/// declare `elementFormDefault="qualified"`.
pub fn target_schema<'a>(schemas: &'a mut SchemaSet, namespace: &str) -> &'a mut Schema {
    let schema = schemas.get_or_create(namespace);
    schema.element_form_qualified = true;
    schema
}

/// Records an `xs:import` in the schema for `namespace` when it references
/// content from another namespace.
pub fn ensure_import(schemas: &mut SchemaSet, namespace: &str, referenced: &str) {
    if referenced.is_empty() || referenced == XSD_NS || referenced == namespace {
        return;
    }
    target_schema(schemas, namespace).add_import(referenced);
}

/// Emits a global element for a part and registers it for collision
/// detection. No-op when an identical element is already registered.
pub fn export_global_element(
    schemas: &mut SchemaSet,
    naming: &mut NamingResolver,
    operation: &str,
    name: &QName,
    type_name: &QName,
    nillable: bool,
) -> Result<(), Error> {
    let mut element = ElementDef::new(&name.name);
    element.type_name = Some(type_name.clone());
    element.nillable = nillable;

    if naming.register_element(name.clone(), &element, operation)? {
        target_schema(schemas, &name.namespace).elements.push(element);
        ensure_import(schemas, &name.namespace, &type_name.namespace);
    }
    Ok(())
}

/// Exports one part as a WSDL part referencing a global element, emitting
/// the element when needed. A part carrying an anonymous type references the
/// element that declared it.
pub fn export_element_part(
    schemas: &mut SchemaSet,
    naming: &mut NamingResolver,
    operation: &str,
    part: &MessagePartDescription,
) -> Result<Part, Error> {
    if let TypeRef::Anonymous {
        element_namespace,
        element_name,
    } = &part.ty
    {
        return Ok(Part::element(
            part.wire_name(),
            QName::new(element_namespace, element_name),
        ));
    }

    let type_name = type_ref_qname(part)?;
    let element_name = QName::new(&part.namespace, &part.name);
    export_global_element(schemas, naming, operation, &element_name, &type_name, false)?;
    Ok(Part::element(part.wire_name(), element_name))
}

/// Exports one part as a bare `type=` WSDL part (rpc, no wrapper element).
pub fn export_type_part(part: &MessagePartDescription) -> Result<Part, Error> {
    let type_name = type_ref_qname(part)?;
    Ok(Part::typed(part.wire_name(), type_name))
}

/// Exports one part into a wrapper sequence. Parts in the wrapper's
/// namespace are inlined; foreign-namespace parts and anonymous types become
/// a `ref=` to a global element.
pub fn export_local_element(
    schemas: &mut SchemaSet,
    naming: &mut NamingResolver,
    operation: &str,
    wrapper_namespace: &str,
    part: &MessagePartDescription,
) -> Result<LocalElement, Error> {
    let max_occurs = if part.multiple {
        MaxOccurs::Unbounded
    } else {
        MaxOccurs::default()
    };

    if let TypeRef::Anonymous {
        element_namespace,
        element_name,
    } = &part.ty
    {
        ensure_import(schemas, wrapper_namespace, element_namespace);
        let mut element = LocalElement::reference(QName::new(element_namespace, element_name));
        element.max_occurs = max_occurs;
        return Ok(element);
    }

    let type_name = type_ref_qname(part)?;
    if part.namespace == wrapper_namespace {
        ensure_import(schemas, wrapper_namespace, &type_name.namespace);
        let mut element = LocalElement::named(&part.name, type_name);
        element.max_occurs = max_occurs;
        Ok(element)
    } else {
        let element_name = QName::new(&part.namespace, &part.name);
        export_global_element(schemas, naming, operation, &element_name, &type_name, false)?;
        ensure_import(schemas, wrapper_namespace, &part.namespace);
        let mut element = LocalElement::reference(element_name);
        element.max_occurs = max_occurs;
        Ok(element)
    }
}

/// Resolves duplicate part names within one message body. Element parts get
/// an integer-suffixed `unique_part_name`; duplicate names on rpc type parts
/// have no legal rendering and are a hard error.
pub fn assign_unique_part_names(body: &mut MessageBody, rpc: bool) -> Result<(), Error> {
    let mut used: HashSet<String> = HashSet::new();

    let return_value = body.return_value.iter_mut();
    for part in return_value.chain(body.parts.iter_mut()) {
        if used.insert(part.name.clone()) {
            part.unique_part_name = None;
            continue;
        }
        if rpc {
            return Err(Error::DuplicateRpcPartName {
                part: part.name.clone(),
            });
        }
        for suffix in 1..=u64::MAX {
            let candidate = format!("{}{}", part.name, suffix);
            if used.insert(candidate.clone()) {
                part.unique_part_name = Some(candidate);
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_wsdl::schema::{ComplexType, Schema, SchemaType};

    fn schema_with_element(ns: &str, element: &str, ty: Option<QName>) -> SchemaSet {
        let mut schema = Schema::new(ns);
        let mut def = ElementDef::new(element);
        def.type_name = ty;
        if def.type_name.is_none() {
            def.inline_type = Some(SchemaType::Complex(ComplexType::default()));
        }
        schema.elements.push(def);
        let mut set = SchemaSet::default();
        set.push(schema);
        set
    }

    #[test]
    fn element_part_takes_element_identity() {
        let schemas =
            schema_with_element("urn:t", "Ping", Some(QName::new(XSD_NS, "string")));
        let part = import_element_part(&schemas, &QName::new("urn:t", "Ping")).unwrap();
        assert_eq!(part.name, "Ping");
        assert_eq!(part.namespace, "urn:t");
        assert_eq!(part.ty, TypeRef::named(XSD_NS, "string"));
    }

    #[test]
    fn inline_type_imports_as_anonymous() {
        let schemas = schema_with_element("urn:t", "Ping", None);
        let part = import_element_part(&schemas, &QName::new("urn:t", "Ping")).unwrap();
        assert_eq!(
            part.ty,
            TypeRef::Anonymous {
                element_namespace: "urn:t".to_owned(),
                element_name: "Ping".to_owned(),
            }
        );
    }

    #[test]
    fn unqualified_local_element_has_empty_namespace() {
        let schemas = SchemaSet::default();
        let element = LocalElement::named("value", QName::new(XSD_NS, "int"));
        let part = import_local_element(&schemas, "urn:t", false, &element).unwrap();
        assert_eq!(part.namespace, "");
    }

    #[test]
    fn repeated_local_element_is_multiple() {
        let schemas = SchemaSet::default();
        let mut element = LocalElement::named("items", QName::new(XSD_NS, "string"));
        element.max_occurs = MaxOccurs::Unbounded;
        let part = import_local_element(&schemas, "urn:t", true, &element).unwrap();
        assert!(part.multiple);
    }

    #[test]
    fn anonymous_type_rejected_for_bare_type_part() {
        let part = MessagePartDescription::new(
            "p",
            "urn:t",
            TypeRef::Anonymous {
                element_namespace: "urn:t".to_owned(),
                element_name: "P".to_owned(),
            },
        );
        assert!(matches!(
            export_type_part(&part),
            Err(Error::AnonymousType { .. })
        ));
    }

    #[test]
    fn duplicate_element_part_names_get_suffixes() {
        let mut body = MessageBody::default();
        body.parts.push(MessagePartDescription::new(
            "value",
            "urn:t",
            TypeRef::named(XSD_NS, "string"),
        ));
        body.parts.push(MessagePartDescription::new(
            "value",
            "urn:t",
            TypeRef::named(XSD_NS, "int"),
        ));
        assign_unique_part_names(&mut body, false).unwrap();
        assert_eq!(body.parts[0].wire_name(), "value");
        assert_eq!(body.parts[1].wire_name(), "value1");
    }

    #[test]
    fn duplicate_rpc_part_names_are_fatal() {
        let mut body = MessageBody::default();
        body.parts.push(MessagePartDescription::new(
            "value",
            "",
            TypeRef::named(XSD_NS, "string"),
        ));
        body.parts.push(MessagePartDescription::new(
            "value",
            "",
            TypeRef::named(XSD_NS, "int"),
        ));
        assert!(matches!(
            assign_unique_part_names(&mut body, true),
            Err(Error::DuplicateRpcPartName { .. })
        ));
    }
}
