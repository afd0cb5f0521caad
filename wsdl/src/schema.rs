//! XML Schema object model, reduced to the shapes the contract compiler
//! inspects: global elements, global types, sequence particles and the
//! import/include graph between schemas.

use crate::types::QName;

pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
pub const SOAP_ENCODING_NS: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// Namespace of the well-known placeholder body types.
pub const MESSAGE_NS: &str = "http://schemas.microsoft.com/Message";

/// Type of a part carrying an arbitrary, untyped message body.
pub fn any_message_type() -> QName {
    QName::new(MESSAGE_NS, "MessageBody")
}

/// Type of a part carrying a raw stream body.
pub fn stream_body_type() -> QName {
    QName::new(MESSAGE_NS, "StreamBody")
}

pub fn base64_binary() -> QName {
    QName::new(XSD_NS, "base64Binary")
}

pub fn any_type() -> QName {
    QName::new(XSD_NS, "anyType")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    pub fn is_multiple(self) -> bool {
        match self {
            MaxOccurs::Bounded(n) => n > 1,
            MaxOccurs::Unbounded => true,
        }
    }
}

impl Default for MaxOccurs {
    fn default() -> Self {
        MaxOccurs::Bounded(1)
    }
}

/// An element declared inside a particle.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalElement {
    pub name: Option<String>,
    /// Reference to a global element; exclusive with `name`/`type_name`.
    pub ref_name: Option<QName>,
    pub type_name: Option<QName>,
    pub inline_type: Option<SchemaType>,
    pub nillable: bool,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    /// `form="qualified"` on the element itself, overriding the schema
    /// default when set.
    pub form_qualified: Option<bool>,
}

impl LocalElement {
    pub fn named(name: &str, type_name: QName) -> Self {
        Self {
            name: Some(name.to_owned()),
            ref_name: None,
            type_name: Some(type_name),
            inline_type: None,
            nillable: false,
            min_occurs: 1,
            max_occurs: MaxOccurs::default(),
            form_qualified: None,
        }
    }

    pub fn reference(ref_name: QName) -> Self {
        Self {
            name: None,
            ref_name: Some(ref_name),
            type_name: None,
            inline_type: None,
            nillable: false,
            min_occurs: 1,
            max_occurs: MaxOccurs::default(),
            form_qualified: None,
        }
    }
}

/// An `xs:any` wildcard.
#[derive(Debug, Clone, PartialEq)]
pub struct AnyElement {
    pub namespace: Option<String>,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SequenceItem {
    Element(LocalElement),
    Any(AnyElement),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Particle {
    Sequence(Vec<SequenceItem>),
    Choice(Vec<SequenceItem>),
    All(Vec<SequenceItem>),
}

impl Particle {
    pub fn items(&self) -> &[SequenceItem] {
        match self {
            Particle::Sequence(items) | Particle::Choice(items) | Particle::All(items) => items,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleType {
    /// Base of an `xs:restriction`.
    pub base: Option<QName>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplexType {
    pub particle: Option<Particle>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaType {
    Simple(SimpleType),
    Complex(ComplexType),
}

/// A global element declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDef {
    pub name: String,
    pub nillable: bool,
    pub type_name: Option<QName>,
    pub inline_type: Option<SchemaType>,
}

impl ElementDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            nillable: false,
            type_name: None,
            inline_type: None,
        }
    }
}

/// A global type definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub ty: SchemaType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub target_namespace: String,
    /// `elementFormDefault="qualified"`.
    pub element_form_qualified: bool,
    /// Namespaces pulled in by xs:import (or xs:include, which stays inside
    /// the same namespace).
    pub imports: Vec<String>,
    pub elements: Vec<ElementDef>,
    pub types: Vec<TypeDef>,
}

impl Schema {
    pub fn new(target_namespace: &str) -> Self {
        Self {
            target_namespace: target_namespace.to_owned(),
            element_form_qualified: false,
            imports: Vec::new(),
            elements: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn element(&self, name: &str) -> Option<&ElementDef> {
        self.elements.iter().find(|element| element.name == name)
    }

    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|ty| ty.name == name)
    }

    pub fn add_import(&mut self, namespace: &str) {
        if namespace != self.target_namespace
            && !self.imports.iter().any(|ns| ns == namespace)
        {
            self.imports.push(namespace.to_owned());
        }
    }
}

/// Every schema known to one compilation, keyed by target namespace. More
/// than one schema may share a namespace (chameleon includes, split
/// documents), so lookups scan all of them in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaSet {
    pub schemas: Vec<Schema>,
}

impl SchemaSet {
    pub fn merge(&mut self, other: SchemaSet) {
        self.schemas.extend(other.schemas);
    }

    pub fn push(&mut self, schema: Schema) {
        self.schemas.push(schema);
    }

    /// The schema with the given target namespace, created on demand.
    pub fn get_or_create(&mut self, namespace: &str) -> &mut Schema {
        let index = match self
            .schemas
            .iter()
            .position(|schema| schema.target_namespace == namespace)
        {
            Some(index) => index,
            None => {
                self.schemas.push(Schema::new(namespace));
                self.schemas.len() - 1
            }
        };
        &mut self.schemas[index]
    }

    pub fn find_element(&self, name: &QName) -> Option<(&Schema, &ElementDef)> {
        self.schemas
            .iter()
            .filter(|schema| schema.target_namespace == name.namespace)
            .find_map(|schema| schema.element(&name.name).map(|element| (schema, element)))
    }

    pub fn find_type(&self, name: &QName) -> Option<(&Schema, &TypeDef)> {
        self.schemas
            .iter()
            .filter(|schema| schema.target_namespace == name.namespace)
            .find_map(|schema| schema.type_def(&name.name).map(|ty| (schema, ty)))
    }

    /// Resolves the complex type behind a global element, following a
    /// `type=` reference when the element has no inline type. Returns the
    /// type together with the namespace local child elements live in when
    /// the defining schema is form-qualified.
    pub fn element_complex_type(&self, name: &QName) -> Option<ResolvedElement<'_>> {
        let (schema, element) = self.find_element(name)?;
        if let Some(SchemaType::Complex(complex)) = &element.inline_type {
            return Some(ResolvedElement {
                complex,
                schema,
                qualified: schema.element_form_qualified,
            });
        }
        let type_name = element.type_name.as_ref()?;
        let (type_schema, type_def) = self.find_type(type_name)?;
        match &type_def.ty {
            SchemaType::Complex(complex) => Some(ResolvedElement {
                complex,
                schema: type_schema,
                qualified: type_schema.element_form_qualified,
            }),
            SchemaType::Simple(_) => None,
        }
    }

    /// The namespace a local element's content lives in, per the schema's
    /// form rules. Unqualified local elements sit in no namespace.
    pub fn local_element_namespace(
        &self,
        schema: &Schema,
        element: &LocalElement,
    ) -> String {
        let qualified = element
            .form_qualified
            .unwrap_or(schema.element_form_qualified);
        if qualified {
            schema.target_namespace.clone()
        } else {
            String::new()
        }
    }
}

/// A global element resolved down to its complex type.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedElement<'a> {
    pub complex: &'a ComplexType,
    /// Schema defining the complex content, which governs local element
    /// qualification.
    pub schema: &'a Schema,
    pub qualified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_occurs_multiplicity() {
        assert!(!MaxOccurs::Bounded(1).is_multiple());
        assert!(MaxOccurs::Bounded(2).is_multiple());
        assert!(MaxOccurs::Unbounded.is_multiple());
    }

    #[test]
    fn element_type_resolution_follows_type_reference() {
        let mut schema = Schema::new("urn:a");
        schema.element_form_qualified = true;
        let mut element = ElementDef::new("Ping");
        element.type_name = Some(QName::new("urn:a", "PingType"));
        schema.elements.push(element);
        schema.types.push(TypeDef {
            name: "PingType".to_owned(),
            ty: SchemaType::Complex(ComplexType {
                particle: Some(Particle::Sequence(vec![SequenceItem::Element(
                    LocalElement::named("value", QName::new(XSD_NS, "int")),
                )])),
            }),
        });
        let mut set = SchemaSet::default();
        set.push(schema);

        let resolved = set
            .element_complex_type(&QName::new("urn:a", "Ping"))
            .unwrap();
        assert!(resolved.qualified);
        assert_eq!(resolved.complex.particle.as_ref().unwrap().items().len(), 1);
    }

    #[test]
    fn import_dedup() {
        let mut schema = Schema::new("urn:a");
        schema.add_import("urn:b");
        schema.add_import("urn:b");
        schema.add_import("urn:a");
        assert_eq!(schema.imports, vec!["urn:b".to_owned()]);
    }
}
