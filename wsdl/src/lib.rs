//! Loading and object model for WSDL documents and their inline XML schemas.
//!
//! [`parse`] fetches a document by URL or file path and follows its imports;
//! [`parse_str`] parses an in-memory document. Both produce a
//! [`types::DocumentSet`], the unit a contract compilation works over.

use std::path::Path;

use quick_xml::Reader;
use url::Url;

mod parser;

pub mod error;
pub mod schema;
pub mod types;

pub fn parse<S: AsRef<str>>(url: S) -> Result<types::DocumentSet, error::Error> {
    let url = {
        match Url::parse(url.as_ref()) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let path = Path::new(url.as_ref())
                    .canonicalize()
                    .map_err(|err| error::Error::PathConversionError(Some(err)))?;
                Url::from_file_path(&path)
                    .map_err(|()| error::Error::PathConversionError(None))?
            }
            Err(err) => return Err(err.into()),
        }
    };

    parser::parse(url)
}

/// Parses a document already in memory. External references cannot be
/// followed without a base URL.
pub fn parse_str(input: &str) -> Result<types::DocumentSet, error::Error> {
    parser::parse_reader(Reader::from_reader(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Particle, SequenceItem};
    use crate::types::{QName, SoapStyle, SoapUse};

    const DOC: &str = r#"<?xml version="1.0"?>
<wsdl:definitions targetNamespace="urn:calc"
        xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
        xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
        xmlns:xs="http://www.w3.org/2001/XMLSchema"
        xmlns:tns="urn:calc">
    <wsdl:types>
        <xs:schema targetNamespace="urn:calc" elementFormDefault="qualified">
            <xs:element name="Add">
                <xs:complexType>
                    <xs:sequence>
                        <xs:element name="a" type="xs:int"/>
                        <xs:element name="b" type="xs:int"/>
                    </xs:sequence>
                </xs:complexType>
            </xs:element>
            <xs:element name="AddResponse">
                <xs:complexType>
                    <xs:sequence>
                        <xs:element name="AddResult" type="xs:int"/>
                    </xs:sequence>
                </xs:complexType>
            </xs:element>
        </xs:schema>
    </wsdl:types>
    <wsdl:message name="Calculator_Add_InputMessage">
        <wsdl:part name="parameters" element="tns:Add"/>
    </wsdl:message>
    <wsdl:message name="Calculator_Add_OutputMessage">
        <wsdl:part name="parameters" element="tns:AddResponse"/>
    </wsdl:message>
    <wsdl:portType name="Calculator">
        <wsdl:operation name="Add">
            <wsdl:documentation>Adds two integers.</wsdl:documentation>
            <wsdl:input message="tns:Calculator_Add_InputMessage"/>
            <wsdl:output message="tns:Calculator_Add_OutputMessage"/>
        </wsdl:operation>
    </wsdl:portType>
    <wsdl:binding name="CalculatorSoap" type="tns:Calculator">
        <soap:binding style="document"
            transport="http://schemas.xmlsoap.org/soap/http"/>
        <wsdl:operation name="Add">
            <soap:operation soapAction="urn:calc/Add"/>
            <wsdl:input>
                <soap:body use="literal"/>
            </wsdl:input>
            <wsdl:output>
                <soap:body use="literal"/>
            </wsdl:output>
        </wsdl:operation>
    </wsdl:binding>
    <wsdl:service name="CalculatorService">
        <wsdl:port name="CalculatorPort" binding="tns:CalculatorSoap">
            <soap:address location="http://localhost/calc"/>
        </wsdl:port>
    </wsdl:service>
</wsdl:definitions>"#;

    #[test]
    fn parses_document_structure() {
        let docs = parse_str(DOC).unwrap();
        assert_eq!(docs.documents.len(), 1);

        let doc = &docs.documents[0];
        assert_eq!(doc.target_namespace, "urn:calc");
        assert_eq!(doc.messages.len(), 2);

        let input = doc.message("Calculator_Add_InputMessage").unwrap();
        assert_eq!(input.parts.len(), 1);
        assert_eq!(
            input.parts[0].element,
            Some(QName::new("urn:calc", "Add"))
        );
        assert_eq!(input.parts[0].type_name, None);

        let operation = &doc.port_types[0].operations[0];
        assert_eq!(operation.name, "Add");
        assert_eq!(
            operation.documentation.as_deref(),
            Some("Adds two integers.")
        );
        assert!(operation.input.is_some());
        assert!(operation.output.is_some());
    }

    #[test]
    fn parses_soap_binding_extensions() {
        let docs = parse_str(DOC).unwrap();
        let binding = &docs.documents[0].bindings[0];

        assert_eq!(binding.default_style(), Some(SoapStyle::Document));
        assert_eq!(binding.port_type, QName::new("urn:calc", "Calculator"));

        let operation = &binding.operations[0];
        let soap_operation = operation.soap_operation.as_ref().unwrap();
        assert_eq!(soap_operation.soap_action.as_deref(), Some("urn:calc/Add"));

        let body = operation.input.as_ref().unwrap().body.as_ref().unwrap();
        assert_eq!(body.use_, SoapUse::Literal);
    }

    #[test]
    fn parses_inline_schema() {
        let docs = parse_str(DOC).unwrap();
        let resolved = docs
            .schemas
            .element_complex_type(&QName::new("urn:calc", "Add"))
            .unwrap();
        assert!(resolved.qualified);

        match resolved.complex.particle.as_ref().unwrap() {
            Particle::Sequence(items) => {
                assert_eq!(items.len(), 2);
                match &items[0] {
                    SequenceItem::Element(element) => {
                        assert_eq!(element.name.as_deref(), Some("a"));
                    }
                    other => panic!("unexpected item: {:?}", other),
                }
            }
            other => panic!("unexpected particle: {:?}", other),
        }
    }

    #[test]
    fn unresolvable_prefix_is_an_error() {
        let doc = r#"<definitions targetNamespace="urn:x"
            xmlns="http://schemas.xmlsoap.org/wsdl/">
            <binding name="B" type="missing:T"/>
        </definitions>"#;
        assert!(matches!(
            parse_str(doc),
            Err(error::Error::UnboundPrefix(prefix)) if prefix == "missing"
        ));
    }
}
