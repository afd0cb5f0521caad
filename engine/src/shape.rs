//! Message shape classification: the special single-part cases a WSDL
//! message can take, tested in strict priority order before the general
//! per-part mapping.

use wisp_wsdl::schema::{
    any_message_type, stream_body_type, Particle, SchemaSet, SequenceItem,
};
use wisp_wsdl::types::{Message, QName};

/// How a WSDL message maps onto an abstract message body.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageShape {
    /// The single part is the well-known generic message type; the whole
    /// message is one untyped placeholder part.
    AnyMessage { part_name: String },
    /// The body is a raw stream, either typed directly or nested inside a
    /// wrapper element.
    Stream {
        wrapper: Option<QName>,
        part_name: String,
    },
    /// Wrapped document-literal parameters: the wrapper element's sequence
    /// holds the real part list.
    WrappedParameters { element: QName },
    /// Every part mapped independently.
    General,
}

/// The conventional name of the wrapped-parameters part.
pub const PARAMETERS_PART: &str = "parameters";

/// The single local element of a wrapper whose content is the stream
/// marker, when the wrapper has exactly that shape.
fn wrapped_stream_part(schemas: &SchemaSet, element: &QName) -> Option<String> {
    let resolved = schemas.element_complex_type(element)?;
    let particle = resolved.complex.particle.as_ref()?;

    let Particle::Sequence(items) = particle else {
        return None;
    };
    let [SequenceItem::Element(local)] = items.as_slice() else {
        return None;
    };
    if local.ref_name.is_some() || local.type_name.as_ref() != Some(&stream_body_type()) {
        return None;
    }
    local.name.clone()
}

/// Classifies one WSDL message. `wrapped` is the "all messages wrapped"
/// flag from style resolution, already gated by configuration.
pub fn classify(schemas: &SchemaSet, message: &Message, wrapped: bool) -> MessageShape {
    let [part] = message.parts.as_slice() else {
        return MessageShape::General;
    };

    if part.type_name.as_ref() == Some(&any_message_type()) {
        return MessageShape::AnyMessage {
            part_name: part.name.clone(),
        };
    }

    if part.type_name.as_ref() == Some(&stream_body_type()) {
        return MessageShape::Stream {
            wrapper: None,
            part_name: part.name.clone(),
        };
    }

    if part.name == PARAMETERS_PART {
        if let Some(element) = &part.element {
            if let Some(part_name) = wrapped_stream_part(schemas, element) {
                return MessageShape::Stream {
                    wrapper: Some(element.clone()),
                    part_name,
                };
            }
            if wrapped {
                return MessageShape::WrappedParameters {
                    element: element.clone(),
                };
            }
        }
    }

    MessageShape::General
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_wsdl::schema::{
        ComplexType, ElementDef, LocalElement, Schema, SchemaType, XSD_NS,
    };
    use wisp_wsdl::types::Part;

    fn wrapper_schema(items: Vec<SequenceItem>) -> SchemaSet {
        let mut schema = Schema::new("urn:t");
        let mut element = ElementDef::new("Echo");
        element.inline_type = Some(SchemaType::Complex(ComplexType {
            particle: Some(Particle::Sequence(items)),
        }));
        schema.elements.push(element);
        let mut set = SchemaSet::default();
        set.push(schema);
        set
    }

    fn parameters_message() -> Message {
        let mut message = Message::new("In");
        message
            .parts
            .push(Part::element(PARAMETERS_PART, QName::new("urn:t", "Echo")));
        message
    }

    #[test]
    fn any_message_takes_priority() {
        let mut message = Message::new("In");
        message
            .parts
            .push(Part::typed("body", any_message_type()));
        assert_eq!(
            classify(&SchemaSet::default(), &message, true),
            MessageShape::AnyMessage {
                part_name: "body".to_owned()
            }
        );
    }

    #[test]
    fn direct_stream_part() {
        let mut message = Message::new("In");
        message
            .parts
            .push(Part::typed("data", stream_body_type()));
        assert_eq!(
            classify(&SchemaSet::default(), &message, true),
            MessageShape::Stream {
                wrapper: None,
                part_name: "data".to_owned()
            }
        );
    }

    #[test]
    fn wrapped_stream_beats_wrapped_parameters() {
        let schemas = wrapper_schema(vec![SequenceItem::Element(LocalElement::named(
            "data",
            stream_body_type(),
        ))]);
        assert_eq!(
            classify(&schemas, &parameters_message(), true),
            MessageShape::Stream {
                wrapper: Some(QName::new("urn:t", "Echo")),
                part_name: "data".to_owned()
            }
        );
    }

    #[test]
    fn wrapped_parameters_requires_flag() {
        let schemas = wrapper_schema(vec![SequenceItem::Element(LocalElement::named(
            "text",
            QName::new(XSD_NS, "string"),
        ))]);
        assert_eq!(
            classify(&schemas, &parameters_message(), true),
            MessageShape::WrappedParameters {
                element: QName::new("urn:t", "Echo")
            }
        );
        assert_eq!(
            classify(&schemas, &parameters_message(), false),
            MessageShape::General
        );
    }

    #[test]
    fn multi_part_message_is_general() {
        let mut message = Message::new("In");
        message
            .parts
            .push(Part::typed("a", QName::new(XSD_NS, "int")));
        message
            .parts
            .push(Part::typed("b", QName::new(XSD_NS, "int")));
        assert_eq!(
            classify(&SchemaSet::default(), &message, true),
            MessageShape::General
        );
    }
}
