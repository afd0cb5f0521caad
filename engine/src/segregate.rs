//! Encoded-vs-literal schema segregation. Encoded and literal wire messages
//! use incompatible type systems, so the importer partitions the full schema
//! set into the subsets each strategy is allowed to resolve against.

use std::collections::HashSet;

use tracing::debug;
use wisp_wsdl::schema::{SchemaSet, XSD_NS};
use wisp_wsdl::types::{Definition, DocumentSet, Message, QName, SoapUse};

use crate::diag::Diagnostics;

#[derive(Debug, Clone, Default)]
pub struct SegregatedSchemas {
    pub literal: SchemaSet,
    pub encoded: SchemaSet,
}

impl SegregatedSchemas {
    /// The schema subset the given use resolves against.
    pub fn for_use(&self, encoded: bool) -> &SchemaSet {
        if encoded {
            &self.encoded
        } else {
            &self.literal
        }
    }
}

/// Every `use` observed for a message across all binding operations that
/// reference it, through body bindings of bound operations and header
/// bindings naming the message directly.
fn find_uses(docs: &DocumentSet, document: &Definition, message: &Message) -> Vec<SoapUse> {
    let message_name = QName::new(&document.target_namespace, &message.name);
    let mut uses = Vec::new();

    for doc in &docs.documents {
        for binding in &doc.bindings {
            let port_type = docs.find_port_type(&binding.port_type);
            for operation_binding in &binding.operations {
                let operation = port_type.and_then(|(_, port_type)| {
                    port_type
                        .operations
                        .iter()
                        .find(|operation| operation.name == operation_binding.name)
                });

                let directions = [
                    (
                        operation_binding.input.as_ref(),
                        operation.and_then(|op| op.input.as_ref()),
                    ),
                    (
                        operation_binding.output.as_ref(),
                        operation.and_then(|op| op.output.as_ref()),
                    ),
                ];

                for (message_binding, operation_message) in directions {
                    let Some(message_binding) = message_binding else {
                        continue;
                    };

                    if let Some(body) = &message_binding.body {
                        let bound = operation_message
                            .and_then(|operation_message| operation_message.message.as_ref());
                        if bound == Some(&message_name) {
                            uses.push(body.use_);
                        }
                    }

                    for header in &message_binding.headers {
                        if header.message.as_ref() == Some(&message_name) {
                            uses.push(header.use_);
                        }
                    }
                }
            }
        }
    }

    uses
}

/// Index of the schema defining the element or type a part references.
fn defining_schema(schemas: &SchemaSet, element: Option<&QName>, ty: Option<&QName>) -> Option<usize> {
    if let Some(element) = element {
        return schemas.schemas.iter().position(|schema| {
            schema.target_namespace == element.namespace && schema.element(&element.name).is_some()
        });
    }
    if let Some(ty) = ty {
        if ty.namespace == XSD_NS {
            return None;
        }
        return schemas.schemas.iter().position(|schema| {
            schema.target_namespace == ty.namespace && schema.type_def(&ty.name).is_some()
        });
    }
    None
}

/// Transitive import/include closure at the namespace level, starting from
/// one schema.
fn closure(schemas: &SchemaSet, start: usize) -> HashSet<usize> {
    let mut reached = HashSet::new();
    let mut pending = vec![start];

    while let Some(index) = pending.pop() {
        if !reached.insert(index) {
            continue;
        }
        let mut imported_namespaces = schemas.schemas[index].imports.clone();
        // Sibling schemas sharing the namespace count as included content.
        imported_namespaces.push(schemas.schemas[index].target_namespace.clone());

        for (candidate, schema) in schemas.schemas.iter().enumerate() {
            if imported_namespaces
                .iter()
                .any(|namespace| *namespace == schema.target_namespace)
            {
                pending.push(candidate);
            }
        }
    }

    reached
}

/// Partitions the schema set into encoded and literal subsets by tracing
/// part → element/type → defining schema → import closure. Schemas never
/// reached by any part land in both subsets.
pub fn segregate(docs: &DocumentSet, diagnostics: &mut Diagnostics) -> SegregatedSchemas {
    let mut literal: HashSet<usize> = HashSet::new();
    let mut encoded: HashSet<usize> = HashSet::new();

    for document in &docs.documents {
        for message in &document.messages {
            let uses = find_uses(docs, document, message);
            if uses.is_empty() {
                continue;
            }

            let has_literal = uses.contains(&SoapUse::Literal);
            let has_encoded = uses.contains(&SoapUse::Encoded);
            if has_literal && has_encoded {
                diagnostics.warn(format!(
                    "Message {} is bound with both literal and encoded use; \
                     its schemas are placed in both subsets",
                    message.name
                ));
            }

            for part in &message.parts {
                let Some(start) = defining_schema(
                    &docs.schemas,
                    part.element.as_ref(),
                    part.type_name.as_ref(),
                ) else {
                    continue;
                };

                let reached = closure(&docs.schemas, start);
                if has_literal {
                    literal.extend(reached.iter().copied());
                }
                if has_encoded {
                    encoded.extend(reached.iter().copied());
                }
            }
        }
    }

    // Unreached schemas cannot be classified; guessing a side would break
    // whichever convention actually needs them.
    for index in 0..docs.schemas.schemas.len() {
        if !literal.contains(&index) && !encoded.contains(&index) {
            literal.insert(index);
            encoded.insert(index);
        }
    }

    debug!(
        total = docs.schemas.schemas.len(),
        literal = literal.len(),
        encoded = encoded.len(),
        "segregated schemas"
    );

    let pick = |bucket: &HashSet<usize>| {
        let mut set = SchemaSet::default();
        for (index, schema) in docs.schemas.schemas.iter().enumerate() {
            if bucket.contains(&index) {
                set.push(schema.clone());
            }
        }
        set
    };

    SegregatedSchemas {
        literal: pick(&literal),
        encoded: pick(&encoded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_wsdl::schema::{ElementDef, Schema};
    use wisp_wsdl::types::{
        Binding, MessageBinding, Operation, OperationBinding, OperationMessage, Part, PortType,
        SoapBodyBinding,
    };

    fn document() -> DocumentSet {
        let mut doc = Definition::new("urn:t");

        let mut schema_a = Schema::new("urn:a");
        schema_a.elements.push(ElementDef::new("Shared"));
        schema_a.add_import("urn:b");
        let schema_b = Schema::new("urn:b");
        let schema_orphan = Schema::new("urn:orphan");
        doc.schema.push(schema_a);
        doc.schema.push(schema_b);
        doc.schema.push(schema_orphan);

        let mut literal_message = Message::new("LiteralIn");
        literal_message
            .parts
            .push(Part::element("parameters", QName::new("urn:a", "Shared")));
        doc.messages.push(literal_message);

        let mut encoded_message = Message::new("EncodedIn");
        encoded_message
            .parts
            .push(Part::element("parameters", QName::new("urn:a", "Shared")));
        doc.messages.push(encoded_message);

        let mut port_type = PortType::new("Svc");
        for (operation, message) in [("LitOp", "LiteralIn"), ("EncOp", "EncodedIn")] {
            let mut op = Operation::new(operation);
            op.input = Some(OperationMessage {
                name: None,
                message: Some(QName::new("urn:t", message)),
                action: None,
            });
            port_type.operations.push(op);
        }
        doc.port_types.push(port_type);

        let mut binding = Binding::new("SvcSoap", QName::new("urn:t", "Svc"));
        for (operation, body) in [
            ("LitOp", SoapBodyBinding::literal()),
            ("EncOp", SoapBodyBinding::encoded()),
        ] {
            let mut op = OperationBinding::new(operation);
            op.input = Some(MessageBinding {
                body: Some(body),
                headers: Vec::new(),
            });
            binding.operations.push(op);
        }
        doc.bindings.push(binding);

        DocumentSet::new(vec![doc])
    }

    #[test]
    fn shared_schema_lands_in_both_buckets() {
        let docs = document();
        let mut diagnostics = Diagnostics::default();
        let segregated = segregate(&docs, &mut diagnostics);

        let in_bucket = |set: &SchemaSet, ns: &str| {
            set.schemas.iter().any(|schema| schema.target_namespace == ns)
        };
        assert!(in_bucket(&segregated.literal, "urn:a"));
        assert!(in_bucket(&segregated.encoded, "urn:a"));
        // Pulled in through the import closure.
        assert!(in_bucket(&segregated.literal, "urn:b"));
        assert!(in_bucket(&segregated.encoded, "urn:b"));
    }

    #[test]
    fn unreached_schema_lands_in_both_buckets() {
        let docs = document();
        let mut diagnostics = Diagnostics::default();
        let segregated = segregate(&docs, &mut diagnostics);

        let in_bucket = |set: &SchemaSet, ns: &str| {
            set.schemas.iter().any(|schema| schema.target_namespace == ns)
        };
        assert!(in_bucket(&segregated.literal, "urn:orphan"));
        assert!(in_bucket(&segregated.encoded, "urn:orphan"));
    }

    #[test]
    fn mixed_use_on_one_message_warns() {
        let mut docs = document();
        // Rebind the encoded operation onto the literal message.
        docs.documents[0].port_types[0].operations[1].input = Some(OperationMessage {
            name: None,
            message: Some(QName::new("urn:t", "LiteralIn")),
            action: None,
        });

        let mut diagnostics = Diagnostics::default();
        segregate(&docs, &mut diagnostics);
        assert_eq!(diagnostics.warnings().count(), 1);
    }
}
