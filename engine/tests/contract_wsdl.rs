//! End-to-end scenarios over the export and import drivers, building
//! contracts and document sets programmatically.

use pretty_assertions::assert_eq;

use wisp_contract::{
    ContractDescription, Direction, MessageDescription, MessageHeaderDescription,
    MessagePartDescription, OperationDescription, Style, TypeRef,
};
use wisp_engine::error::Error;
use wisp_engine::{export_contract, import_contracts, ExportOptions, ImportOptions};
use wisp_wsdl::schema::XSD_NS;
use wisp_wsdl::types::{
    Binding, DocumentSet, Message, MessageBinding, Operation, OperationBinding, OperationMessage,
    Part, PortType, QName, SoapBinding, SoapBodyBinding, SoapStyle, SoapUse,
};

fn part(name: &str, namespace: &str, type_name: &str) -> MessagePartDescription {
    MessagePartDescription::new(name, namespace, TypeRef::named(XSD_NS, type_name))
}

fn wrapped_message(
    direction: Direction,
    wrapper: &str,
    namespace: &str,
    parts: Vec<MessagePartDescription>,
) -> MessageDescription {
    let mut message = MessageDescription::new(direction);
    message.body.wrapper_name = Some(wrapper.to_owned());
    message.body.wrapper_namespace = Some(namespace.to_owned());
    message.body.parts = parts;
    for (index, part) in message.body.parts.iter_mut().enumerate() {
        part.index = index;
    }
    message
}

fn operation(name: &str, messages: Vec<MessageDescription>) -> OperationDescription {
    let mut operation = OperationDescription::new(name);
    operation.messages = messages;
    operation
}

#[test]
fn wrapped_contract_survives_a_round_trip() {
    let namespace = "urn:calc";
    let mut reply = wrapped_message(Direction::Output, "AddResponse", namespace, Vec::new());
    reply.body.return_value = Some(part("AddResult", namespace, "string"));

    let mut contract = ContractDescription::new("Calculator", namespace);
    contract.operations.push(operation(
        "Add",
        vec![
            wrapped_message(
                Direction::Input,
                "Add",
                namespace,
                vec![part("name", namespace, "string"), part("age", namespace, "int")],
            ),
            reply,
        ],
    ));

    let exported = export_contract(&mut contract, &ExportOptions::default()).unwrap();
    assert!(exported.diagnostics.is_empty());
    assert_eq!(
        exported
            .document
            .messages
            .iter()
            .map(|message| message.name.as_str())
            .collect::<Vec<_>>(),
        vec!["Calculator_Add_InputMessage", "Calculator_Add_OutputMessage"],
    );

    let docs = DocumentSet::new(vec![exported.document]);
    let result = import_contracts(&docs, &ImportOptions::default());
    assert!(result.diagnostics.is_empty());

    let [imported] = result.contracts.as_slice() else {
        panic!("expected one contract, got {}", result.contracts.len());
    };
    assert_eq!(imported.name, "Calculator");
    assert_eq!(imported.namespace, namespace);

    let operation = &imported.operations[0];
    assert_eq!(operation.name, "Add");
    assert_eq!(operation.style, Style::Document);
    assert!(!operation.is_encoded);

    let request = operation.request().unwrap();
    assert_eq!(request.body.wrapper_name.as_deref(), Some("Add"));
    assert_eq!(request.body.wrapper_namespace.as_deref(), Some(namespace));
    assert_eq!(
        request
            .body
            .parts
            .iter()
            .map(|part| (part.name.as_str(), part.namespace.as_str()))
            .collect::<Vec<_>>(),
        vec![("name", namespace), ("age", namespace)],
    );
    assert_eq!(request.body.parts[1].ty, TypeRef::named(XSD_NS, "int"));

    let reply = operation.reply().unwrap();
    assert_eq!(reply.body.wrapper_name.as_deref(), Some("AddResponse"));
    assert!(reply.body.parts.is_empty());
    let returned = reply.body.return_value.as_ref().unwrap();
    assert_eq!(returned.name, "AddResult");
    assert_eq!(returned.ty, TypeRef::named(XSD_NS, "string"));
}

fn doc_with_wrapped_operation() -> DocumentSet {
    let namespace = "urn:svc";
    let mut doc = wisp_wsdl::types::Definition::new(namespace);

    let mut schema = wisp_wsdl::schema::Schema::new(namespace);
    schema.element_form_qualified = true;
    let mut wrapper = wisp_wsdl::schema::ElementDef::new("Ping");
    wrapper.inline_type = Some(wisp_wsdl::schema::SchemaType::Complex(
        wisp_wsdl::schema::ComplexType {
            particle: Some(wisp_wsdl::schema::Particle::Sequence(vec![
                wisp_wsdl::schema::SequenceItem::Element(wisp_wsdl::schema::LocalElement::named(
                    "text",
                    QName::new(XSD_NS, "string"),
                )),
            ])),
        },
    ));
    schema.elements.push(wrapper);
    doc.schema.push(schema);

    let mut message = Message::new("PingIn");
    message
        .parts
        .push(Part::element("parameters", QName::new(namespace, "Ping")));
    doc.messages.push(message);

    let mut port_type = PortType::new("Svc");
    let mut op = Operation::new("Ping");
    op.input = Some(OperationMessage {
        name: None,
        message: Some(QName::new(namespace, "PingIn")),
        action: None,
    });
    port_type.operations.push(op);
    doc.port_types.push(port_type);

    DocumentSet::new(vec![doc])
}

fn bind(docs: &mut DocumentSet, name: &str, style: SoapStyle, body: SoapBodyBinding) {
    let mut binding = Binding::new(name, QName::new("urn:svc", "Svc"));
    binding.soap = Some(SoapBinding {
        style: Some(style),
        transport: None,
    });
    let mut op = OperationBinding::new("Ping");
    op.input = Some(MessageBinding {
        body: Some(body),
        headers: Vec::new(),
    });
    binding.operations.push(op);
    docs.documents[0].bindings.push(binding);
}

#[test]
fn conflicting_bindings_fold_to_the_minimum_style() {
    let mut docs = doc_with_wrapped_operation();
    bind(&mut docs, "A", SoapStyle::Rpc, SoapBodyBinding::encoded());
    bind(&mut docs, "B", SoapStyle::Document, SoapBodyBinding::literal());

    let result = import_contracts(&docs, &ImportOptions::default());
    assert!(!result.diagnostics.has_errors());

    let conflicts = result
        .diagnostics
        .warnings()
        .filter(|warning| warning.message.contains("conflicting style/use"))
        .count();
    assert_eq!(conflicts, 1);

    let operation = &result.contracts[0].operations[0];
    assert_eq!(operation.style, Style::Document);
    assert!(!operation.is_encoded);
    assert_eq!(
        operation.request().unwrap().body.wrapper_name.as_deref(),
        Some("Ping")
    );
}

fn unwrapped_contract(ops: Vec<(&str, MessagePartDescription)>) -> ContractDescription {
    let mut contract = ContractDescription::new("Svc", "urn:svc");
    for (name, part) in ops {
        let mut message = MessageDescription::new(Direction::Input);
        message.body.parts.push(part);
        contract.operations.push(operation(name, vec![message]));
    }
    contract
}

#[test]
fn conflicting_global_elements_abort_the_export() {
    let mut contract = unwrapped_contract(vec![
        ("First", part("Echo", "urn:svc", "string")),
        ("Second", part("Echo", "urn:svc", "int")),
    ]);

    let error = export_contract(&mut contract, &ExportOptions::default()).unwrap_err();
    match error {
        Error::NamingCollision {
            first_operation,
            second_operation,
            ..
        } => {
            assert_eq!(first_operation, "First");
            assert_eq!(second_operation, "Second");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn identical_global_elements_are_emitted_once() {
    let mut contract = unwrapped_contract(vec![
        ("First", part("Echo", "urn:svc", "string")),
        ("Second", part("Echo", "urn:svc", "string")),
    ]);

    let exported = export_contract(&mut contract, &ExportOptions::default()).unwrap();
    assert!(exported.diagnostics.is_empty());

    let schema = exported
        .document
        .schema
        .schemas
        .iter()
        .find(|schema| schema.target_namespace == "urn:svc")
        .unwrap();
    assert_eq!(
        schema
            .elements
            .iter()
            .filter(|element| element.name == "Echo")
            .count(),
        1
    );
}

#[test]
fn explicit_message_names_get_integer_suffixes() {
    let mut contract = unwrapped_contract(vec![
        ("A", part("pa", "urn:svc", "string")),
        ("B", part("pb", "urn:svc", "string")),
        ("C", part("pc", "urn:svc", "string")),
    ]);
    for operation in &mut contract.operations {
        operation.messages[0].message_name = Some("Msg".to_owned());
    }

    let exported = export_contract(&mut contract, &ExportOptions::default()).unwrap();
    assert_eq!(
        exported
            .document
            .messages
            .iter()
            .map(|message| message.name.as_str())
            .collect::<Vec<_>>(),
        vec!["Msg", "Msg2", "Msg3"],
    );
}

#[test]
fn rpc_contract_imports_with_parameter_order_return() {
    let namespace = "urn:r";
    let mut doc = wisp_wsdl::types::Definition::new(namespace);

    let mut input = Message::new("AddIn");
    input.parts.push(Part::typed("a", QName::new(XSD_NS, "int")));
    input.parts.push(Part::typed("b", QName::new(XSD_NS, "int")));
    doc.messages.push(input);
    let mut output = Message::new("AddOut");
    output
        .parts
        .push(Part::typed("result", QName::new(XSD_NS, "int")));
    doc.messages.push(output);

    let mut port_type = PortType::new("Adder");
    let mut op = Operation::new("Add");
    op.parameter_order = Some(vec!["a".to_owned(), "b".to_owned()]);
    op.input = Some(OperationMessage {
        name: None,
        message: Some(QName::new(namespace, "AddIn")),
        action: None,
    });
    op.output = Some(OperationMessage {
        name: None,
        message: Some(QName::new(namespace, "AddOut")),
        action: None,
    });
    port_type.operations.push(op);
    doc.port_types.push(port_type);

    let mut binding = Binding::new("AdderSoap", QName::new(namespace, "Adder"));
    binding.soap = Some(SoapBinding {
        style: Some(SoapStyle::Rpc),
        transport: None,
    });
    let mut bound = OperationBinding::new("Add");
    let mut body = SoapBodyBinding::literal();
    body.namespace = Some("urn:rpc-wire".to_owned());
    bound.input = Some(MessageBinding {
        body: Some(body.clone()),
        headers: Vec::new(),
    });
    bound.output = Some(MessageBinding {
        body: Some(body),
        headers: Vec::new(),
    });
    binding.operations.push(bound);
    doc.bindings.push(binding);

    let docs = DocumentSet::new(vec![doc]);
    let result = import_contracts(&docs, &ImportOptions::default());
    assert!(!result.diagnostics.has_errors());

    let operation = &result.contracts[0].operations[0];
    assert_eq!(operation.style, Style::Rpc);

    let request = operation.request().unwrap();
    assert_eq!(request.body.wrapper_name.as_deref(), Some("Add"));
    assert_eq!(request.body.wrapper_namespace.as_deref(), Some("urn:rpc-wire"));
    assert_eq!(
        request
            .body
            .parts
            .iter()
            .map(|part| part.name.as_str())
            .collect::<Vec<_>>(),
        vec!["a", "b"],
    );

    let reply = operation.reply().unwrap();
    assert_eq!(reply.body.wrapper_name.as_deref(), Some("AddResponse"));
    let returned = reply.body.return_value.as_ref().unwrap();
    assert_eq!(returned.name, "result");
    assert_eq!(returned.ty, TypeRef::named(XSD_NS, "int"));
    assert!(reply.body.parts.is_empty());
}

#[test]
fn stream_bodies_survive_a_round_trip() {
    let namespace = "urn:files";
    let mut upload = MessageDescription::new(Direction::Input);
    upload.body.wrapper_name = Some("Upload".to_owned());
    upload.body.wrapper_namespace = Some(namespace.to_owned());
    upload
        .body
        .parts
        .push(MessagePartDescription::new("data", namespace, TypeRef::Stream));

    let mut contract = ContractDescription::new("FileService", namespace);
    contract
        .operations
        .push(operation("Upload", vec![upload]));

    let exported = export_contract(&mut contract, &ExportOptions::default()).unwrap();
    assert!(exported.diagnostics.is_empty());

    let docs = DocumentSet::new(vec![exported.document]);
    let result = import_contracts(&docs, &ImportOptions::default());
    assert!(result.diagnostics.is_empty());

    let request = result.contracts[0].operations[0].request().unwrap();
    assert_eq!(request.body.wrapper_name.as_deref(), Some("Upload"));
    assert_eq!(
        request
            .body
            .parts
            .iter()
            .map(|part| (part.name.as_str(), &part.ty))
            .collect::<Vec<_>>(),
        vec![("data", &TypeRef::Stream)],
    );
}

#[test]
fn literal_headers_survive_a_round_trip() {
    let namespace = "urn:auth";
    let mut request = wrapped_message(
        Direction::Input,
        "Login",
        namespace,
        vec![part("user", namespace, "string")],
    );
    request
        .headers
        .push(MessageHeaderDescription::new(part(
            "SessionToken",
            namespace,
            "string",
        )));

    let mut contract = ContractDescription::new("Gateway", namespace);
    contract.operations.push(operation("Login", vec![request]));

    let exported = export_contract(&mut contract, &ExportOptions::default()).unwrap();
    assert!(exported.diagnostics.is_empty());
    assert_eq!(
        exported
            .document
            .messages
            .iter()
            .map(|message| message.name.as_str())
            .collect::<Vec<_>>(),
        vec![
            "Gateway_Login_InputMessage",
            "Gateway_Login_InputMessage_Headers",
        ],
    );

    let input_binding = exported.document.bindings[0].operations[0]
        .input
        .as_ref()
        .unwrap();
    let [header_binding] = input_binding.headers.as_slice() else {
        panic!("expected one soap:header binding");
    };
    assert_eq!(
        header_binding.message,
        Some(QName::new(namespace, "Gateway_Login_InputMessage_Headers"))
    );
    assert_eq!(header_binding.part.as_deref(), Some("SessionToken"));
    assert_eq!(header_binding.use_, SoapUse::Literal);

    let docs = DocumentSet::new(vec![exported.document]);
    let result = import_contracts(&docs, &ImportOptions::default());
    assert!(result.diagnostics.is_empty());

    let request = result.contracts[0].operations[0].request().unwrap();
    let [header] = request.headers.as_slice() else {
        panic!("expected one imported header");
    };
    assert_eq!(header.part.name, "SessionToken");
    assert_eq!(header.part.namespace, namespace);
    assert_eq!(header.part.ty, TypeRef::named(XSD_NS, "string"));
}

#[test]
fn encoded_headers_follow_the_body_use() {
    let namespace = "urn:bank";
    let mut request = wrapped_message(
        Direction::Input,
        "Transfer",
        namespace,
        vec![part("amount", namespace, "int")],
    );
    request
        .headers
        .push(MessageHeaderDescription::new(part(
            "Credentials",
            namespace,
            "string",
        )));

    let mut contract = ContractDescription::new("Bank", namespace);
    let mut transfer = operation("Transfer", vec![request]);
    transfer.style = Style::Rpc;
    transfer.is_encoded = true;
    contract.operations.push(transfer);

    let exported = export_contract(&mut contract, &ExportOptions::default()).unwrap();
    assert!(exported.diagnostics.is_empty());

    let input_binding = exported.document.bindings[0].operations[0]
        .input
        .as_ref()
        .unwrap();
    let body = input_binding.body.as_ref().unwrap();
    assert_eq!(body.use_, SoapUse::Encoded);
    let [header_binding] = input_binding.headers.as_slice() else {
        panic!("expected one soap:header binding");
    };
    assert_eq!(header_binding.use_, body.use_);
    assert_eq!(header_binding.part.as_deref(), Some("Credentials"));
    assert_eq!(
        header_binding.message,
        Some(QName::new(namespace, "Bank_Transfer_InputMessage_Headers"))
    );

    let docs = DocumentSet::new(vec![exported.document]);
    let result = import_contracts(&docs, &ImportOptions::default());
    assert!(result.diagnostics.is_empty());

    let operation = &result.contracts[0].operations[0];
    assert_eq!(operation.style, Style::Rpc);
    assert!(operation.is_encoded);

    let request = operation.request().unwrap();
    let [header] = request.headers.as_slice() else {
        panic!("expected one imported header");
    };
    assert_eq!(header.part.name, "Credentials");
    assert_eq!(header.part.ty, TypeRef::named(XSD_NS, "string"));
}

#[test]
fn untyped_messages_survive_a_round_trip() {
    let mut body = MessageDescription::new(Direction::Input);
    body.body
        .parts
        .push(MessagePartDescription::new("body", "", TypeRef::AnyMessage));

    let mut contract = ContractDescription::new("Relay", "urn:relay");
    contract.operations.push(operation("Forward", vec![body]));

    let exported = export_contract(&mut contract, &ExportOptions::default()).unwrap();
    let docs = DocumentSet::new(vec![exported.document]);
    let result = import_contracts(&docs, &ImportOptions::default());
    assert!(result.diagnostics.is_empty());

    let request = result.contracts[0].operations[0].request().unwrap();
    assert!(request.is_untyped());
    assert_eq!(request.body.parts[0].ty, TypeRef::AnyMessage);
}
