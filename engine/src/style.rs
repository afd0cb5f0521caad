//! Style/use resolution for one operation across every binding that
//! references it.

use tracing::debug;
use wisp_contract::Style;
use wisp_wsdl::types::{
    Binding, DocumentSet, MessageBinding, Operation, OperationBinding, OperationMessage,
    SoapStyle, SoapUse,
};

use crate::diag::Diagnostics;

/// The four style/use combinations, ordered by preference. When several
/// bindings disagree, the minimum combination wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StyleAndUse {
    DocumentLiteral,
    RpcLiteral,
    RpcEncoded,
    DocumentEncoded,
}

impl StyleAndUse {
    pub fn new(style: SoapStyle, use_: SoapUse) -> Self {
        match (style, use_) {
            (SoapStyle::Document, SoapUse::Literal) => StyleAndUse::DocumentLiteral,
            (SoapStyle::Rpc, SoapUse::Literal) => StyleAndUse::RpcLiteral,
            (SoapStyle::Rpc, SoapUse::Encoded) => StyleAndUse::RpcEncoded,
            (SoapStyle::Document, SoapUse::Encoded) => StyleAndUse::DocumentEncoded,
        }
    }

    pub fn style(self) -> Style {
        match self {
            StyleAndUse::DocumentLiteral | StyleAndUse::DocumentEncoded => Style::Document,
            StyleAndUse::RpcLiteral | StyleAndUse::RpcEncoded => Style::Rpc,
        }
    }

    pub fn is_encoded(self) -> bool {
        matches!(self, StyleAndUse::RpcEncoded | StyleAndUse::DocumentEncoded)
    }
}

/// Resolution output consumed by the shape classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationInfo {
    pub style_use: StyleAndUse,
    /// Every message of the operation follows the wrapped convention.
    pub all_wrapped: bool,
}

impl OperationInfo {
    pub fn style(&self) -> Style {
        self.style_use.style()
    }

    pub fn is_encoded(&self) -> bool {
        self.style_use.is_encoded()
    }
}

/// All `use` values appearing in one message binding's body and headers.
fn message_binding_uses(binding: &MessageBinding, uses: &mut Vec<SoapUse>) {
    if let Some(body) = &binding.body {
        uses.push(body.use_);
    }
    for header in &binding.headers {
        uses.push(header.use_);
    }
}

/// The style/use one binding operation declares, scanning its body, header
/// and fault sub-bindings. Disagreement between sub-bindings is reported but
/// the first use found still stands.
fn binding_style_use(
    binding: &Binding,
    operation: &OperationBinding,
    diagnostics: &mut Diagnostics,
) -> StyleAndUse {
    let mut uses = Vec::new();
    if let Some(input) = &operation.input {
        message_binding_uses(input, &mut uses);
    }
    if let Some(output) = &operation.output {
        message_binding_uses(output, &mut uses);
    }
    for fault in &operation.faults {
        if let Some(soap_fault) = &fault.soap_fault {
            uses.push(soap_fault.use_);
        }
    }

    let use_ = uses.first().copied().unwrap_or(SoapUse::Literal);
    if uses.iter().any(|candidate| *candidate != use_) {
        diagnostics.warn(format!(
            "Binding {} declares conflicting uses for operation {}; using the first",
            binding.name, operation.name
        ));
    }

    let style = operation
        .soap_operation
        .as_ref()
        .and_then(|soap| soap.style)
        .or_else(|| binding.default_style())
        .unwrap_or(SoapStyle::Document);

    StyleAndUse::new(style, use_)
}

/// Style implied by the unbound message shapes: an element part implies
/// document, a bare type part implies rpc.
fn shape_style(docs: &DocumentSet, operation: &Operation) -> Option<SoapStyle> {
    let messages = [&operation.input, &operation.output];
    for message in messages.into_iter().flatten() {
        let Some(name) = &message.message else { continue };
        let Some(message) = docs.find_message(name) else { continue };
        for part in &message.parts {
            if part.element.is_some() {
                return Some(SoapStyle::Document);
            }
            if part.type_name.is_some() {
                return Some(SoapStyle::Rpc);
            }
        }
    }
    None
}

fn message_is_wrapped(docs: &DocumentSet, message: &Option<OperationMessage>) -> bool {
    let Some(message) = message else { return true };
    let Some(name) = &message.message else { return false };
    let Some(message) = docs.find_message(name) else { return false };
    match message.parts.as_slice() {
        [part] => part.name == "parameters" && part.element.is_some(),
        _ => false,
    }
}

/// Resolves the final style/use for one operation, folding the minimum over
/// every binding that references it and reconciling with the shape-derived
/// style.
pub fn resolve_operation(
    docs: &DocumentSet,
    operation: &Operation,
    bindings: &[(&Binding, &OperationBinding)],
    diagnostics: &mut Diagnostics,
) -> OperationInfo {
    let mut resolved: Option<StyleAndUse> = None;

    for (binding, operation_binding) in bindings {
        let candidate = binding_style_use(binding, operation_binding, diagnostics);
        match resolved {
            None => resolved = Some(candidate),
            Some(current) if candidate != current => {
                diagnostics.warn(format!(
                    "Operation {} is bound with conflicting style/use combinations; \
                     using {:?}",
                    operation.name,
                    current.min(candidate)
                ));
                resolved = Some(current.min(candidate));
            }
            Some(_) => (),
        }
    }

    let from_shape = shape_style(docs, operation);
    let style_use = match resolved {
        Some(style_use) => {
            if style_use.style() == Style::Rpc && from_shape == Some(SoapStyle::Document) {
                diagnostics.warn(format!(
                    "Operation {} is bound rpc but its message shapes are document-style",
                    operation.name
                ));
            }
            style_use
        }
        None => match from_shape {
            Some(SoapStyle::Rpc) => StyleAndUse::RpcLiteral,
            _ => StyleAndUse::DocumentLiteral,
        },
    };

    let all_wrapped = style_use.style() == Style::Document
        && message_is_wrapped(docs, &operation.input)
        && message_is_wrapped(docs, &operation.output);

    debug!(
        operation = %operation.name,
        ?style_use,
        all_wrapped,
        "resolved operation style"
    );

    OperationInfo {
        style_use,
        all_wrapped,
    }
}
