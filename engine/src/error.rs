use thiserror::Error;
use wisp_wsdl::types::QName;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Operation {operation} has a message with no message reference")]
    MissingMessageRef { operation: String },

    #[error("Message {0} was not found in the document set")]
    MessageNotFound(QName),

    #[error("Global element {0} was not found in the schema set")]
    ElementNotFound(QName),

    #[error("Type {0} was not found in the schema set")]
    TypeNotFound(QName),

    #[error(
        "Operations {first_operation} and {second_operation} publish different \
         definitions of global element {qname}"
    )]
    NamingCollision {
        qname: QName,
        first_operation: String,
        second_operation: String,
    },

    #[error("Part {part} has an anonymous type, which cannot be named in a type reference")]
    AnonymousType { part: String },

    #[error("Part {part} declares neither an element nor a type")]
    PartNeedsElementOrType { part: String },

    #[error("Bare type parts are not supported by the {strategy} strategy (part {part})")]
    BareTypeNotSupported {
        strategy: &'static str,
        part: String,
    },

    #[error("Encoded messages are not supported by the {strategy} strategy (operation {operation})")]
    EncodedNotSupported {
        strategy: &'static str,
        operation: String,
    },

    #[error("Operation {operation} combines document style with encoded use, which no strategy supports")]
    DocumentEncodedNotSupported { operation: String },

    #[error("Duplicate part name {part} in an rpc message")]
    DuplicateRpcPartName { part: String },

    #[error("Message {message} of operation {operation} was already exported in this session")]
    DuplicateExport { operation: String, message: String },

    #[error("Exhausted integer suffixes deriving a unique name from {base}")]
    NameSuffixesExhausted { base: String },

    #[error("Skipping {unit}: it depends on {dependency}, which already failed")]
    DependencyFailed { unit: String, dependency: String },
}
