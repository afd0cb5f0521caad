use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse provided URL")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unable to convert provided path")]
    PathConversionError(Option<std::io::Error>),

    #[error("Unable to open file")]
    FileOpenError(quick_xml::Error),

    #[error("Unable to get file from server")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Unsupported URL scheme {0}")]
    UnsupportedScheme(String),

    #[error("Error parsing XML input")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("Missing required attribute {attribute} on {element}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Invalid value {value} for attribute {attribute}")]
    InvalidAttribute {
        attribute: &'static str,
        value: String,
    },

    #[error("Unbound namespace prefix {0}")]
    UnboundPrefix(String),

    #[error("Document has no targetNamespace")]
    MissingTargetNamespace,

    #[error("Unexpected end tag")]
    UnbalancedDocument,

    #[error("External document reference requires a base URL")]
    NoBaseUrl,
}
