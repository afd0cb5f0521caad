//! Collision-free WSDL message naming and the global element registry.

use std::collections::{HashMap, HashSet};

use wisp_contract::Direction;
use wisp_wsdl::schema::ElementDef;
use wisp_wsdl::types::QName;

use crate::error::Error;

/// Per-session naming state. Every message name, generated or explicit, is
/// claimed through here so one session never emits the same name twice.
#[derive(Debug, Default)]
pub struct NamingResolver {
    used_message_names: HashSet<String>,
    elements: HashMap<QName, (ElementDef, String)>,
}

impl NamingResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// `{PortType}_{Operation}_{Input|Output}[Callback]Message`, suffixed
    /// until unique.
    pub fn message_name(
        &mut self,
        port_type: &str,
        operation: &str,
        direction: Direction,
        callback: bool,
    ) -> Result<String, Error> {
        let direction = match direction {
            Direction::Input => "Input",
            Direction::Output => "Output",
        };
        let callback = if callback { "Callback" } else { "" };
        self.unique(format!(
            "{}_{}_{}{}Message",
            port_type, operation, direction, callback
        ))
    }

    /// Header message name derived from the already-assigned body message
    /// name.
    pub fn header_message_name(&mut self, body_message_name: &str) -> Result<String, Error> {
        self.unique(format!("{}_Headers", body_message_name))
    }

    pub fn fault_message_name(
        &mut self,
        port_type: &str,
        operation: &str,
        fault: &str,
    ) -> Result<String, Error> {
        self.unique(format!(
            "{}_{}_{}_FaultMessage",
            port_type, operation, fault
        ))
    }

    /// Claims an explicit message name chosen by the caller, still suffixed
    /// if the document already uses it.
    pub fn claim_message_name(&mut self, name: &str) -> Result<String, Error> {
        self.unique(name.to_owned())
    }

    fn unique(&mut self, base: String) -> Result<String, Error> {
        if self.used_message_names.insert(base.clone()) {
            return Ok(base);
        }
        for suffix in 2..=u64::MAX {
            let candidate = format!("{}{}", base, suffix);
            if self.used_message_names.insert(candidate.clone()) {
                return Ok(candidate);
            }
        }
        Err(Error::NameSuffixesExhausted { base })
    }

    /// Registers a global element under its QName for `operation`. Returns
    /// `true` when the element is new and must be added to the schema,
    /// `false` when an identical definition is already registered. Two
    /// structurally different definitions under one QName are a fatal
    /// collision.
    pub fn register_element(
        &mut self,
        qname: QName,
        element: &ElementDef,
        operation: &str,
    ) -> Result<bool, Error> {
        match self.elements.get(&qname) {
            None => {
                self.elements
                    .insert(qname, (element.clone(), operation.to_owned()));
                Ok(true)
            }
            Some((existing, _)) if existing == element => Ok(false),
            Some((_, owner)) => Err(Error::NamingCollision {
                qname,
                first_operation: owner.clone(),
                second_operation: operation.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_wsdl::schema::XSD_NS;

    #[test]
    fn message_names_get_integer_suffixes() {
        let mut naming = NamingResolver::new();
        let first = naming
            .message_name("Svc", "Op", Direction::Input, false)
            .unwrap();
        let second = naming
            .message_name("Svc", "Op", Direction::Input, false)
            .unwrap();
        let third = naming
            .message_name("Svc", "Op", Direction::Input, false)
            .unwrap();
        assert_eq!(first, "Svc_Op_InputMessage");
        assert_eq!(second, "Svc_Op_InputMessage2");
        assert_eq!(third, "Svc_Op_InputMessage3");
    }

    #[test]
    fn callback_message_name() {
        let mut naming = NamingResolver::new();
        let name = naming
            .message_name("Svc", "Notify", Direction::Output, true)
            .unwrap();
        assert_eq!(name, "Svc_Notify_OutputCallbackMessage");
    }

    #[test]
    fn header_name_derives_from_body_name() {
        let mut naming = NamingResolver::new();
        let body = naming
            .message_name("Svc", "Op", Direction::Input, false)
            .unwrap();
        let headers = naming.header_message_name(&body).unwrap();
        assert_eq!(headers, "Svc_Op_InputMessage_Headers");
    }

    #[test]
    fn identical_element_reregistration_is_allowed() {
        let mut naming = NamingResolver::new();
        let mut element = ElementDef::new("Foo");
        element.type_name = Some(QName::new(XSD_NS, "string"));

        let qname = QName::new("urn:t", "Foo");
        assert!(naming
            .register_element(qname.clone(), &element, "First")
            .unwrap());
        assert!(!naming
            .register_element(qname, &element, "Second")
            .unwrap());
    }

    #[test]
    fn conflicting_elements_are_fatal() {
        let mut naming = NamingResolver::new();
        let mut first = ElementDef::new("Foo");
        first.type_name = Some(QName::new(XSD_NS, "string"));
        let mut second = ElementDef::new("Foo");
        second.type_name = Some(QName::new(XSD_NS, "int"));

        let qname = QName::new("urn:t", "Foo");
        naming
            .register_element(qname.clone(), &first, "First")
            .unwrap();
        let error = naming
            .register_element(qname, &second, "Second")
            .unwrap_err();
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
}
