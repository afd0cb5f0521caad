//! Ordered diagnostics channel shared by export and import sessions.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub is_warning: bool,
}

/// Ordered list of diagnostics. Identical entries are reported once per
/// session so a message shared by many operations does not flood the output.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Diagnostic {
            message: message.into(),
            is_warning: true,
        });
    }

    pub fn fatal(&mut self, message: impl Into<String>) {
        self.push(Diagnostic {
            message: message.into(),
            is_warning: false,
        });
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        if !self.entries.contains(&diagnostic) {
            self.entries.push(diagnostic);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|entry| entry.is_warning)
    }

    /// True when any non-warning entry was recorded.
    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|entry| !entry.is_warning)
    }
}
