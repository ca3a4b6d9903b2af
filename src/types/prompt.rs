use super::message::{Content, Part, Role};

/// The parts of one outgoing user turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prompt {
    parts: Vec<Part>,
}

impl Prompt {
    /// Create a new empty prompt.
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Create a prompt with a single text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::text(text)],
        }
    }

    /// Add a text part.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::text(text));
        self
    }

    /// Add any part.
    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Get the parts.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Turn this prompt into a user content.
    pub fn into_content(self) -> Content {
        Content::new(Role::User, self.parts)
    }
}

impl From<&str> for Prompt {
    fn from(s: &str) -> Self {
        Prompt::text(s)
    }
}

impl From<String> for Prompt {
    fn from(s: String) -> Self {
        Prompt::text(s)
    }
}

impl From<Part> for Prompt {
    fn from(part: Part) -> Self {
        Prompt { parts: vec![part] }
    }
}

impl From<Vec<Part>> for Prompt {
    fn from(parts: Vec<Part>) -> Self {
        Prompt { parts }
    }
}
