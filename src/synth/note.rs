use std::fmt;
use std::sync::Arc;

/// Opaque, stable identity for a pitch as named by the caller ("C4", "F#4").
///
/// The engine never interprets the text; it is purely the key under which a
/// voice is registered. Backed by `Arc<str>` so the clones that travel
/// through the message queue and live inside voices are a pointer copy, not
/// a string copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(Arc<str>);

impl NoteId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NoteId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NoteId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
