use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ID: &str = "id";
pub const TITLE: &str = "title";
pub const AUTHOR: &str = "author";
pub const CONTENT: &str = "content";

/// Fields that are analyzed into the index. Any other field is stored only.
pub const INDEXED_FIELDS: [&str; 3] = [TITLE, AUTHOR, CONTENT];

/// A collection record. Missing fields read as empty text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: BTreeMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), fields: BTreeMap::new() }
    }

    pub fn with_field(mut self, name: &str, text: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), text.into());
        self
    }

    pub fn field(&self, name: &str) -> &str {
        if name == ID {
            return &self.id;
        }
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn title(&self) -> &str { self.field(TITLE) }

    pub fn content(&self) -> &str { self.field(CONTENT) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_reads_empty() {
        let doc = Document::new("7").with_field(TITLE, "shock waves");
        assert_eq!(doc.title(), "shock waves");
        assert_eq!(doc.field(AUTHOR), "");
        assert_eq!(doc.field(ID), "7");
    }
}
