//! Predicates for selecting documents.
//!
//! Only exact-match filtering is supported. "Everything" is a named value
//! ([`Filter::MatchAll`]) rather than an empty document literal.

use bson::{Bson, Document};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Selects every document in the collection.
    MatchAll,
    /// Selects documents whose top-level `field` equals `value`.
    FieldEq { field: &'static str, value: Bson },
}

impl Filter {
    pub fn field_eq(field: &'static str, value: impl Into<Bson>) -> Self {
        Self::FieldEq {
            field,
            value: value.into(),
        }
    }

    /// Render as a driver filter document.
    pub fn to_document(&self) -> Document {
        match self {
            Self::MatchAll => Document::new(),
            Self::FieldEq { field, value } => {
                let mut doc = Document::new();
                doc.insert(*field, value.clone());
                doc
            }
        }
    }

    /// Evaluate against a document without a server round trip.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::MatchAll => true,
            Self::FieldEq { field, value } => doc.get(*field) == Some(value),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchAll => f.write_str("all documents"),
            Self::FieldEq { field, value } => write!(f, "{} = {}", field, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn match_all_renders_empty_document() {
        assert!(Filter::MatchAll.to_document().is_empty());
        assert!(Filter::MatchAll.matches(&doc! { "anything": 1 }));
        assert!(Filter::MatchAll.matches(&Document::new()));
    }

    #[test]
    fn field_eq_is_exact() {
        let filter = Filter::field_eq("expenseID", "1d");
        assert_eq!(filter.to_document(), doc! { "expenseID": "1d" });

        assert!(filter.matches(&doc! { "expenseID": "1d", "title": "x" }));
        assert!(!filter.matches(&doc! { "expenseID": "1D" }));
        assert!(!filter.matches(&doc! { "expenseID": "1d " }));
        assert!(!filter.matches(&doc! { "title": "1d" }));
    }

    #[test]
    fn display_names_the_predicate() {
        assert_eq!(Filter::MatchAll.to_string(), "all documents");
        assert_eq!(
            Filter::field_eq("expenseID", "1d").to_string(),
            "expenseID = \"1d\""
        );
    }
}
