//! Query predicates and options

use std::fmt;

/// Ordering by first publication, newest first
pub const NEWEST_FIRST: &str = "[document.first_publication_date desc]";

/// Ordering by first publication, oldest first
pub const OLDEST_FIRST: &str = "[document.first_publication_date]";

/// A query predicate: the field at `path` equals `value`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub path: String,
    pub value: String,
}

impl Predicate {
    pub fn at(path: &str, value: &str) -> Self {
        Self {
            path: path.to_string(),
            value: value.to_string(),
        }
    }

    /// Documents of a custom type
    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }

    pub fn document_id(id: &str) -> Self {
        Self::at("document.id", id)
    }

    /// Documents of `doc_type` with the given uid
    pub fn uid(doc_type: &str, uid: &str) -> Self {
        Self::at(&format!("my.{}.uid", doc_type), uid)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[at({}, {})]", self.path, quote(&self.value))
    }
}

/// The `q` parameter for a list of predicates
pub fn render_query(predicates: &[Predicate]) -> String {
    let parts: String = predicates.iter().map(|p| p.to_string()).collect();
    format!("[{}]", parts)
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Options of a query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Content snapshot; `None` is the published (master) snapshot
    pub reference: Option<String>,
    /// Fields to return, e.g. `post.title`; empty returns everything
    pub fetch: Vec<String>,
    pub page_size: Option<u32>,
    pub orderings: Option<String>,
    /// Only documents positioned after this document id
    pub after: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ref(mut self, reference: Option<&str>) -> Self {
        self.reference = reference.map(str::to_string);
        self
    }

    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn orderings(mut self, orderings: &str) -> Self {
        self.orderings = Some(orderings.to_string());
        self
    }

    pub fn after(mut self, id: &str) -> Self {
        self.after = Some(id.to_string());
        self
    }
}
