//! In-memory content source for tests
//!
//! Documents keep their insertion order as the repository's internal order,
//! which is what `after` refers to. Queries sort by first publication date
//! according to the orderings string. Follow-up pages of a query are served
//! from `memory://search/<type>/<page>/<size>/<asc|desc>` cursors, numbered
//! from 1.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{ContentSource, Predicate, QueryOptions, SourceError, SourceResult};
use crate::content::{Block, Document, RichText, Section};
use crate::pagination::{Page, PageSource, PostPagination};

pub(crate) struct MemorySource {
    documents: Vec<Document>,
    previews: HashMap<String, String>,
    access_token: Option<String>,
    queries: Mutex<Vec<QueryOptions>>,
}

impl MemorySource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            previews: HashMap::new(),
            access_token: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Carry `token` in every cursor, as an authenticated repository does
    pub fn with_access_token(mut self, token: &str) -> Self {
        self.access_token = Some(token.to_string());
        self
    }

    /// Make `token` a preview session pointing at `document_id`
    pub fn with_preview(mut self, token: &str, document_id: &str) -> Self {
        self.previews
            .insert(token.to_string(), document_id.to_string());
        self
    }

    /// Options of every query received so far
    pub fn queries(&self) -> Vec<QueryOptions> {
        self.queries.lock().unwrap().clone()
    }

    /// One page of `matching`, with the number of the following page
    fn slice(matching: Vec<&Document>, page: usize, size: usize) -> (Vec<Document>, Option<usize>) {
        let total = matching.len();
        let results = matching
            .into_iter()
            .skip((page - 1) * size)
            .take(size)
            .cloned()
            .collect();
        (results, (page * size < total).then_some(page + 1))
    }

    fn sorted<'a>(mut docs: Vec<&'a Document>, descending: bool) -> Vec<&'a Document> {
        docs.sort_by(|a, b| {
            let order = a.first_publication_date.cmp(&b.first_publication_date);
            if descending {
                order.reverse()
            } else {
                order
            }
        });
        docs
    }

    fn cursor_url(&self, doc_type: &str, page: usize, size: usize, order: &str) -> String {
        let url = format!("memory://search/{}/{}/{}/{}", doc_type, page, size, order);
        match &self.access_token {
            Some(token) => format!("{}?access_token={}", url, token),
            None => url,
        }
    }
}

fn matches(predicate: &Predicate, doc: &Document) -> bool {
    let field = match predicate.path.as_str() {
        "document.type" => Some(doc.doc_type.as_str()),
        "document.id" => Some(doc.id.as_str()),
        p if p.ends_with(".uid") => doc.uid.as_deref(),
        _ => None,
    };
    field == Some(predicate.value.as_str())
}

#[async_trait]
impl PageSource<Document> for MemorySource {
    async fn fetch_page(&self, cursor: &str) -> SourceResult<PostPagination> {
        let bad_cursor = || SourceError::Status {
            url: cursor.to_string(),
            status: 404,
        };
        let path = cursor.split('?').next().unwrap_or_default();
        let parts: Vec<&str> = path
            .strip_prefix("memory://search/")
            .ok_or_else(bad_cursor)?
            .split('/')
            .collect();
        let [doc_type, page, size, order] = parts[..] else {
            return Err(bad_cursor());
        };
        let page: usize = page
            .parse()
            .ok()
            .filter(|page| *page > 0)
            .ok_or_else(bad_cursor)?;
        let size: usize = size.parse().map_err(|_| bad_cursor())?;

        let matching = self
            .documents
            .iter()
            .filter(|d| d.doc_type == doc_type)
            .collect();
        let (results, next) = Self::slice(Self::sorted(matching, order == "desc"), page, size);
        let next_page = next.map(|next| self.cursor_url(doc_type, next, size, order));
        Ok(Page::new(results, next_page.as_deref()))
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> SourceResult<PostPagination> {
        self.queries.lock().unwrap().push(options.clone());

        let after = match &options.after {
            Some(id) => match self.documents.iter().position(|d| &d.id == id) {
                Some(index) => index + 1,
                None => self.documents.len(),
            },
            None => 0,
        };
        let matching: Vec<&Document> = self.documents[after..]
            .iter()
            .filter(|d| predicates.iter().all(|p| matches(p, d)))
            .collect();

        let descending = options
            .orderings
            .as_deref()
            .is_some_and(|o| o.contains("desc"));
        let size = options.page_size.unwrap_or(20) as usize;

        let doc_type = predicates
            .iter()
            .find(|p| p.path == "document.type")
            .map(|p| p.value.as_str())
            .unwrap_or_default();
        let order = if descending { "desc" } else { "asc" };

        let (results, next) = Self::slice(Self::sorted(matching, descending), 1, size);
        let next_page = next.map(|next| self.cursor_url(doc_type, next, size, order));
        Ok(Page::new(results, next_page.as_deref()))
    }

    async fn preview_document(&self, token: &str) -> SourceResult<Option<String>> {
        match self.previews.get(token) {
            Some(id) => Ok(Some(id.clone())),
            None => Err(SourceError::UntrustedPreview(token.to_string())),
        }
    }
}

/// A post with a one-paragraph body of `words` words
pub(crate) fn post(id: &str, uid: &str, published: &str, words: usize) -> Document {
    let mut doc = Document::new(id, uid, "post");
    doc.first_publication_date = Some(parse(published));
    doc.last_publication_date = doc.first_publication_date;
    doc.data.title = format!("Post {}", uid);
    doc.data.subtitle = Some(format!("About {}", uid));
    doc.data.author = "Joseph Oliveira".to_string();
    doc.data.content = vec![Section {
        heading: "Introdução".to_string(),
        body: RichText::new(vec![Block::paragraph(&vec!["palavra"; words].join(" "))]),
    }];
    doc
}

pub(crate) fn parse(date: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(date)
        .unwrap()
        .with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MemorySource {
        MemorySource::new(vec![
            post("a", "primeiro", "2021-03-15T19:25:28+0000", 10),
            post("b", "segundo", "2021-03-20T19:27:35+0000", 10),
        ])
    }

    #[tokio::test]
    async fn test_cursor_pages_start_at_one() {
        let source = source();
        let page = source
            .fetch_page("memory://search/post/2/1/desc")
            .await
            .unwrap();
        assert_eq!(page.results[0].id, "a");
        assert!(page.next_page.is_none());

        let err = source
            .fetch_page("memory://search/post/0/1/desc")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_cursor_carries_access_token() {
        let source = source().with_access_token("SECRET123");
        let options = QueryOptions::new().page_size(1).orderings("desc");
        let first = source
            .query(&[Predicate::document_type("post")], &options)
            .await
            .unwrap();
        let cursor = first.next_page.unwrap();
        assert_eq!(cursor, "memory://search/post/2/1/desc?access_token=SECRET123");

        let second = source.fetch_page(&cursor).await.unwrap();
        assert_eq!(second.results[0].id, "a");
    }
}
