//! Prismic content source
//!
//! The rest of the crate talks to the CMS only through [`ContentSource`]:
//! predicate queries, lookups by uid or id, cursor pages and preview
//! sessions. [`PrismicClient`] implements it over the REST API v2.

mod client;
mod error;
#[cfg(test)]
pub(crate) mod memory;
mod query;

use async_trait::async_trait;

pub use client::{public_cursor, PrismicClient};
pub use error::{SourceError, SourceResult};
pub use query::{render_query, Predicate, QueryOptions, NEWEST_FIRST, OLDEST_FIRST};

use crate::content::Document;
use crate::pagination::{PageSource, PostPagination};

/// Read access to a repository of documents
#[async_trait]
pub trait ContentSource: PageSource<Document> {
    /// Documents matching every predicate, one page at a time
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> SourceResult<PostPagination>;

    /// The document of the main preview session behind `token`, if any
    async fn preview_document(&self, token: &str) -> SourceResult<Option<String>>;

    /// A document of `doc_type` by uid
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        options: &QueryOptions,
    ) -> SourceResult<Option<Document>> {
        let options = QueryOptions {
            page_size: Some(1),
            after: None,
            ..options.clone()
        };
        let page = self.query(&[Predicate::uid(doc_type, uid)], &options).await?;
        Ok(page.results.into_iter().next())
    }

    /// A document by id
    async fn get_by_id(&self, id: &str, options: &QueryOptions) -> SourceResult<Option<Document>> {
        let options = QueryOptions {
            page_size: Some(1),
            after: None,
            ..options.clone()
        };
        let page = self.query(&[Predicate::document_id(id)], &options).await?;
        Ok(page.results.into_iter().next())
    }
}
