//! Previous/next post resolution
//!
//! Candidates come from two single-result queries restricted to documents
//! positioned `after` the target. That restriction follows the repository's
//! internal document order, not publication dates, so every candidate is
//! checked again chronologically before it is accepted:
//!
//! - the previous post must be published strictly before the target;
//! - the next post must be published strictly after the target.

use chrono::{DateTime, Utc};

use crate::content::Document;
use crate::prismic::{
    ContentSource, Predicate, QueryOptions, SourceResult, NEWEST_FIRST, OLDEST_FIRST,
};

/// Chronological neighbors of a post
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Neighbors {
    pub prev: Option<Document>,
    pub next: Option<Document>,
}

/// Keep the candidates that are really before/after `target`
pub fn resolve(
    target: Option<DateTime<Utc>>,
    prev: Option<Document>,
    next: Option<Document>,
) -> Neighbors {
    let Some(target) = target else {
        return Neighbors::default();
    };

    Neighbors {
        prev: prev.filter(|doc| doc.first_publication_date.is_some_and(|d| d < target)),
        next: next.filter(|doc| doc.first_publication_date.is_some_and(|d| d > target)),
    }
}

/// Query the candidates around `target` and resolve them
pub async fn find_neighbors<S>(
    source: &S,
    target: &Document,
    reference: Option<&str>,
) -> SourceResult<Neighbors>
where
    S: ContentSource + ?Sized,
{
    let predicates = [Predicate::document_type(&target.doc_type)];
    let candidate = |orderings: &str| {
        QueryOptions::new()
            .with_ref(reference)
            .fetch([format!("{}.title", target.doc_type)])
            .page_size(1)
            .orderings(orderings)
            .after(&target.id)
    };
    let prev_options = candidate(NEWEST_FIRST);
    let next_options = candidate(OLDEST_FIRST);

    let (prev, next) = tokio::try_join!(
        source.query(&predicates, &prev_options),
        source.query(&predicates, &next_options),
    )?;

    let neighbors = resolve(
        target.first_publication_date,
        prev.results.into_iter().next(),
        next.results.into_iter().next(),
    );
    tracing::debug!(
        "Neighbors of {}: prev={:?} next={:?}",
        target.id,
        neighbors.prev.as_ref().map(|d| &d.id),
        neighbors.next.as_ref().map(|d| &d.id)
    );
    Ok(neighbors)
}
