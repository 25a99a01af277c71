//! HTTP client for the Prismic REST API v2

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;
use url::Url;

use super::query::render_query;
use super::{ContentSource, Predicate, QueryOptions, SourceError, SourceResult};
use crate::config::PrismicConfig;
use crate::content::Document;
use crate::pagination::{PageSource, PostPagination};

const USER_AGENT: &str = concat!("spacetraveling/", env!("CARGO_PKG_VERSION"));

/// Repository metadata returned by the API root
#[derive(Debug, Deserialize)]
struct ApiInfo {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(default)]
    is_master_ref: bool,
}

/// Preview session returned by a preview token URL
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewSession {
    main_document: Option<String>,
}

/// Prismic API client
pub struct PrismicClient {
    http: Client,
    endpoint: Url,
    access_token: Option<String>,
    /// Resolved once, on first use
    master_ref: OnceCell<String>,
}

impl PrismicClient {
    /// Create a client for an API endpoint such as
    /// `https://my-repo.cdn.prismic.io/api/v2`
    pub fn new(endpoint: &str, access_token: Option<String>) -> SourceResult<Self> {
        let endpoint = Url::parse(endpoint.trim_end_matches('/'))?;
        let http = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            endpoint,
            access_token: access_token.filter(|t| !t.is_empty()),
            master_ref: OnceCell::new(),
        })
    }

    pub fn from_config(config: &PrismicConfig) -> SourceResult<Self> {
        Self::new(&config.endpoint, config.access_token.clone())
    }

    /// Search URL for a query against `reference`
    pub fn search_url(
        &self,
        reference: &str,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> SourceResult<Url> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/documents/search", base))?;
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("ref", reference);
            if !predicates.is_empty() {
                params.append_pair("q", &render_query(predicates));
            }
            if let Some(size) = options.page_size {
                params.append_pair("pageSize", &size.to_string());
            }
            if let Some(orderings) = &options.orderings {
                params.append_pair("orderings", orderings);
            }
            if let Some(after) = &options.after {
                params.append_pair("after", after);
            }
            if !options.fetch.is_empty() {
                params.append_pair("fetch", &options.fetch.join(","));
            }
            if let Some(token) = &self.access_token {
                params.append_pair("access_token", token);
            }
        }
        Ok(url)
    }

    /// Ref of the published snapshot
    async fn master_ref(&self) -> SourceResult<&str> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let mut url = self.endpoint.clone();
                if let Some(token) = &self.access_token {
                    url.query_pairs_mut().append_pair("access_token", token);
                }
                let info: ApiInfo = self.get_json(url).await?;
                let master = info
                    .refs
                    .into_iter()
                    .find(|r| r.is_master_ref)
                    .ok_or(SourceError::MissingMasterRef)?;
                tracing::debug!("Master ref: {}", master.reference);
                Ok::<_, SourceError>(master.reference)
            })
            .await?;
        Ok(reference.as_str())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> SourceResult<T> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: redact(&url),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Preview tokens are URLs; only follow those on the repository's own
    /// domain
    fn is_trusted_preview(&self, token: &Url) -> bool {
        let (Some(host), Some(endpoint_host)) = (token.host_str(), self.endpoint.host_str()) else {
            return false;
        };
        let repository = endpoint_host.split('.').next().unwrap_or_default();
        token.scheme() == "https"
            && (host == endpoint_host
                || host == format!("{}.prismic.io", repository)
                || host.ends_with(&format!(".{}.prismic.io", repository)))
    }
}

#[async_trait]
impl PageSource<Document> for PrismicClient {
    async fn fetch_page(&self, cursor: &str) -> SourceResult<PostPagination> {
        self.get_json(Url::parse(cursor)?).await
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> SourceResult<PostPagination> {
        let reference = match options.reference.as_deref() {
            Some(reference) => reference,
            None => self.master_ref().await?,
        };
        let url = self.search_url(reference, predicates, options)?;
        tracing::debug!("Querying {}", render_query(predicates));
        self.get_json(url).await
    }

    async fn preview_document(&self, token: &str) -> SourceResult<Option<String>> {
        let url = Url::parse(token)?;
        if !self.is_trusted_preview(&url) {
            return Err(SourceError::UntrustedPreview(redact(&url)));
        }
        let session: PreviewSession = self.get_json(url).await?;
        Ok(session.main_document)
    }
}

/// URL without its query, safe to log
fn redact(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// A page cursor without the access token, fit to embed in a public page;
/// `None` when the cursor is not a URL
pub fn public_cursor(cursor: &str) -> Option<String> {
    let mut url = Url::parse(cursor).ok()?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "access_token")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn client(token: Option<&str>) -> PrismicClient {
        PrismicClient::new(
            "https://spacetraveling.cdn.prismic.io/api/v2/",
            token.map(str::to_string),
        )
        .unwrap()
    }

    fn params(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_search_url() {
        let options = QueryOptions::new()
            .fetch(["post.title", "post.author"])
            .page_size(1)
            .orderings("[document.first_publication_date desc]")
            .after("YFzb7h");
        let url = client(Some("secret"))
            .search_url("master-ref", &[Predicate::document_type("post")], &options)
            .unwrap();

        assert_eq!(
            url.path(),
            "/api/v2/documents/search"
        );
        assert_eq!(
            params(&url),
            vec![
                ("ref".to_string(), "master-ref".to_string()),
                ("q".to_string(), r#"[[at(document.type, "post")]]"#.to_string()),
                ("pageSize".to_string(), "1".to_string()),
                (
                    "orderings".to_string(),
                    "[document.first_publication_date desc]".to_string()
                ),
                ("after".to_string(), "YFzb7h".to_string()),
                ("fetch".to_string(), "post.title,post.author".to_string()),
                ("access_token".to_string(), "secret".to_string()),
            ]
        );
    }

    #[test]
    fn test_search_url_minimal() {
        let url = client(Some(""))
            .search_url("r", &[], &QueryOptions::default())
            .unwrap();
        assert_eq!(params(&url), vec![("ref".to_string(), "r".to_string())]);
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            PrismicClient::new("not a url", None),
            Err(SourceError::Url(_))
        ));
    }

    #[test]
    fn test_trusted_preview_hosts() {
        let client = client(None);
        let trusted = |s: &str| client.is_trusted_preview(&Url::parse(s).unwrap());

        assert!(trusted("https://spacetraveling.prismic.io/previews/abc?websitePreviewId=1"));
        assert!(trusted("https://spacetraveling.cdn.prismic.io/previews/abc"));
        assert!(!trusted("https://evil.example.com/previews/abc"));
        assert!(!trusted("https://other.prismic.io/previews/abc"));
        assert!(!trusted("http://spacetraveling.prismic.io/previews/abc"));
    }

    #[tokio::test]
    async fn test_untrusted_preview_is_rejected_without_fetching() {
        let result = client(None)
            .preview_document("https://127.0.0.1/internal")
            .await;
        assert!(matches!(result, Err(SourceError::UntrustedPreview(_))));
    }

    #[test]
    fn test_redact_drops_token() {
        let url = Url::parse("https://x.cdn.prismic.io/api/v2?access_token=secret").unwrap();
        assert_eq!(redact(&url), "https://x.cdn.prismic.io/api/v2");
    }

    #[test]
    fn test_public_cursor_drops_token() {
        let cursor = "https://x.cdn.prismic.io/api/v2/documents/search?ref=YF&access_token=secret&page=2&pageSize=1";
        assert_eq!(
            public_cursor(cursor).unwrap(),
            "https://x.cdn.prismic.io/api/v2/documents/search?ref=YF&page=2&pageSize=1"
        );
        assert_eq!(
            public_cursor("https://x.cdn.prismic.io/api/v2?access_token=secret").unwrap(),
            "https://x.cdn.prismic.io/api/v2"
        );
        assert!(public_cursor("page-2").is_none());
    }

    /// Serve `router` on a free local port and return the API endpoint
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/api/v2", addr)
    }

    /// API root publishing `master` as the master ref, counting its hits
    fn api_root(master: &'static str, hits: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            "/api/v2",
            get(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({
                        "refs": [
                            { "id": "draft", "ref": "draft-ref", "isMasterRef": false },
                            { "id": "master", "ref": master, "isMasterRef": true }
                        ]
                    }))
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_master_ref_is_resolved_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        // each result echoes the ref it was searched against
        let router = api_root("master-ref", hits.clone()).route(
            "/api/v2/documents/search",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(json!({
                    "results": [{ "id": params.get("ref"), "type": "post", "data": {} }],
                    "next_page": null
                }))
            }),
        );
        let client = PrismicClient::new(&serve(router).await, None).unwrap();
        let predicates = [Predicate::document_type("post")];

        for _ in 0..2 {
            let page = client
                .query(&predicates, &QueryOptions::new())
                .await
                .unwrap();
            assert_eq!(page.results[0].id, "master-ref");
            assert!(page.next_page.is_none());
        }
        let preview = client
            .query(&predicates, &QueryOptions::new().with_ref(Some("preview-ref")))
            .await
            .unwrap();
        assert_eq!(preview.results[0].id, "preview-ref");

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_master_ref() {
        let router = Router::new().route("/api/v2", get(|| async { Json(json!({ "refs": [] })) }));
        let client = PrismicClient::new(&serve(router).await, None).unwrap();

        let err = client
            .query(&[], &QueryOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::MissingMasterRef));
    }

    #[tokio::test]
    async fn test_error_status_is_reported_without_query() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = api_root("master-ref", hits).route(
            "/api/v2/documents/search",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let endpoint = serve(router).await;
        let client = PrismicClient::new(&endpoint, Some("SECRET123".to_string())).unwrap();

        let err = client
            .query(&[Predicate::document_type("post")], &QueryOptions::new())
            .await
            .unwrap_err();
        match err {
            SourceError::Status { url, status } => {
                assert_eq!(status, 500);
                assert_eq!(url, format!("{}/documents/search", endpoint));
                assert!(!url.contains("SECRET123"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_follows_cursor() {
        let router = Router::new()
            .route(
                "/api/v2/documents/search",
                get(|| async {
                    Json(json!({
                        "page": 2,
                        "total_pages": 3,
                        "results": [{
                            "id": "YF1",
                            "uid": "hooks",
                            "type": "post",
                            "first_publication_date": "2021-03-15T19:25:28+0000",
                            "data": { "title": "Como utilizar Hooks" }
                        }],
                        "next_page": "https://spacetraveling.cdn.prismic.io/api/v2/documents/search?page=3"
                    }))
                }),
            )
            .route("/api/v2/broken", get(|| async { "{\"results\": \"nope\"}" }));
        let endpoint = serve(router).await;
        let client = PrismicClient::new(&endpoint, None).unwrap();

        let page = client
            .fetch_page(&format!("{}/documents/search?ref=r&page=2", endpoint))
            .await
            .unwrap();
        assert_eq!(page.page, Some(2));
        assert_eq!(page.results[0].uid.as_deref(), Some("hooks"));
        assert!(page.next_page.unwrap().ends_with("page=3"));

        let err = client
            .fetch_page(&format!("{}/broken", endpoint))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));

        let err = client.fetch_page("not a cursor").await.unwrap_err();
        assert!(matches!(err, SourceError::Url(_)));
    }
}
