//! Generator module - renders the blog from the content source with the
//! built-in Tera templates

use anyhow::{Context as _, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tera::Context;
use walkdir::WalkDir;

use crate::content::{estimate_read_time, Document, HtmlSerializer, RichTextRenderer};
use crate::helpers::{edited_at, full_url_for, post_path, url_for, DateFormatter};
use crate::neighbors::{find_neighbors, Neighbors};
use crate::pagination::{Page, PageSource, PaginationState, PostPagination};
use crate::prismic::{public_cursor, ContentSource, Predicate, QueryOptions};
use crate::templates::{
    NavPost, PaginationData, PostCard, PostView, SectionView, SiteData, TemplateRenderer,
};
use crate::Blog;

/// Page size used when enumerating every post
const LISTING_PAGE_SIZE: u32 = 100;

/// Outcome of a full generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub posts: usize,
    pub skipped: usize,
}

/// Static site generator using Tera templates
pub struct Generator {
    blog: Blog,
    source: Arc<dyn ContentSource>,
    renderer: TemplateRenderer,
    rich_text: HtmlSerializer,
    dates: DateFormatter,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<Self> {
        let config = &blog.config;
        Ok(Self {
            blog: blog.clone(),
            source,
            renderer: TemplateRenderer::new()?,
            rich_text: HtmlSerializer::new(&config.root, &config.prismic.document_type),
            dates: DateFormatter::from_config(config)?,
        })
    }

    pub fn blog(&self) -> &Blog {
        &self.blog
    }

    pub fn source(&self) -> &dyn ContentSource {
        self.source.as_ref()
    }

    /// Generate the entire site from the published content
    pub async fn generate(&self) -> Result<GenerateReport> {
        fs::create_dir_all(&self.blog.public_dir)?;

        self.copy_static_assets()?;

        let first = self.home_page(None).await?;
        let follow_ups = self.write_home_pages(first.next_page.clone()).await?;
        let next_page = (follow_ups > 0).then(|| self.home_page_path(2));
        let home = self.render_home_page(&first.results, next_page, false)?;
        self.write_page("index.html", &home)?;

        let mut report = GenerateReport::default();
        for doc in self.list_posts(None).await? {
            let Some(uid) = doc.uid.as_deref().filter(|uid| !uid.is_empty()) else {
                tracing::warn!("Skipping document {} without uid", doc.id);
                report.skipped += 1;
                continue;
            };

            match self.render_post(uid, None, false).await? {
                Some(html) => {
                    self.write_page(&format!("post/{}/index.html", uid), &html)?;
                    report.posts += 1;
                }
                None => {
                    tracing::warn!("Post {} disappeared while generating, skipping", uid);
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            "Generated {} posts ({} skipped)",
            report.posts,
            report.skipped
        );
        Ok(report)
    }

    /// Every post of the configured type, following all pages
    pub async fn list_posts(&self, reference: Option<&str>) -> Result<Vec<Document>> {
        let doc_type = &self.blog.config.prismic.document_type;
        let options = QueryOptions::new()
            .with_ref(reference)
            .fetch([format!("{}.title", doc_type)])
            .page_size(LISTING_PAGE_SIZE)
            .orderings(&self.blog.config.prismic.orderings);

        let first = self
            .source
            .query(&[Predicate::document_type(doc_type)], &options)
            .await
            .context("Failed to list posts")?;

        let mut state = PaginationState::new(first);
        state
            .drain(self.source.as_ref())
            .await
            .context("Failed to load more posts")?;
        Ok(state.into_items())
    }

    /// First page of the home listing
    async fn home_page(&self, reference: Option<&str>) -> Result<PostPagination> {
        let prismic = &self.blog.config.prismic;
        let t = &prismic.document_type;
        let options = QueryOptions::new()
            .with_ref(reference)
            .fetch([
                format!("{}.title", t),
                format!("{}.subtitle", t),
                format!("{}.author", t),
            ])
            .page_size(prismic.page_size)
            .orderings(&prismic.orderings);

        let page = self
            .source
            .query(&[Predicate::document_type(t)], &options)
            .await
            .context("Failed to query the home page")?;
        Ok(page)
    }

    /// Write the home pages after the first as `page/<n>.json`, numbered
    /// from 2 and linked to each other instead of to the API; returns how
    /// many were written
    async fn write_home_pages(&self, mut cursor: Option<String>) -> Result<usize> {
        let mut seen = HashSet::new();
        let mut pages = Vec::new();
        while let Some(url) = cursor.take() {
            if !seen.insert(url.clone()) {
                tracing::warn!("Home listing returned a repeated cursor, stopping");
                break;
            }
            let page = self
                .source
                .fetch_page(&url)
                .await
                .context("Failed to load more posts")?;
            cursor = page.next_page.filter(|next| !next.is_empty());
            pages.push(page.results);
        }

        let count = pages.len();
        for (number, results) in (2..).zip(pages) {
            let next_page = (number <= count).then(|| self.home_page_path(number + 1));
            let page = Page::new(results, next_page.as_deref());
            let json = serde_json::to_string(&page)?;
            self.write_page(&format!("page/{}.json", number), &json)?;
        }
        Ok(count)
    }

    fn home_page_path(&self, number: usize) -> String {
        url_for(&self.blog.config.root, &format!("page/{}.json", number))
    }

    /// Render the home page against `reference`
    ///
    /// The load-more control follows the API cursor without the access
    /// token, so it only works in the browser when the API is public.
    pub async fn render_home(&self, reference: Option<&str>, preview: bool) -> Result<String> {
        let first = self.home_page(reference).await?;
        let next_page = first.next_page.as_deref().and_then(public_cursor);
        self.render_home_page(&first.results, next_page, preview)
    }

    fn render_home_page(
        &self,
        docs: &[Document],
        next_page: Option<String>,
        preview: bool,
    ) -> Result<String> {
        let config = &self.blog.config;
        let posts: Vec<PostCard> = docs.iter().map(|doc| self.post_card(doc)).collect();
        let pagination = PaginationData {
            next_page: next_page.filter(|next| !next.is_empty()),
            months: self.dates.month_abbreviations(),
            timezone: config.timezone.clone(),
            post_prefix: url_for(&config.root, "post/"),
        };

        let mut context = self.create_base_context(preview, "/");
        context.insert("page_title", "Home");
        context.insert("posts", &posts);
        context.insert("pagination", &pagination);

        self.renderer.render("index.html", &context)
    }

    /// Render the page of post `uid` against `reference`; `None` when no
    /// such post exists
    pub async fn render_post(
        &self,
        uid: &str,
        reference: Option<&str>,
        preview: bool,
    ) -> Result<Option<String>> {
        let doc_type = &self.blog.config.prismic.document_type;
        let options = QueryOptions::new().with_ref(reference);
        let Some(doc) = self
            .source
            .get_by_uid(doc_type, uid, &options)
            .await
            .with_context(|| format!("Failed to fetch post {}", uid))?
        else {
            return Ok(None);
        };

        let neighbors = find_neighbors(self.source.as_ref(), &doc, reference)
            .await
            .with_context(|| format!("Failed to resolve neighbors of {}", uid))?;

        let mut context = self.create_base_context(preview, &format!("post/{}/", uid));
        context.insert("page_title", doc.title());
        context.insert("post", &self.post_view(&doc));
        self.insert_navigation(&mut context, &neighbors);

        let html = self.renderer.render("post.html", &context)?;
        tracing::debug!("Rendered post {}", uid);
        Ok(Some(html))
    }

    /// Create a base context with common variables for the page at `path`
    fn create_base_context(&self, preview: bool, path: &str) -> Context {
        let config = &self.blog.config;
        let site = SiteData {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            root: config.root.clone(),
        };

        let mut context = Context::new();
        context.insert("site", &site);
        context.insert("preview", &preview);
        context.insert("canonical", &full_url_for(&config.url, &config.root, path));
        context
    }

    fn post_card(&self, doc: &Document) -> PostCard {
        let uid = doc.uid.clone().unwrap_or_default();
        PostCard {
            path: post_path(&self.blog.config.root, &uid),
            uid,
            title: doc.data.title.clone(),
            subtitle: doc.data.subtitle.clone().unwrap_or_default(),
            author: doc.data.author.clone(),
            published: self.published(doc),
        }
    }

    fn post_view(&self, doc: &Document) -> PostView {
        let banner = doc.data.banner.as_ref();
        let sections = doc
            .data
            .content
            .iter()
            .map(|section| SectionView {
                heading: section.heading.clone(),
                html: self.rich_text.as_html(&section.body),
            })
            .collect();

        PostView {
            title: doc.data.title.clone(),
            subtitle: doc.data.subtitle.clone().unwrap_or_default(),
            banner_url: banner.and_then(|b| b.url.clone()),
            banner_alt: banner
                .and_then(|b| b.alt.clone())
                .unwrap_or_else(|| "banner".to_string()),
            author: doc.data.author.clone(),
            published: self.published(doc),
            edited: edited_at(doc.first_publication_date, doc.last_publication_date)
                .map(|date| self.dates.datetime(&date)),
            read_time: estimate_read_time(&doc.data.content, &self.rich_text),
            sections,
        }
    }

    fn published(&self, doc: &Document) -> String {
        doc.first_publication_date
            .map(|date| self.dates.date(&date))
            .unwrap_or_default()
    }

    /// Insert prev/next links; absent neighbors are inserted as null
    fn insert_navigation(&self, context: &mut Context, neighbors: &Neighbors) {
        let root = &self.blog.config.root;
        let nav = |doc: &Document| {
            doc.uid.as_deref().map(|uid| NavPost {
                title: doc.data.title.clone(),
                path: post_path(root, uid),
            })
        };
        context.insert("prev_post", &neighbors.prev.as_ref().and_then(nav));
        context.insert("next_post", &neighbors.next.as_ref().and_then(nav));
    }

    /// Write a rendered page below the public directory
    fn write_page(&self, relative: &str, html: &str) -> Result<()> {
        let output_path = self.blog.public_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dir {:?}", parent))?;
        }
        fs::write(&output_path, html)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }

    /// Copy static assets (logo, stylesheets, images) to the public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            tracing::debug!("No static directory at {:?}", static_dir);
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || is_hidden(path) {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, dest))?;
        }

        Ok(())
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}
