//! Built-in blog templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping stays on for `.html`
//! templates; rendered rich text and generated paths are marked `safe` in
//! the templates themselves.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

/// Template renderer with the embedded blog theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("blog/layout.html")),
            ("index.html", include_str!("blog/index.html")),
            ("post.html", include_str!("blog/post.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("blog/partials/header.html"),
            ),
            (
                "partials/exit_preview.html",
                include_str!("blog/partials/exit_preview.html"),
            ),
            (
                "partials/load_more.html",
                include_str!("blog/partials/load_more.html"),
            ),
        ])?;

        tera.register_filter("minutes", minutes_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: read time label, e.g. `4 min`
fn minutes_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let minutes = tera::try_get_value!("minutes", "value", usize, value);
    Ok(tera::Value::String(format!("{} min", minutes)))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub root: String,
}

/// A post as listed on the home page
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub published: String,
}

/// A post as rendered on its own page
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub subtitle: String,
    pub banner_url: Option<String>,
    pub banner_alt: String,
    pub author: String,
    pub published: String,
    /// Set only when the post changed after its first publication
    pub edited: Option<String>,
    pub read_time: usize,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub heading: String,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavPost {
    pub title: String,
    pub path: String,
}

/// State handed to the load-more control
#[derive(Debug, Clone, Serialize)]
pub struct PaginationData {
    pub next_page: Option<String>,
    /// Month abbreviations used to format dates of loaded posts
    pub months: Vec<String>,
    /// IANA zone the dates of loaded posts are shown in
    pub timezone: String,
    pub post_prefix: String,
}
