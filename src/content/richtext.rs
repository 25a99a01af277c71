//! Structured text as delivered by Prismic, and its renderers

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::helpers::{post_path, url_for};

/// A structured-text field: an ordered list of blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(Vec<Block>);

impl RichText {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self(blocks)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.0
    }
}

/// One block of structured text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// `paragraph`, `heading1`..`heading6`, `preformatted`, `list-item`,
    /// `o-list-item`, `image` or `embed`
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub spans: Vec<Span>,

    /// Image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Image alt text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    /// Embed payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<Value>,
}

impl Block {
    /// A block of plain text
    pub fn text(kind: &str, text: &str) -> Self {
        Self {
            kind: kind.to_string(),
            text: text.to_string(),
            spans: Vec::new(),
            url: None,
            alt: None,
            oembed: None,
        }
    }

    pub fn paragraph(text: &str) -> Self {
        Self::text("paragraph", text)
    }
}

/// Inline formatting over a range of a block's text.
///
/// `start` and `end` are UTF-16 code unit offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    /// `strong`, `em`, `hyperlink` or `label`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Turns structured text into markup and into countable plain text
pub trait RichTextRenderer: Send + Sync {
    /// Render to HTML
    fn as_html(&self, text: &RichText) -> String;

    /// Render to plain text, one line per block
    fn as_text(&self, text: &RichText) -> String;
}

/// Default HTML renderer
#[derive(Debug, Clone)]
pub struct HtmlSerializer {
    root: String,
    document_type: String,
}

impl HtmlSerializer {
    /// `root` prefixes internal links; documents of `document_type` link to
    /// their post page
    pub fn new(root: &str, document_type: &str) -> Self {
        Self {
            root: root.to_string(),
            document_type: document_type.to_string(),
        }
    }

    fn render_block(&self, block: &Block, html: &mut String) {
        match block.kind.as_str() {
            "paragraph" => wrap(html, "p", &self.render_inline(block)),
            "preformatted" => wrap(html, "pre", &self.render_inline(block)),
            "list-item" | "o-list-item" => wrap(html, "li", &self.render_inline(block)),
            "image" => {
                let url = block.url.as_deref().unwrap_or_default();
                let alt = block.alt.as_deref().unwrap_or_default();
                html.push_str(&format!(
                    r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                    html_escape(url),
                    html_escape(alt)
                ));
            }
            "embed" => html.push_str(&render_embed(block.oembed.as_ref())),
            kind => match heading_level(kind) {
                Some(level) => wrap(html, &format!("h{}", level), &self.render_inline(block)),
                None => {
                    tracing::debug!("Unknown rich text block type: {}", kind);
                    wrap(html, "p", &self.render_inline(block));
                }
            },
        }
    }

    /// Render a block's text with its spans. Spans may overlap without
    /// nesting, so a span that closes inside another forces the outer ones
    /// to close and reopen around it.
    fn render_inline(&self, block: &Block) -> String {
        let mut spans: Vec<&Span> = block.spans.iter().filter(|s| s.end > s.start).collect();
        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut out = String::with_capacity(block.text.len());
        let mut open: Vec<&Span> = Vec::new();
        let mut next = 0;
        let mut pos = 0;

        for c in block.text.chars() {
            self.close_ended(pos, &mut open, &mut out);
            while next < spans.len() && spans[next].start <= pos {
                out.push_str(&self.open_tag(spans[next]));
                open.push(spans[next]);
                next += 1;
            }
            push_escaped(&mut out, c);
            pos += c.len_utf16();
        }

        for span in open.iter().rev() {
            out.push_str(close_tag(span));
        }
        out
    }

    fn close_ended<'a>(&self, pos: usize, open: &mut Vec<&'a Span>, out: &mut String) {
        let Some(first) = open.iter().position(|s| s.end <= pos) else {
            return;
        };
        let popped: Vec<&Span> = open.drain(first..).collect();
        for span in popped.iter().rev() {
            out.push_str(close_tag(span));
        }
        for span in popped {
            if span.end > pos {
                out.push_str(&self.open_tag(span));
                open.push(span);
            }
        }
    }

    fn open_tag(&self, span: &Span) -> String {
        match span.kind.as_str() {
            "strong" => "<strong>".to_string(),
            "em" => "<em>".to_string(),
            "hyperlink" => {
                let data = span.data.as_ref();
                let href = data.map(|d| self.resolve_href(d)).unwrap_or_default();
                let target = data
                    .and_then(|d| d.get("target"))
                    .and_then(Value::as_str)
                    .map(|t| format!(r#" target="{}" rel="noopener noreferrer""#, html_escape(t)))
                    .unwrap_or_default();
                format!(r#"<a href="{}"{}>"#, html_escape(&href), target)
            }
            "label" => {
                let label = span
                    .data
                    .as_ref()
                    .and_then(|d| d.get("label"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                format!(r#"<span class="{}">"#, html_escape(label))
            }
            _ => "<span>".to_string(),
        }
    }

    fn resolve_href(&self, data: &Value) -> String {
        let field = |name: &str| data.get(name).and_then(Value::as_str);
        match field("link_type") {
            Some("Document") => match (field("type"), field("uid")) {
                (Some(doc_type), Some(uid)) if doc_type == self.document_type => {
                    post_path(&self.root, uid)
                }
                _ => url_for(&self.root, "/"),
            },
            _ => field("url").unwrap_or_default().to_string(),
        }
    }
}

impl Default for HtmlSerializer {
    fn default() -> Self {
        Self::new("/", "post")
    }
}

impl RichTextRenderer for HtmlSerializer {
    fn as_html(&self, text: &RichText) -> String {
        let mut html = String::new();
        let mut list: Option<&str> = None;

        for block in text.blocks() {
            let wanted = match block.kind.as_str() {
                "list-item" => Some("ul"),
                "o-list-item" => Some("ol"),
                _ => None,
            };
            if wanted != list {
                if let Some(tag) = list {
                    html.push_str(&format!("</{}>", tag));
                }
                if let Some(tag) = wanted {
                    html.push_str(&format!("<{}>", tag));
                }
                list = wanted;
            }
            self.render_block(block, &mut html);
        }

        if let Some(tag) = list {
            html.push_str(&format!("</{}>", tag));
        }
        html
    }

    fn as_text(&self, text: &RichText) -> String {
        text.blocks()
            .iter()
            .map(|b| b.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn heading_level(kind: &str) -> Option<u8> {
    let level: u8 = kind.strip_prefix("heading")?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn wrap(html: &mut String, tag: &str, inner: &str) {
    html.push_str(&format!("<{tag}>{inner}</{tag}>"));
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        _ => "</span>",
    }
}

fn render_embed(oembed: Option<&Value>) -> String {
    let field = |name: &str| {
        oembed
            .and_then(|o| o.get(name))
            .and_then(Value::as_str)
            .unwrap_or_default()
    };
    format!(
        r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
        html_escape(field("embed_url")),
        html_escape(field("type")),
        html_escape(field("provider_name")),
        field("html")
    )
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        '\n' => out.push_str("<br />"),
        _ => out.push(c),
    }
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
