//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::{ACCESS_TOKEN_ENV, ENDPOINT_ENV};

const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="239" height="27" viewBox="0 0 239 27">
  <text x="0" y="22" font-family="Inter, sans-serif" font-size="24" font-weight="700" fill="#F8F8F8">spacetraveling<tspan fill="#FF57B2">.</tspan></text>
</svg>
"##;

const STYLESHEET: &str = r#"* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: #1a1d23; color: #d7d7d7; font-family: Inter, sans-serif; }
a { color: inherit; text-decoration: none; }
.container { max-width: 720px; margin: 0 auto; padding: 0 1rem; }
.home-header, .header { padding: 5rem 0 4rem; }
.posts a { display: block; margin-bottom: 3rem; }
.posts strong { display: block; font-size: 1.75rem; color: #f8f8f8; }
.posts p { margin: 0.5rem 0 1.5rem; font-size: 1.125rem; }
.post-info { display: flex; gap: 1.5rem; font-size: 0.875rem; color: #bbbbbb; }
.load-more { background: none; border: 0; color: #ff57b2; font-size: 1.125rem; font-weight: 600; cursor: pointer; }
.load-more:disabled { opacity: 0.5; cursor: wait; }
.banner img { width: 100%; max-height: 400px; object-fit: cover; }
.post header { margin: 5rem 0 4rem; }
.post h1 { font-size: 3rem; color: #f8f8f8; margin-bottom: 1.5rem; }
.post .edited { margin-top: 1rem; font-style: italic; font-size: 0.875rem; }
.post section h2 { font-size: 2.25rem; color: #f8f8f8; margin: 4rem 0 2rem; }
.post-content p, .post-content ul, .post-content ol { line-height: 1.8; margin-bottom: 1.5rem; }
.post-content a { color: #ff57b2; }
.post-navigation { display: flex; justify-content: space-between; border-top: 1px solid #383e47; margin: 4rem 0; padding-top: 3rem; }
.post-navigation a { display: flex; flex-direction: column; }
.post-navigation .next { margin-left: auto; text-align: right; }
.post-navigation strong { color: #ff57b2; }
.exit-preview { position: fixed; bottom: 2rem; right: 2rem; }
.exit-preview a { display: block; background: #ff57b2; color: #fff; padding: 1rem 2rem; border-radius: 2rem; font-weight: 600; }
"#;

/// Initialize a new blog in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("static/css"))?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        tracing::warn!("{:?} already exists, leaving it untouched", config_path);
    } else {
        fs::write(&config_path, default_config())?;
    }

    fs::write(target_dir.join("static/logo.svg"), LOGO)?;
    fs::write(target_dir.join("static/css/style.css"), STYLESHEET)?;
    fs::write(target_dir.join(".gitignore"), "public/\n")?;

    Ok(())
}

fn default_config() -> String {
    format!(
        r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
language: pt-BR
timezone: America/Sao_Paulo

# URL
url: http://localhost:3000
root: /

# Directory
public_dir: public
static_dir: static

# Date / Time format (date-fns tokens)
date_format: dd MMM yyyy
datetime_format: "dd MMM yyyy, 'às' HH:mm"

# Content source
## {endpoint} and {token} override the values below
prismic:
  endpoint: https://your-repo.cdn.prismic.io/api/v2
  access_token:
  document_type: post
  page_size: 1
  orderings: "[document.first_publication_date desc]"

# Preview mode
preview:
  cookie_name: spacetraveling.preview
"#,
        endpoint = ENDPOINT_ENV,
        token = ACCESS_TOKEN_ENV
    )
}
