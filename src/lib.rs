//! spacetraveling: a static blog generator backed by the Prismic CMS
//!
//! Posts are queried from a Prismic repository and rendered with embedded
//! Tera templates. A small server serves the generated site and renders
//! draft content on demand in preview mode.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod neighbors;
pub mod pagination;
pub mod prismic;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::generator::GenerateReport;
use crate::prismic::{ContentSource, PrismicClient};

/// The blog application
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets directory
    pub static_dir: PathBuf,
}

impl Blog {
    /// Create a new blog from a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env_overrides();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a blog from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Self {
            config,
            base_dir,
            public_dir,
            static_dir,
        }
    }

    /// Client for the configured Prismic repository
    pub fn content_source(&self) -> Result<Arc<dyn ContentSource>> {
        if self.config.prismic.endpoint.trim().is_empty() {
            anyhow::bail!(
                "No Prismic endpoint configured; set prismic.endpoint in _config.yml or {}",
                config::ENDPOINT_ENV
            );
        }
        Ok(Arc::new(PrismicClient::from_config(&self.config.prismic)?))
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<GenerateReport> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
