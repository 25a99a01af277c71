//! Generate static files

use anyhow::Result;

use crate::generator::{GenerateReport, Generator};
use crate::Blog;

/// Generate the static site from the published content
pub async fn run(blog: &Blog) -> Result<GenerateReport> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog, blog.content_source()?)?;
    let report = generator.generate().await?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(report)
}
