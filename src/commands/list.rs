//! List site content

use anyhow::Result;

use crate::generator::Generator;
use crate::helpers::{post_path, DateFormatter};
use crate::Blog;

/// List site content by type
pub async fn run(blog: &Blog, content_type: &str) -> Result<()> {
    match content_type {
        "post" | "posts" => {
            let generator = Generator::new(blog, blog.content_source()?)?;
            let dates = DateFormatter::from_config(&blog.config)?;
            let posts = generator.list_posts(None).await?;

            println!("Posts ({}):", posts.len());
            for post in posts {
                let published = post
                    .first_publication_date
                    .map(|date| dates.date(&date))
                    .unwrap_or_else(|| "-".to_string());
                let path = post
                    .uid
                    .as_deref()
                    .map(|uid| post_path(&blog.config.root, uid))
                    .unwrap_or_default();
                println!("  {} - {} [{}]", published, post.title(), path);
            }
        }
        "route" | "routes" => {
            let generator = Generator::new(blog, blog.content_source()?)?;
            let posts = generator.list_posts(None).await?;

            println!("Routes ({}):", posts.len() + 1);
            println!("  {}", blog.config.root);
            for uid in posts.iter().filter_map(|post| post.uid.as_deref()) {
                println!("  {}", post_path(&blog.config.root, uid));
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, route", content_type);
        }
    }

    Ok(())
}
