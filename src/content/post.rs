//! Post documents as delivered by the content source

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::RichText;

/// A document fetched from the content source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Internal identifier, the reference used by `after` queries
    pub id: String,

    /// URL-friendly identifier
    #[serde(default)]
    pub uid: Option<String>,

    /// Custom type name
    #[serde(rename = "type", default)]
    pub doc_type: String,

    /// First publication date
    #[serde(default, deserialize_with = "publication_date")]
    pub first_publication_date: Option<DateTime<Utc>>,

    /// Last publication date
    #[serde(default, deserialize_with = "publication_date")]
    pub last_publication_date: Option<DateTime<Utc>>,

    /// Post fields
    #[serde(default)]
    pub data: PostData,
}

impl Document {
    /// Create a post document with the minimal fields set
    pub fn new(id: &str, uid: &str, doc_type: &str) -> Self {
        Self {
            id: id.to_string(),
            uid: Some(uid.to_string()),
            doc_type: doc_type.to_string(),
            first_publication_date: None,
            last_publication_date: None,
            data: PostData::default(),
        }
    }

    /// Post title
    pub fn title(&self) -> &str {
        &self.data.title
    }
}

/// Fields of a blog post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostData {
    pub title: String,
    pub subtitle: Option<String>,
    pub author: String,
    pub banner: Option<Banner>,
    pub content: Vec<Section>,
}

/// Banner image; an empty image field arrives as `{}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Banner {
    pub url: Option<String>,
    pub alt: Option<String>,
}

/// A titled block of rich text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Section {
    pub heading: String,
    pub body: RichText,
}

/// Accepts both RFC 3339 (`+00:00`) and the `+0000` offsets Prismic emits
fn publication_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z"))
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
    }
}
