//! Helper functions for templates
//!
//! Date formatting in the site's fixed locale and URL building for
//! site-relative paths.

mod date;
mod url;

pub use date::*;
pub use url::*;
