//! URL helper functions

/// Prefix a path with the site root
///
/// # Examples
/// ```ignore
/// url_for("/blog/", "/logo.svg") // -> "/blog/logo.svg"
/// ```
pub fn url_for(root: &str, path: &str) -> String {
    let root = root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for("https://example.com", "/", "/post/hello/") // -> "https://example.com/post/hello/"
/// ```
pub fn full_url_for(base_url: &str, root: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), url_for(root, path))
}

/// Path of a post page
pub fn post_path(root: &str, uid: &str) -> String {
    url_for(root, &format!("post/{}/", uid))
}

/// Resolve where a document lives on the site: posts of `post_type` get
/// their own page, anything else falls back to the home page
pub fn resolve_link(root: &str, post_type: &str, doc_type: &str, uid: Option<&str>) -> String {
    match uid {
        Some(uid) if doc_type == post_type && !uid.is_empty() => post_path(root, uid),
        _ => url_for(root, "/"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for() {
        assert_eq!(url_for("/", "/logo.svg"), "/logo.svg");
        assert_eq!(url_for("/blog/", "logo.svg"), "/blog/logo.svg");
        assert_eq!(url_for("/blog", "/"), "/blog/");
        assert_eq!(url_for("/", ""), "/");
    }

    #[test]
    fn test_full_url_for() {
        assert_eq!(
            full_url_for("https://example.com/", "/", "/post/a/"),
            "https://example.com/post/a/"
        );
    }

    #[test]
    fn test_resolve_link() {
        assert_eq!(resolve_link("/", "post", "post", Some("hello")), "/post/hello/");
        assert_eq!(resolve_link("/", "post", "page", Some("about")), "/");
        assert_eq!(resolve_link("/blog/", "post", "post", None), "/blog/");
    }
}
