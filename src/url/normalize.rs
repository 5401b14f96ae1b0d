use crate::UrlError;
use url::Url;

/// Normalizes a catalogue address so equal pages compare equal
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require HTTP or HTTPS
/// 3. Require a host (the `url` crate already lowercases it)
/// 4. Collapse repeated slashes in the path
/// 5. Remove fragment (everything after #)
/// 6. Remove empty query string (trailing ?)
///
/// The scheme, any trailing slash and the query string are kept as linked:
/// catalogue links are relative (`../../page-2.html`) and the result is the
/// address actually fetched.
///
/// # Examples
///
/// ```
/// use shelf_harvest::url::normalize_url;
///
/// let url = normalize_url("http://Books.Example/catalogue//page-2.html#top").unwrap();
/// assert_eq!(url.as_str(), "http://books.example/catalogue/page-2.html");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Same as [`normalize_url`] for an already parsed address
pub fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    let path = collapse_slashes(url.path());
    url.set_path(&path);

    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        out.push(c);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}
