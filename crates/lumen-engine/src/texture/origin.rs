use std::fmt;

use ureq::http::Uri;

/// Web origin: scheme, host, and effective port.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Origin {
    scheme: String,
    host: String,
    port: u16,
}

impl Origin {
    /// Parses the origin of an absolute `http`/`https` URL.
    ///
    /// Returns `None` for relative URLs, other schemes, or unparsable input.
    pub fn parse(url: &str) -> Option<Self> {
        if !is_absolute(url) {
            return None;
        }
        let uri: Uri = url.parse().ok()?;
        let scheme = uri.scheme_str()?.to_ascii_lowercase();
        let default_port = default_port(&scheme)?;
        let host = uri.host()?.to_ascii_lowercase();
        let port = uri.port_u16().unwrap_or(default_port);

        Some(Self { scheme, host, port })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Origin {
    /// Serialized form used in the `Origin` request header.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if default_port(&self.scheme) != Some(self.port) {
            write!(f, ":{}", self.port)?;
        }
        Ok(())
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

fn is_absolute(url: &str) -> bool {
    url.contains("://")
}

/// Returns true when fetching `url` from a page at `page_origin` is a
/// cross-origin request.
///
/// Relative URLs are always same-origin, and so is anything that is not
/// `http`/`https`. With no page origin every network URL is cross-origin.
pub fn is_cross_origin(url: &str, page_origin: Option<&Origin>) -> bool {
    match Origin::parse(url) {
        None => false,
        Some(origin) => page_origin != Some(&origin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Origin {
        Origin::parse("https://example.com/index.html").unwrap()
    }

    #[test]
    fn parses_effective_port() {
        let o = Origin::parse("HTTPS://Example.com/a/b.png").unwrap();
        assert_eq!((o.scheme(), o.host(), o.port()), ("https", "example.com", 443));

        let o = Origin::parse("http://localhost:8080/x").unwrap();
        assert_eq!(o.port(), 8080);
        assert_eq!(o.to_string(), "http://localhost:8080");
        assert_eq!(page().to_string(), "https://example.com");
    }

    #[test]
    fn relative_and_local_urls_are_same_origin() {
        assert!(!is_cross_origin("images/star.jpg", Some(&page())));
        assert!(!is_cross_origin("/images/star.jpg", None));
        assert!(!is_cross_origin("file:///tmp/star.png", None));
    }

    #[test]
    fn default_port_matches_explicit_port() {
        assert!(!is_cross_origin("https://example.com:443/star.jpg", Some(&page())));
        assert!(is_cross_origin("http://example.com/star.jpg", Some(&page())));
    }

    #[test]
    fn foreign_host_is_cross_origin() {
        let url = "https://webglfundamentals.org/webgl/resources/star.jpg";
        assert!(is_cross_origin(url, Some(&page())));
        assert!(is_cross_origin(url, None));
    }
}
