use std::fmt;

use reqwest::Method;

/// Identity of a cacheable request: method, canonical URL, credential.
///
/// Requests made with different credentials never share entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(method: &Method, url: &str, token: Option<&str>) -> Self {
        Self(format!("{}::{}::{}", method, url, token.unwrap_or("anonymous")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keys embed bearer tokens; only the request part is safe to log.
        let visible = match self.0.rfind("::") {
            Some(idx) => &self.0[..idx],
            None => self.0.as_str(),
        };
        f.write_str(visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_request_same_key() {
        let a = CacheKey::new(&Method::GET, "http://h/api/x?a=1", Some("tok"));
        let b = CacheKey::new(&Method::GET, "http://h/api/x?a=1", Some("tok"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_credentials_partition_keys() {
        let a = CacheKey::new(&Method::GET, "http://h/api/x", Some("alice"));
        let b = CacheKey::new(&Method::GET, "http://h/api/x", Some("bob"));
        let anon = CacheKey::new(&Method::GET, "http://h/api/x", None);
        assert_ne!(a, b);
        assert_ne!(a, anon);
        assert_eq!(anon.as_str(), "GET::http://h/api/x::anonymous");
    }

    #[test]
    fn test_display_hides_token() {
        let key = CacheKey::new(&Method::GET, "http://h/api/x", Some("secret-token"));
        assert_eq!(key.to_string(), "GET::http://h/api/x");
    }
}
