//! Inbound cookie jar
//!
//! Cookies are opaque: names and values are kept byte-for-byte (after
//! trimming the separator whitespace) and in arrival order.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts, HeaderMap},
};
use std::convert::Infallible;

/// Cookies carried by an inbound browser request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<(String, String)>,
}

impl CookieJar {
    /// Parse every `Cookie` header in `headers`
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut jar = Self::default();
        for value in headers.get_all(COOKIE) {
            // Headers with non-visible bytes cannot be forwarded as text
            if let Ok(raw) = value.to_str() {
                jar.extend_from_header(raw);
            }
        }
        jar
    }

    /// Parse a single `Cookie` header value (`a=1; b=2`)
    pub fn parse(raw: &str) -> Self {
        let mut jar = Self::default();
        jar.extend_from_header(raw);
        jar
    }

    fn extend_from_header(&mut self, raw: &str) {
        for pair in raw.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            self.cookies.push((name.to_string(), value.trim().to_string()));
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.push((name.into(), value.into()));
    }

    /// First cookie named `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// `Cookie` header carrying the whole jar, or `None` when empty
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// `Cookie` header carrying only the cookie named `name`
    pub fn named_header_value(&self, name: &str) -> Option<String> {
        self.get(name).map(|value| format!("{name}={value}"))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CookieJar
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
