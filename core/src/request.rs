use std::mem;

use http::header::HeaderName;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use percent_encoding::percent_decode_str;
use percent_encoding::percent_encode;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

use crate::{Error, Result};

/// Characters left as-is when encoding canonical query keys and values.
///
/// Unreserved characters from RFC 3986 plus `/`.
pub const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Signing context for request.
///
/// The URI itself is never rewritten: the query that gets signed is the
/// query that goes on the wire.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP path, exactly as it appears in the URI.
    pub path: String,
    /// Raw query string without the leading `?`, if any.
    pub query: Option<String>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from http::request::Parts.
    pub fn build(parts: &mut http::request::Parts) -> Result<Self> {
        if parts.uri.authority().is_none() {
            return Err(Error::request_invalid(
                "request without authority is invalid for signing",
            ));
        }

        Ok(SigningRequest {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),

            // Take the headers out of the request to avoid copy.
            // We will return it back when apply the context.
            headers: mem::take(&mut parts.headers),
        })
    }

    /// Apply the signing context back to http::request::Parts.
    pub fn apply(mut self, parts: &mut http::request::Parts) -> Result<()> {
        mem::swap(&mut parts.headers, &mut self.headers);
        Ok(())
    }

    /// Query pairs parsed strictly, in their original order.
    pub fn query_pairs(&self) -> Result<Vec<(String, String)>> {
        match self.query.as_deref() {
            Some(q) => parse_query_strict(q),
            None => Ok(Vec::new()),
        }
    }

    /// Canonical query string of this request.
    pub fn canonical_query(&self) -> Result<String> {
        match self.query.as_deref() {
            Some(q) => canonicalize_query(q),
            None => Ok(String::new()),
        }
    }

    /// Insert a header whose value must not show up in debug output.
    pub fn header_insert_sensitive(&mut self, name: HeaderName, value: &str) -> Result<()> {
        let mut value = HeaderValue::from_str(value)?;
        value.set_sensitive(true);
        self.headers.insert(name, value);
        Ok(())
    }
}

/// Split a query string into raw `(key, value)` fields.
///
/// Fields are separated by `&` or `;`. Every field must contain `=`, so both
/// `a` and the empty field in `a=1&&b=2` are errors.
fn split_query_strict(query: &str) -> Result<Vec<(&str, &str)>> {
    if query.is_empty() {
        return Ok(Vec::new());
    }

    query
        .split(|c: char| c == '&' || c == ';')
        .map(|field| {
            field.split_once('=').ok_or_else(|| {
                Error::request_invalid(format!(
                    "malformed query string {query:?}: bad field {field:?}"
                ))
            })
        })
        .collect()
}

/// Percent-decode a query component to raw bytes, `+` decodes to a space.
fn decode_query_component(s: &str) -> Vec<u8> {
    let s = s.replace('+', " ");
    percent_decode_str(&s).collect()
}

/// Parse a query string, keeping blank values and rejecting malformed fields.
///
/// Keys and values are percent-decoded, `+` decodes to a space. Invalid
/// UTF-8 is replaced, use [`canonicalize_query`] when the exact bytes matter.
pub fn parse_query_strict(query: &str) -> Result<Vec<(String, String)>> {
    Ok(split_query_strict(query)?
        .into_iter()
        .map(|(k, v)| {
            (
                String::from_utf8_lossy(&decode_query_component(k)).into_owned(),
                String::from_utf8_lossy(&decode_query_component(v)).into_owned(),
            )
        })
        .collect())
}

/// Build the canonical query string used for signing.
///
/// Each key and value is decoded to bytes and percent-encoded again, then
/// pairs are stable-sorted by encoded key, so repeated keys keep their
/// relative order. Bytes that are not UTF-8 survive as is.
///
/// ```
/// use apisign_core::canonicalize_query;
///
/// assert_eq!(canonicalize_query("b=2&a=1").unwrap(), "a=1&b=2");
/// assert_eq!(canonicalize_query("x=").unwrap(), "x=");
/// ```
pub fn canonicalize_query(query: &str) -> Result<String> {
    let mut pairs: Vec<(String, String)> = split_query_strict(query)?
        .into_iter()
        .map(|(k, v)| {
            (
                percent_encode(&decode_query_component(k), QUERY_ENCODE_SET).to_string(),
                percent_encode(&decode_query_component(v), QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("", ""; "empty")]
    #[test_case("b=2&a=1", "a=1&b=2"; "sorted by key")]
    #[test_case("x=", "x="; "blank value kept")]
    #[test_case("x=&a=1", "a=1&x="; "blank value sorted")]
    #[test_case("b=1&a=2&b=0", "a=2&b=1&b=0"; "stable for equal keys")]
    #[test_case("q=hello+world", "q=hello%20world"; "plus is space")]
    #[test_case("path=/a/b~c", "path=/a/b~c"; "unreserved kept")]
    #[test_case("k%20y=v%26w", "k%20y=v%26w"; "reencoded")]
    #[test_case("a=1;b=2", "a=1&b=2"; "semicolon separator")]
    #[test_case("e=a=b", "e=a%3Db"; "value with equals")]
    #[test_case("name=%C3%A9t%C3%A9", "name=%C3%A9t%C3%A9"; "utf8 value")]
    #[test_case("x=%FF", "x=%FF"; "non utf8 value kept")]
    #[test_case("%FE=1", "%FE=1"; "non utf8 key kept")]
    fn test_canonicalize_query(input: &str, expected: &str) {
        assert_eq!(canonicalize_query(input).unwrap(), expected);
    }

    #[test]
    fn test_canonicalize_query_distinguishes_non_utf8_bytes() {
        assert_ne!(
            canonicalize_query("x=%FF").unwrap(),
            canonicalize_query("x=%FE").unwrap()
        );
        assert_eq!(
            parse_query_strict("x=%FF").unwrap(),
            vec![("x".to_string(), "\u{FFFD}".to_string())]
        );
    }

    #[test_case("a"; "missing equals")]
    #[test_case("a=1&&b=2"; "empty field")]
    #[test_case("a=1&"; "trailing separator")]
    fn test_canonicalize_query_rejects_malformed(input: &str) {
        let err = canonicalize_query(input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    }

    #[test]
    fn test_build_keeps_path_and_query() -> Result<()> {
        let req = http::Request::get("https://api.example.com/api/v1/things/?b=2&a=1&x=")
            .header("x-custom", "value")
            .body(())?;
        let (mut parts, _) = req.into_parts();

        let mut sr = SigningRequest::build(&mut parts)?;
        assert_eq!(sr.method, Method::GET);
        assert_eq!(sr.path, "/api/v1/things/");
        assert_eq!(sr.query.as_deref(), Some("b=2&a=1&x="));
        assert_eq!(
            sr.query_pairs()?,
            vec![
                ("b".to_string(), "2".to_string()),
                ("a".to_string(), "1".to_string()),
                ("x".to_string(), "".to_string()),
            ]
        );
        assert_eq!(sr.canonical_query()?, "a=1&b=2&x=");
        assert!(parts.headers.is_empty());

        sr.header_insert_sensitive(HeaderName::from_static("x-secret"), "s3cr3t")?;
        sr.apply(&mut parts)?;

        assert_eq!(parts.headers["x-custom"], "value");
        assert!(parts.headers["x-secret"].is_sensitive());
        assert_eq!(
            parts.uri.to_string(),
            "https://api.example.com/api/v1/things/?b=2&a=1&x="
        );
        Ok(())
    }

    #[test]
    fn test_build_requires_authority() -> Result<()> {
        let (mut parts, _) = http::Request::get("/relative").body(())?.into_parts();
        let err = SigningRequest::build(&mut parts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestInvalid);
        Ok(())
    }
}
