use apisign_core::hash::base64_encode;
use apisign_core::{Error, Result, Signer};
use apisign_v1_hmac::Credential;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use log::{debug, error, info, warn};
use serde_json::Value;

use crate::ApiResponse;

/// A logical request: path, query parameters and an optional JSON body.
///
/// `path` may be relative to the base URL or an absolute URL that already
/// starts with it, such as a `pagination.next` cursor.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path or absolute URL.
    pub path: String,
    /// Query parameters appended to the URL before signing.
    pub query: Vec<(String, String)>,
    /// JSON body, serialized once and signed as sent.
    pub json: Option<Value>,
    /// Extra headers.
    pub headers: HeaderMap,
}

impl ApiRequest {
    /// Create a new request.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            json: None,
            headers: HeaderMap::new(),
        }
    }

    /// Create a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Create a PATCH request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Create a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append query parameters.
    pub fn with_query<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the JSON body.
    pub fn with_json(mut self, json: Value) -> Self {
        self.json = Some(json);
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Session signs and executes requests against one API.
///
/// It holds no per-call state, so a clone can be used from any number of
/// tasks at the same time.
#[derive(Clone, Debug)]
pub struct Session {
    signer: Signer<Credential>,
    base_url: String,
    basic_auth: Option<HeaderValue>,
}

impl Session {
    /// Create a session for `base_url`, trailing `/` is ignored.
    pub fn new(signer: Signer<Credential>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            signer,
            base_url: base_url.trim_end_matches('/').to_string(),
            basic_auth: None,
        }
    }

    /// Send HTTP basic auth alongside the signature.
    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Result<Self> {
        let mut value = HeaderValue::from_str(&format!(
            "Basic {}",
            base64_encode(format!("{username}:{password}").as_bytes())
        ))?;
        value.set_sensitive(true);
        self.basic_auth = Some(value);
        Ok(self)
    }

    /// The base URL without trailing `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Prepend the base URL unless `path` already starts with it.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with(&self.base_url) {
            path.to_string()
        } else {
            format!("{}{path}", self.base_url)
        }
    }

    /// Resolve `path` and append `query` form-urlencoded.
    pub fn build_url(&self, path: &str, query: &[(String, String)]) -> String {
        let mut url = self.resolve_url(path);
        if query.is_empty() {
            return url;
        }

        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(
            &form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query)
                .finish(),
        );
        url
    }

    /// Sign and send `req`, then check the response.
    ///
    /// The response body is parsed as JSON when possible. Error entries in
    /// the body are logged, and a 4xx or 5xx status fails the call with
    /// [`ErrorKind::HttpStatus`](apisign_core::ErrorKind::HttpStatus).
    /// Exactly one attempt is made.
    pub async fn execute(&self, req: ApiRequest) -> Result<ApiResponse> {
        let url = self.build_url(&req.path, &req.query);
        debug!("url: {url}");

        let body = match &req.json {
            Some(json) => Bytes::from(serde_json::to_vec(json).map_err(|e| {
                Error::request_invalid("failed to serialize request body").with_source(e)
            })?),
            None => Bytes::new(),
        };

        let mut builder = http::Request::builder()
            .method(req.method.clone())
            .uri(url.as_str());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(req.headers);
            if req.json.is_some() {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            if let Some(auth) = &self.basic_auth {
                headers.insert(AUTHORIZATION, auth.clone());
            }
        }
        let (mut parts, _) = builder.body(())?.into_parts();

        self.signer.sign(&mut parts, &body).await?;

        let resp = self
            .signer
            .context()
            .http_send(http::Request::from_parts(parts, body))
            .await?;
        info!("{} {url} - {}", req.method, resp.status().as_u16());

        let resp = ApiResponse::from_http(resp);
        if !resp.is_json() {
            error!("received non-JSON response from API: {} {url}", req.method);
        }
        for entry in resp.errors() {
            warn!("API error ({}): {}", entry.code, entry.message);
        }

        if resp.status().is_client_error() || resp.status().is_server_error() {
            return Err(Error::http_status(resp.status(), resp.body().clone()));
        }

        debug!("received response: {}", resp.text());
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apisign_core::Context;
    use apisign_v1_hmac::{RequestSigner, StaticCredentialProvider};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn session(base_url: &str) -> Session {
        let signer = Signer::new(
            Context::new(),
            StaticCredentialProvider::new("key", "secret"),
            RequestSigner::new(),
        );
        Session::new(signer, base_url)
    }

    #[test_case("/api/v1/things/", "https://api.example.com/api/v1/things/"; "relative")]
    #[test_case(
        "https://api.example.com/api/v1/things/?page=2",
        "https://api.example.com/api/v1/things/?page=2";
        "absolute"
    )]
    #[test_case("", "https://api.example.com"; "empty")]
    fn test_resolve_url(path: &str, expected: &str) {
        assert_eq!(session("https://api.example.com/").resolve_url(path), expected);
    }

    #[test]
    fn test_build_url_appends_query() {
        let s = session("https://api.example.com");
        let query = vec![
            ("name".to_string(), "a b&c".to_string()),
            ("empty".to_string(), "".to_string()),
        ];

        assert_eq!(
            s.build_url("/api/v1/things/", &query),
            "https://api.example.com/api/v1/things/?name=a+b%26c&empty="
        );
        assert_eq!(
            s.build_url("/api/v1/things/?page=2", &query[1..]),
            "https://api.example.com/api/v1/things/?page=2&empty="
        );
        assert_eq!(
            s.build_url("/api/v1/things/", &[]),
            "https://api.example.com/api/v1/things/"
        );
    }

    #[test]
    fn test_basic_auth_is_sensitive() -> Result<()> {
        let s = session("https://api.example.com").with_basic_auth("user", "pass")?;
        let value = s.basic_auth.expect("basic auth must be set");
        assert_eq!(value, "Basic dXNlcjpwYXNz");
        assert!(value.is_sensitive());
        Ok(())
    }
}
