use apisign_core::{Error, Result};
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde_json::Value;

/// One entry of the `errors` list carried by an API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorEntry {
    /// Machine readable error code.
    pub code: String,
    /// Human readable message.
    pub message: String,
}

/// A response from the API, with its body parsed as JSON when possible.
///
/// The envelope looks like:
///
/// ```json
/// {
///   "data": ...,
///   "pagination": { "next": "/api/v1/things/?page=2" },
///   "errors": [ { "code": "...", "message": "..." } ]
/// }
/// ```
///
/// Any of these fields may be absent.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    json: Option<Value>,
    errors: Vec<ApiErrorEntry>,
}

impl ApiResponse {
    /// Build from a raw http response.
    pub fn from_http(resp: http::Response<Bytes>) -> Self {
        let (parts, body) = resp.into_parts();
        let json: Option<Value> = serde_json::from_slice(&body).ok();
        let errors = json
            .as_ref()
            .and_then(|v| v.get("errors"))
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(error_entry).collect())
            .unwrap_or_default();

        Self {
            status: parts.status,
            headers: parts.headers,
            body,
            json,
            errors,
        }
    }

    /// Status code of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Headers of the response.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body of the response.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as text, invalid utf-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Whether the body parsed as JSON.
    pub fn is_json(&self) -> bool {
        self.json.is_some()
    }

    /// Parsed JSON body, if the body parsed.
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Entries of the top level `errors` list.
    pub fn errors(&self) -> &[ApiErrorEntry] {
        &self.errors
    }

    /// The `data` field, if present.
    pub fn data(&self) -> Option<&Value> {
        self.json.as_ref()?.get("data")
    }

    /// Take the `data` field out of the response.
    ///
    /// Returns an error if the body is not JSON or has no `data`.
    pub fn into_data(self) -> Result<Value> {
        match self.json {
            Some(Value::Object(mut obj)) => obj.remove("data"),
            _ => None,
        }
        .ok_or_else(|| {
            Error::unexpected_shape(format!(
                "response ({}) has no `data` field",
                self.status
            ))
        })
    }

    /// The `pagination.next` cursor.
    ///
    /// Returns `None` when the field is absent or null, an error when it is
    /// neither null nor a string.
    pub fn next_page(&self) -> Result<Option<String>> {
        let next = self
            .json
            .as_ref()
            .and_then(|v| v.get("pagination"))
            .and_then(|v| v.get("next"));

        match next {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(Error::unexpected_shape(format!(
                "`pagination.next` must be a string or null, got {other}"
            ))),
        }
    }
}

fn error_entry(entry: &Value) -> ApiErrorEntry {
    let field = |name: &str| match entry.get(name) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    ApiErrorEntry {
        code: field("code"),
        message: field("message"),
    }
}
