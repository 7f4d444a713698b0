use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use apisign::v1::{Config, RequestSigner, StaticCredentialProvider};
use apisign::{ApiClient, Context, Error, HttpSend, Result, Session, Signer};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};
use log::{Level, LevelFilter, Log, Metadata, Record};

pub const BASE_URL: &str = "https://api.example.com";
pub const KEY_ID: &str = "APIKEYID0001";
pub const KEY_SECRET: &str = "shared-secret";

/// A request as it reached the transport.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// HttpSend answering canned responses keyed by `"METHOD url"`.
///
/// Unknown routes fail like an unreachable host.
#[derive(Debug, Clone, Default)]
pub struct MockHttpSend {
    routes: Arc<Mutex<HashMap<String, (StatusCode, Bytes)>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockHttpSend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, method: &str, url: &str, status: u16, body: &str) -> Self {
        self.routes.lock().unwrap().insert(
            format!("{method} {url}"),
            (
                StatusCode::from_u16(status).unwrap(),
                Bytes::from(body.to_string()),
            ),
        );
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let (parts, body) = req.into_parts();
        let key = format!("{} {}", parts.method, parts.uri);
        self.requests.lock().unwrap().push(Recorded {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        });

        let Some((status, body)) = self.routes.lock().unwrap().get(&key).cloned() else {
            return Err(Error::transport(format!("no route for {key}")));
        };
        Ok(http::Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(body)?)
    }
}

static LOGGED: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

/// Keeps every record so tests can assert on them, and forwards to env_logger.
struct CaptureLogger {
    inner: env_logger::Logger,
}

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        LOGGED
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
        if self.inner.matches(record) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

pub fn init_logger() {
    let logger = CaptureLogger {
        inner: env_logger::builder().is_test(true).build(),
    };
    if log::set_logger(Box::leak(Box::new(logger))).is_ok() {
        log::set_max_level(LevelFilter::Trace);
    }
}

/// Whether a record at `level` with exactly `message` was logged.
pub fn logged(level: Level, message: &str) -> bool {
    LOGGED
        .lock()
        .unwrap()
        .iter()
        .any(|(l, m)| *l == level && m == message)
}

pub fn session(mock: &MockHttpSend) -> Session {
    init_logger();

    let signer = Signer::new(
        Context::new().with_http_send(mock.clone()),
        StaticCredentialProvider::new(KEY_ID, KEY_SECRET),
        RequestSigner::new(),
    );
    Session::new(signer, BASE_URL)
}

pub fn client(mock: &MockHttpSend) -> ApiClient {
    ApiClient::new(session(mock))
}

pub fn client_from_config(mock: &MockHttpSend, config: Config) -> Result<ApiClient> {
    init_logger();

    ApiClient::from_config(Context::new().with_http_send(mock.clone()), &config)
}
