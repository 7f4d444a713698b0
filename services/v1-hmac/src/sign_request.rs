use apisign_core::hash::base64_hmac_sha256;
use apisign_core::time::{format_iso8601, now_in, DateTime};
use apisign_core::{Context, Error, Result, SignRequest, SigningRequest};
use async_trait::async_trait;
use http::header::HeaderName;
use http::request::Parts;
use http::HeaderValue;
use log::debug;

use crate::constants::*;
use crate::Credential;

/// RequestSigner that implements the V1-HMAC-SHA256 scheme.
///
/// The signature covers the method, the timestamp, the path, the canonical
/// query and the body. It is attached together with the key id and the
/// timestamp as `X-Api-*` headers.
#[derive(Debug)]
pub struct RequestSigner {
    debug: bool,

    time: Option<DateTime>,
}

impl Default for RequestSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestSigner {
    /// Create a new signer, sending the debug header.
    pub fn new() -> Self {
        Self {
            debug: true,

            time: None,
        }
    }

    /// Whether to send `X-Api-Debug: 1` with every request.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        ctx: &Context,
        req: &mut Parts,
        body: &[u8],
        credential: Option<&Self::Credential>,
    ) -> Result<()> {
        let cred = credential.ok_or_else(|| Error::credential_invalid("missing credential"))?;
        let mut signed_req = SigningRequest::build(req)?;

        // Taken right before signing, never reused.
        let now = self
            .time
            .unwrap_or_else(|| now_in(ctx.env_var(TZ).as_deref()));
        let date = format_iso8601(now);

        let sts = string_to_sign(&signed_req, &date, body)?;
        debug!("string to sign: {:?}", String::from_utf8_lossy(&sts));

        let signature = format!(
            "{SIGNATURE_VERSION} {}",
            base64_hmac_sha256(cred.key_secret.as_bytes(), &sts)
        );
        debug!("signature: {signature}");

        signed_req.headers.insert(
            HeaderName::from_static(X_API_KEY_ID),
            HeaderValue::from_str(&cred.key_id)?,
        );
        signed_req.header_insert_sensitive(HeaderName::from_static(X_API_SIGNATURE), &signature)?;
        signed_req
            .headers
            .insert(HeaderName::from_static(X_API_DATE), HeaderValue::from_str(&date)?);
        if self.debug {
            signed_req.headers.insert(
                HeaderName::from_static(X_API_DEBUG),
                HeaderValue::from_static("1"),
            );
        }

        signed_req.apply(req)
    }
}

/// Construct string to sign
///
/// ## Format
///
/// ```text
/// METHOD + "\n" +
/// Date + "\n" +
/// Path + "\n" +
/// CanonicalQuery + "\n" +
/// Body
/// ```
///
/// `Date` is the value sent as `X-Api-Date`, `Path` is taken verbatim from
/// the URI and `Body` is the raw payload, empty when there is none.
pub fn string_to_sign(req: &SigningRequest, date: &str, body: &[u8]) -> Result<Vec<u8>> {
    let canonical_query = req.canonical_query()?;
    let method = req.method.as_str().to_ascii_uppercase();

    let mut s = Vec::with_capacity(
        method.len() + date.len() + req.path.len() + canonical_query.len() + body.len() + 4,
    );
    for field in [method.as_bytes(), date.as_bytes(), req.path.as_bytes()] {
        s.extend_from_slice(field);
        s.push(b'\n');
    }
    s.extend_from_slice(canonical_query.as_bytes());
    s.push(b'\n');
    s.extend_from_slice(body);

    Ok(s)
}
