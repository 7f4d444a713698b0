use std::collections::HashSet;

use apisign_core::{Context, Error, Result, Signer};
use apisign_v1_hmac::{
    Config, Credential, DefaultCredentialProvider, RequestSigner, StaticCredentialProvider,
};
use log::debug;
use serde_json::{Map, Value};

use crate::fuzz::fuzz_ids;
use crate::{ApiRequest, Session};

/// ApiClient exposes the API verbs on top of a [`Session`].
///
/// Every verb returns the `data` field of the response envelope.
#[derive(Clone, Debug)]
pub struct ApiClient {
    session: Session,
    fuzz_probability: f64,
}

impl ApiClient {
    /// Create a client over an existing session, with fuzzing disabled.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            fuzz_probability: 0.0,
        }
    }

    /// Build a client from a loaded [`Config`].
    ///
    /// The configured key pair is used when present, otherwise the
    /// credential is loaded on first use from the environment or the
    /// credentials file.
    pub fn from_config(ctx: Context, config: &Config) -> Result<Self> {
        let signer = RequestSigner::new().with_debug(config.debug());
        let signer: Signer<Credential> = match config.credential() {
            Some(cred) => Signer::new(
                ctx,
                StaticCredentialProvider::new(&cred.key_id, &cred.key_secret),
                signer,
            ),
            None => Signer::new(ctx, DefaultCredentialProvider::new(), signer),
        };

        let mut session = Session::new(signer, config.base_url()?);
        if let Some((username, password)) = config.basic_auth() {
            session = session.with_basic_auth(&username, &password)?;
        }
        Ok(Self::new(session))
    }

    /// Probability of replacing nested objects by their id in `create`.
    ///
    /// Clamped to `[0, 1]`, NaN disables fuzzing.
    pub fn with_fuzz_probability(mut self, probability: f64) -> Self {
        self.fuzz_probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        self
    }

    /// The underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetch every page of a list endpoint.
    ///
    /// `params` only apply to the first request, `pagination.next` cursors
    /// are followed as is. A cursor pointing to a page already visited is
    /// an error.
    pub async fn list(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();

        let mut req = ApiRequest::get(path).with_query(params.iter().copied());
        visited.insert(self.session.build_url(&req.path, &req.query));

        loop {
            let resp = self.session.execute(req).await?;
            let next = resp.next_page()?;

            match resp.into_data()? {
                Value::Array(page) => {
                    debug!("list {path}: got {} items", page.len());
                    items.extend(page)
                }
                other => {
                    return Err(Error::unexpected_shape(format!(
                        "list {path}: `data` must be an array, got {other}"
                    )))
                }
            }

            let Some(next) = next else {
                return Ok(items);
            };
            if !visited.insert(self.session.resolve_url(&next)) {
                return Err(Error::unexpected_shape(format!(
                    "list {path}: pagination cycle at {next}"
                )));
            }
            req = ApiRequest::get(next);
        }
    }

    /// Create an object, possibly replacing nested objects by their id.
    pub async fn create(&self, path: &str, payload: Map<String, Value>) -> Result<Value> {
        let payload = fuzz_ids(payload, self.fuzz_probability);
        self.data(ApiRequest::post(path).with_json(Value::Object(payload)))
            .await
    }

    /// Fetch one object.
    pub async fn fetch(&self, path: &str) -> Result<Value> {
        self.data(ApiRequest::get(path)).await
    }

    /// POST `payload` as is, used for actions.
    pub async fn post(&self, path: &str, payload: Value) -> Result<Value> {
        self.data(ApiRequest::post(path).with_json(payload)).await
    }

    /// PATCH an object with `payload`.
    pub async fn edit(&self, path: &str, payload: Value) -> Result<Value> {
        self.data(ApiRequest::patch(path).with_json(payload)).await
    }

    /// Delete an object, the response body is ignored.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.session.execute(ApiRequest::delete(path)).await?;
        Ok(())
    }

    async fn data(&self, req: ApiRequest) -> Result<Value> {
        self.session.execute(req).await?.into_data()
    }
}
