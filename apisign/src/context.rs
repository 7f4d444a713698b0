use apisign_core::{Context, OsEnv, Result};
use apisign_file_read_tokio::TokioFileRead;
use apisign_http_send_reqwest::ReqwestHttpSend;
use apisign_v1_hmac::Config;
use log::warn;

use crate::ApiClient;

/// A context reading files with tokio, sending with reqwest and reading the
/// OS environment.
///
/// Header names go out title-cased (`X-Api-Signature`) on HTTP/1.
pub fn default_context() -> Context {
    let client = reqwest::Client::builder()
        .http1_title_case_headers()
        .build()
        .unwrap_or_else(|err| {
            warn!("failed to build http client, falling back to defaults: {err}");
            reqwest::Client::new()
        });

    Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::new(client))
        .with_env(OsEnv)
}

/// Build an [`ApiClient`] from the environment and the credentials file.
pub async fn default_client() -> Result<ApiClient> {
    let ctx = default_context();
    let config = Config::new().from_env(&ctx).from_file(&ctx).await?;
    ApiClient::from_config(ctx, &config)
}
