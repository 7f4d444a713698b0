//! V1-HMAC-SHA256 request signing.
//!
//! Every request carries:
//!
//! - `X-Api-Key-Id`: the configured key id
//! - `X-Api-Date`: ISO-8601 timestamp with offset, also part of the signed string
//! - `X-Api-Signature`: `V1-HMAC-SHA256 <base64(hmac_sha256(secret, string_to_sign))>`
//! - `X-Api-Debug: 1`, unless disabled
//!
//! ```no_run
//! use apisign_core::{Context, OsEnv, Signer};
//! use apisign_v1_hmac::{DefaultCredentialProvider, RequestSigner};
//!
//! # async fn example() -> apisign_core::Result<()> {
//! let ctx = Context::new().with_env(OsEnv);
//! let signer = Signer::new(ctx, DefaultCredentialProvider::new(), RequestSigner::new());
//!
//! let mut parts = http::Request::get("https://api.example.com/api/v1/things/?a=1")
//!     .body(())?
//!     .into_parts()
//!     .0;
//! signer.sign(&mut parts, b"").await?;
//! # Ok(())
//! # }
//! ```

mod constants;
pub use constants::{
    APISIGN_API_URL, APISIGN_BASIC_AUTH_PASSWORD, APISIGN_BASIC_AUTH_USERNAME,
    APISIGN_CREDENTIALS_FILE, APISIGN_DEBUG, APISIGN_ENV_ID, APISIGN_KEY_ID, APISIGN_KEY_SECRET,
    SIGNATURE_VERSION, TZ, X_API_DATE, X_API_DEBUG, X_API_KEY_ID, X_API_SIGNATURE,
};

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod provide_credential;
pub use provide_credential::{
    DefaultCredentialProvider, EnvCredentialProvider, FileCredentialProvider,
    StaticCredentialProvider,
};

mod sign_request;
pub use sign_request::{string_to_sign, RequestSigner};
