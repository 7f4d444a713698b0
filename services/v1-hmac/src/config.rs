use std::fmt::{Debug, Formatter};

use apisign_core::{utils::Redact, Context, Error, Result};
use log::{debug, warn};
use serde::Deserialize;

use crate::constants::*;
use crate::Credential;

/// Config carries all the configuration for talking to the API.
///
/// Every field is layered: a value already set wins over the environment,
/// which wins over the credentials file.
#[derive(Clone, Default)]
pub struct Config {
    /// `base_url` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`APISIGN_API_URL`]
    /// - `api_url` in the credentials file
    pub base_url: Option<String>,
    /// `key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`APISIGN_KEY_ID`]
    /// - `api_key_id` in the credentials file
    pub key_id: Option<String>,
    /// `key_secret` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`APISIGN_KEY_SECRET`]
    /// - `api_key_secret` in the credentials file
    pub key_secret: Option<String>,
    /// Environment identifier used by orchestration code to build paths.
    pub env_id: Option<String>,
    /// Username for HTTP basic auth, sent alongside the signature when set.
    pub basic_auth_username: Option<String>,
    /// Password for HTTP basic auth.
    pub basic_auth_password: Option<String>,
    /// Path of the JSON credentials file, `~` is expanded.
    pub credentials_file: Option<String>,
    /// Whether to send the `X-Api-Debug` header, defaults to `true`.
    pub debug: Option<bool>,
}

/// Content of the credentials file.
///
/// ```json
/// {
///   "api_url": "https://api.example.com",
///   "api_key_id": "APIKEYID0001",
///   "api_key_secret": "secret",
///   "env_id": "2",
///   "basic_auth_username": "",
///   "basic_auth_password": ""
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CredentialsFile {
    pub api_url: Option<String>,
    pub api_key_id: Option<String>,
    pub api_key_secret: Option<String>,
    pub env_id: Option<String>,
    pub basic_auth_username: Option<String>,
    pub basic_auth_password: Option<String>,
}

impl CredentialsFile {
    /// Read and parse the credentials file at `path`.
    pub(crate) async fn load(ctx: &Context, path: &str) -> Result<Self> {
        let path = ctx.expand_home_dir(path).ok_or_else(|| {
            Error::config_invalid(format!(
                "credentials file {path} needs a home directory but none was found"
            ))
        })?;

        let content = ctx.file_read(&path).await?;
        let file: CredentialsFile = serde_json::from_slice(&content).map_err(|e| {
            Error::config_invalid(format!("credentials file {path} is not valid json"))
                .with_source(e)
        })?;
        debug!("credentials file loaded from {path}");
        Ok(file)
    }
}

impl Config {
    /// Create a new Config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set base_url
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set key_id
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Set key_secret
    pub fn with_key_secret(mut self, key_secret: impl Into<String>) -> Self {
        self.key_secret = Some(key_secret.into());
        self
    }

    /// Set env_id
    pub fn with_env_id(mut self, env_id: impl Into<String>) -> Self {
        self.env_id = Some(env_id.into());
        self
    }

    /// Set basic auth username and password
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.basic_auth_username = Some(username.into());
        self.basic_auth_password = Some(password.into());
        self
    }

    /// Set credentials_file
    pub fn with_credentials_file(mut self, path: impl Into<String>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    /// Set debug
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var(APISIGN_API_URL) {
            self.base_url.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(APISIGN_KEY_ID) {
            self.key_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(APISIGN_KEY_SECRET) {
            self.key_secret.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(APISIGN_ENV_ID) {
            self.env_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(APISIGN_BASIC_AUTH_USERNAME) {
            self.basic_auth_username.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(APISIGN_BASIC_AUTH_PASSWORD) {
            self.basic_auth_password.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(APISIGN_CREDENTIALS_FILE) {
            self.credentials_file.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(APISIGN_DEBUG) {
            match parse_bool(&v) {
                Some(b) => {
                    self.debug.get_or_insert(b);
                }
                None => warn!("ignoring {APISIGN_DEBUG}={v:?}: not a boolean"),
            }
        }

        self
    }

    /// Load config from the credentials file, if one is configured.
    ///
    /// Empty strings in the file are treated as unset.
    pub async fn from_file(mut self, ctx: &Context) -> Result<Self> {
        let Some(path) = self.credentials_file.as_deref() else {
            return Ok(self);
        };

        let file = CredentialsFile::load(ctx, path).await?;
        let fill = |slot: &mut Option<String>, v: Option<String>| {
            if let Some(v) = v.filter(|v| !v.is_empty()) {
                slot.get_or_insert(v);
            }
        };
        fill(&mut self.base_url, file.api_url);
        fill(&mut self.key_id, file.api_key_id);
        fill(&mut self.key_secret, file.api_key_secret);
        fill(&mut self.env_id, file.env_id);
        fill(&mut self.basic_auth_username, file.basic_auth_username);
        fill(&mut self.basic_auth_password, file.basic_auth_password);

        Ok(self)
    }

    /// The base URL without trailing `/`.
    ///
    /// Returns an error if no base URL is configured.
    pub fn base_url(&self) -> Result<String> {
        match self.base_url.as_deref().map(|v| v.trim_end_matches('/')) {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(Error::config_invalid("base url is not configured")),
        }
    }

    /// The credential, if both key id and secret are configured.
    pub fn credential(&self) -> Option<Credential> {
        match (self.key_id.as_deref(), self.key_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some(Credential::new(id, secret))
            }
            _ => None,
        }
    }

    /// Basic auth pair, if a username is configured.
    pub fn basic_auth(&self) -> Option<(String, String)> {
        let username = self.basic_auth_username.as_deref().filter(|v| !v.is_empty())?;
        Some((
            username.to_string(),
            self.basic_auth_password.clone().unwrap_or_default(),
        ))
    }

    /// Whether to send the debug header.
    pub fn debug(&self) -> bool {
        self.debug.unwrap_or(true)
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("key_id", &self.key_id.as_ref().map(Redact::from))
            .field("key_secret", &self.key_secret.as_ref().map(Redact::from))
            .field("env_id", &self.env_id)
            .field("basic_auth_username", &self.basic_auth_username)
            .field(
                "basic_auth_password",
                &self.basic_auth_password.as_ref().map(Redact::from),
            )
            .field("credentials_file", &self.credentials_file)
            .field("debug", &self.debug)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apisign_core::{ErrorKind, StaticEnv};
    use apisign_file_read_tokio::TokioFileRead;
    use std::collections::HashMap;
    use std::io::Write;
    use test_case::test_case;

    fn env_ctx(envs: &[(&str, &str)]) -> Context {
        Context::new().with_file_read(TokioFileRead).with_env(StaticEnv {
            home_dir: None,
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        })
    }

    #[test]
    fn test_from_env_keeps_explicit_values() {
        let ctx = env_ctx(&[
            (APISIGN_API_URL, "https://env.example.com/"),
            (APISIGN_KEY_ID, "env-key"),
            (APISIGN_KEY_SECRET, "env-secret"),
            (APISIGN_DEBUG, "off"),
        ]);

        let cfg = Config::new().with_key_id("explicit-key").from_env(&ctx);
        assert_eq!(cfg.base_url().unwrap(), "https://env.example.com");
        assert_eq!(cfg.key_id.as_deref(), Some("explicit-key"));
        assert_eq!(cfg.key_secret.as_deref(), Some("env-secret"));
        assert!(!cfg.debug());
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::new();
        assert!(cfg.debug());
        assert!(cfg.credential().is_none());
        assert!(cfg.basic_auth().is_none());
        assert_eq!(cfg.base_url().unwrap_err().kind(), ErrorKind::ConfigInvalid);
    }

    #[test_case("1", Some(true); "one")]
    #[test_case(" TRUE ", Some(true); "padded upper true")]
    #[test_case("yes", Some(true); "yes")]
    #[test_case("on", Some(true); "on")]
    #[test_case("0", Some(false); "zero")]
    #[test_case("False", Some(false); "mixed case false")]
    #[test_case("no", Some(false); "no")]
    #[test_case("off", Some(false); "off")]
    #[test_case("maybe", None; "not a boolean")]
    #[test_case("", None; "empty")]
    fn test_debug_from_env(value: &str, expected: Option<bool>) {
        let cfg = Config::new().from_env(&env_ctx(&[(APISIGN_DEBUG, value)]));
        assert_eq!(cfg.debug, expected);
        assert_eq!(cfg.debug(), expected.unwrap_or(true));
    }

    #[test]
    fn test_invalid_debug_is_ignored() {
        let cfg = Config::new().from_env(&env_ctx(&[(APISIGN_DEBUG, "maybe")]));
        assert_eq!(cfg.debug, None);
    }

    #[tokio::test]
    async fn test_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(
            br#"{
                "api_url": "https://file.example.com/",
                "api_key_id": "file-key",
                "api_key_secret": "file-secret",
                "env_id": "2",
                "basic_auth_username": "",
                "basic_auth_password": ""
            }"#,
        )?;
        let path = file.path().to_string_lossy().to_string();

        let ctx = env_ctx(&[(APISIGN_CREDENTIALS_FILE, path.as_str()), (APISIGN_KEY_ID, "env-key")]);
        let cfg = Config::new().from_env(&ctx).from_file(&ctx).await?;

        assert_eq!(cfg.base_url()?, "https://file.example.com");
        let cred = cfg.credential().expect("credential must be loaded");
        assert_eq!(cred.key_id, "env-key");
        assert_eq!(cred.key_secret, "file-secret");
        assert_eq!(cfg.env_id.as_deref(), Some("2"));
        assert!(cfg.basic_auth().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_from_file_rejects_invalid_json() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"not json")?;
        let path = file.path().to_string_lossy().to_string();

        let err = Config::new()
            .with_credentials_file(path)
            .from_file(&env_ctx(&[]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        Ok(())
    }
}
