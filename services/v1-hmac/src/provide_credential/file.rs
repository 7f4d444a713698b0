use crate::config::CredentialsFile;
use crate::{constants::*, Credential};
use apisign_core::{Context, ProvideCredential, Result};
use async_trait::async_trait;
use log::debug;

/// FileCredentialProvider loads credentials from the JSON credentials file.
///
/// The path is taken from [`FileCredentialProvider::with_path`], falling back
/// to the `APISIGN_CREDENTIALS_FILE` environment variable. Without a path the
/// provider returns `None`.
#[derive(Debug, Default, Clone)]
pub struct FileCredentialProvider {
    path: Option<String>,
}

impl FileCredentialProvider {
    /// Create a new FileCredentialProvider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the credentials file at this path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

#[async_trait]
impl ProvideCredential for FileCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let Some(path) = self
            .path
            .clone()
            .or_else(|| ctx.env_var(APISIGN_CREDENTIALS_FILE))
        else {
            debug!("no credentials file configured");
            return Ok(None);
        };

        let file = CredentialsFile::load(ctx, &path).await?;
        match (file.api_key_id, file.api_key_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Ok(Some(Credential::new(id, secret)))
            }
            _ => Ok(None),
        }
    }
}
