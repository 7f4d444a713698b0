use crate::provide_credential::{EnvCredentialProvider, FileCredentialProvider};
use crate::Credential;
use apisign_core::{Context, ProvideCredential, ProvideCredentialChain, Result};
use async_trait::async_trait;

/// DefaultCredentialProvider tries the environment first, then the
/// credentials file.
#[derive(Debug)]
pub struct DefaultCredentialProvider {
    chain: ProvideCredentialChain<Credential>,
}

impl Default for DefaultCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultCredentialProvider {
    /// Create a new DefaultCredentialProvider.
    pub fn new() -> Self {
        Self::with_chain(
            ProvideCredentialChain::new()
                .push(EnvCredentialProvider::new())
                .push(FileCredentialProvider::new()),
        )
    }

    /// Create with a custom credential chain.
    pub fn with_chain(chain: ProvideCredentialChain<Credential>) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl ProvideCredential for DefaultCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        self.chain.provide_credential(ctx).await
    }
}
