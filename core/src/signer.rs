use crate::{Context, ProvideCredential, Result, SignRequest, SigningCredential};
use std::sync::{Arc, Mutex};

/// Signer is the main struct used to sign the request.
///
/// The first valid credential is cached and reused by every clone of the
/// signer, so it can be shared across concurrent callers.
#[derive(Clone, Debug)]
pub struct Signer<K: SigningCredential> {
    ctx: Context,
    loader: Arc<dyn ProvideCredential<Credential = K>>,
    builder: Arc<dyn SignRequest<Credential = K>>,
    credential: Arc<Mutex<Option<K>>>,
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        loader: impl ProvideCredential<Credential = K>,
        builder: impl SignRequest<Credential = K>,
    ) -> Self {
        Self {
            ctx,

            loader: Arc::new(loader),
            builder: Arc::new(builder),
            credential: Arc::new(Mutex::new(None)),
        }
    }

    /// Get the context this signer was built with.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Signing request with the payload that will be sent along.
    pub async fn sign(&self, req: &mut http::request::Parts, body: &[u8]) -> Result<()> {
        let credential = self.credential.lock().expect("lock poisoned").clone();
        let credential = if credential.is_valid() {
            credential
        } else {
            let loaded = self.loader.provide_credential(&self.ctx).await?;
            *self.credential.lock().expect("lock poisoned") = loaded.clone();
            loaded
        };

        self.builder
            .sign_request(&self.ctx, req, body, credential.as_ref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, SigningRequest};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug)]
    struct TestCredential(String);

    impl SigningCredential for TestCredential {
        fn is_valid(&self) -> bool {
            !self.0.is_empty()
        }
    }

    #[derive(Debug, Default)]
    struct CountingLoader(Arc<AtomicUsize>);

    #[async_trait]
    impl ProvideCredential for CountingLoader {
        type Credential = TestCredential;

        async fn provide_credential(&self, _: &Context) -> Result<Option<TestCredential>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Some(TestCredential("key".to_string())))
        }
    }

    #[derive(Debug)]
    struct BodyLengthSigner;

    #[async_trait]
    impl SignRequest for BodyLengthSigner {
        type Credential = TestCredential;

        async fn sign_request(
            &self,
            _: &Context,
            req: &mut http::request::Parts,
            body: &[u8],
            credential: Option<&TestCredential>,
        ) -> Result<()> {
            let cred = credential.ok_or_else(|| Error::credential_invalid("missing"))?;
            let mut sr = SigningRequest::build(req)?;
            sr.headers
                .insert("x-signed", format!("{}:{}", cred.0, body.len()).parse()?);
            sr.apply(req)
        }
    }

    #[tokio::test]
    async fn test_signer_caches_credential() -> Result<()> {
        let count = Arc::new(AtomicUsize::new(0));
        let signer = Signer::new(
            Context::new(),
            CountingLoader(count.clone()),
            BodyLengthSigner,
        );

        for body in [&b""[..], &b"{}"[..]] {
            let (mut parts, _) = http::Request::post("https://example.com/")
                .body(())?
                .into_parts();
            signer.clone().sign(&mut parts, body).await?;
            assert_eq!(parts.headers["x-signed"], format!("key:{}", body.len()));
        }

        assert_eq!(count.load(Ordering::SeqCst), 1);
        Ok(())
    }
}
