// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::fmt::{Debug, Formatter};

use apisign_core::{utils::Redact, SigningCredential};

/// Credential for the V1-HMAC-SHA256 scheme.
#[derive(Clone, Default)]
pub struct Credential {
    /// Key id sent in clear as `X-Api-Key-Id`.
    pub key_id: String,
    /// Shared secret used as the HMAC key.
    pub key_secret: String,
}

impl Credential {
    /// Create a new credential.
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        }
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("key_id", &Redact::from(&self.key_id))
            .field("key_secret", &Redact::from(&self.key_secret))
            .finish()
    }
}

impl SigningCredential for Credential {
    fn is_valid(&self) -> bool {
        !self.key_id.is_empty() && !self.key_secret.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_validity() {
        assert!(Credential::new("APIKEYID0001", "secret").is_valid());
        assert!(!Credential::new("", "secret").is_valid());
        assert!(!Credential::new("APIKEYID0001", "").is_valid());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let cred = Credential::new("APIKEYID0001", "a-very-long-shared-secret");
        let out = format!("{cred:?}");
        assert!(!out.contains("a-very-long-shared-secret"));
        assert!(out.contains("API***001"));
        assert!(out.contains("a-v***ret"));
    }
}
