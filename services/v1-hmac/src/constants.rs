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

// Headers attached to every signed request.
pub const X_API_KEY_ID: &str = "x-api-key-id";
pub const X_API_SIGNATURE: &str = "x-api-signature";
pub const X_API_DATE: &str = "x-api-date";
pub const X_API_DEBUG: &str = "x-api-debug";

/// Scheme tag prefixed to every signature.
pub const SIGNATURE_VERSION: &str = "V1-HMAC-SHA256";

// Env values used in apisign.
pub const APISIGN_API_URL: &str = "APISIGN_API_URL";
pub const APISIGN_KEY_ID: &str = "APISIGN_KEY_ID";
pub const APISIGN_KEY_SECRET: &str = "APISIGN_KEY_SECRET";
pub const APISIGN_ENV_ID: &str = "APISIGN_ENV_ID";
pub const APISIGN_BASIC_AUTH_USERNAME: &str = "APISIGN_BASIC_AUTH_USERNAME";
pub const APISIGN_BASIC_AUTH_PASSWORD: &str = "APISIGN_BASIC_AUTH_PASSWORD";
pub const APISIGN_CREDENTIALS_FILE: &str = "APISIGN_CREDENTIALS_FILE";
pub const APISIGN_DEBUG: &str = "APISIGN_DEBUG";
/// Timezone override for the signing timestamp.
pub const TZ: &str = "TZ";
