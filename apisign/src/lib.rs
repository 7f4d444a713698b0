//! Signed client for the V1-HMAC-SHA256 REST API.
//!
//! [`Session`] signs and executes single requests, [`ApiClient`] builds the
//! API verbs on top of it: paginated `list`, `create`, `fetch`, `post`,
//! `edit` and `delete`.
//!
//! ```no_run
//! # async fn example() -> apisign::Result<()> {
//! let client = apisign::default_client().await?;
//!
//! for image in client.list("/api/v1beta0/user/2/images/", &[("os", "ubuntu")]).await? {
//!     log::info!("image: {}", image["id"]);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub use apisign_core::*;

/// The V1-HMAC-SHA256 signing scheme.
pub mod v1 {
    pub use apisign_v1_hmac::*;
}

mod client;
pub use client::ApiClient;

pub mod fuzz;

mod response;
pub use response::{ApiErrorEntry, ApiResponse};

mod session;
pub use session::{ApiRequest, Session};

#[cfg(feature = "default-context")]
mod context;
#[cfg(feature = "default-context")]
pub use context::{default_client, default_context};
