//! List every object under a path.
//!
//! ```shell
//! APISIGN_CREDENTIALS_FILE=~/.apisign.json RUST_LOG=info \
//!     cargo run --example list -- /api/v1beta0/user/2/images/ os=ubuntu
//! ```

use anyhow::{bail, Result};
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: list <path> [key=value ...]");
    };
    let params: Vec<(String, String)> = args
        .map(|arg| match arg.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (arg, String::new()),
        })
        .collect();
    let params: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let client = apisign::default_client().await?;
    let items = client.list(&path, &params).await?;

    info!("{path}: {} objects", items.len());
    for item in items {
        info!("{item}");
    }
    Ok(())
}
