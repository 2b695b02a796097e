//! certhound - certificate audit for container image exports.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    certhound_cli::run().await
}
