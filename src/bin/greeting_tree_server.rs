use std::path::PathBuf;

use anyhow::Result;
use greeting_tree::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_path = std::env::var_os("GREETING_TREE_CONFIG").map(PathBuf::from);
    let config = ServerConfig::load(config_path.as_deref())?;
    greeting_tree::server::serve(config).await
}
