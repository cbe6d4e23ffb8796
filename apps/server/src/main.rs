use accounts_boost_server::{AppConfig, run};
use accounts_kernel::config::load_config;
use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg: AppConfig = load_config(Some("boost")).context("Critical: Configuration is malformed")?;

    let _log = cfg.logging.init(env!("CARGO_PKG_NAME"))?;

    run(cfg).await
}
