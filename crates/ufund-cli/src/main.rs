//! uFund command-line client

mod cli;
mod commands;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ufund_core::UfundConfig;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(matches: &clap::ArgMatches) -> Result<UfundConfig> {
    let config = match matches.get_one::<std::path::PathBuf>("config") {
        Some(path) => UfundConfig::load(path)?,
        None => UfundConfig::default(),
    };
    let mut config = config.with_env_overrides();
    if let Some(url) = matches.get_one::<String>("api-url") {
        config = config.with_base_url(url.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::cli().get_matches();
    init_tracing(matches.get_flag("json"));

    let config = load_config(&matches)?;
    tracing::debug!(base_url = %config.client.base_url, "configuration loaded");

    let Some((name, args)) = matches.subcommand() else {
        anyhow::bail!("no command given");
    };

    let ctx = commands::Context::new(config, &matches)?;
    let result = commands::run(&ctx, name, args).await;

    let stats = ctx.queue.shutdown().await?;
    if stats.failed > 0 {
        tracing::warn!(failed = stats.failed, "some remote writes were not applied");
    }
    tracing::debug!(?stats, "write-behind queue drained");
    result
}
