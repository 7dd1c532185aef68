mod cli;

use crate::cli::{Action, StorageBackendArg, CLI};
use anyhow::Context;
use blink_core::Repository;
use blink_generator::RandomGenerator;
use blink_shortener::{ShortenParams, Shortener, ShortenerConfig, ShortenerError, ShortenerService};
use blink_storage::{spawn_reaper, InMemoryRepository, MySqlRepository};
use clap::Parser;
use jiff::SignedDuration;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries only the result.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = CLI::parse();

    info!(
        base_url = %cli.base_url,
        expire = cli.expire,
        code_length = cli.code_length,
        storage_backend = %cli.storage,
        "starting blink"
    );

    let config = ShortenerConfig::builder()
        .base_url(cli.base_url.clone())
        .ttl(SignedDuration::from_secs(cli.expire))
        .build();
    let generator =
        RandomGenerator::new(usize::from(cli.code_length)).context("invalid code length")?;

    match cli.storage {
        StorageBackendArg::InMemory => {
            run(&cli, Arc::new(InMemoryRepository::new()), generator, config).await
        }
        StorageBackendArg::Mysql => {
            let repository = MySqlRepository::connect(&cli.mysql_dsn)
                .await
                .context("failed to connect to mysql")?;
            run(&cli, Arc::new(repository), generator, config).await
        }
    }
}

async fn run<R: Repository>(
    cli: &CLI,
    repository: Arc<R>,
    generator: RandomGenerator,
    config: ShortenerConfig,
) -> anyhow::Result<()> {
    let reaper = spawn_reaper(
        Arc::clone(&repository),
        Duration::from_secs(cli.reap_interval),
    );
    let service = ShortenerService::new(repository, generator, config)?;

    let outcome = execute(&service, cli.action()).await;
    reaper.shutdown().await;
    outcome
}

async fn execute<S: Shortener>(service: &S, action: Action) -> anyhow::Result<()> {
    match action {
        Action::Minify(url) => {
            let short_url = service.shorten(ShortenParams::new(url)).await?;
            println!("Shortened URL: {short_url}");
        }
        Action::Expand(short_url) => match service.expand(&short_url).await {
            Ok(original_url) => println!("Original URL: {original_url}"),
            Err(err @ ShortenerError::NotFoundOrExpired(_)) => println!("{err}"),
            Err(err) => return Err(err.into()),
        },
    }

    Ok(())
}
