use anyhow::{Context, Result};
use oss_contributions::{Config, GithubClient, Runner, write_records};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    // GitHub API client
    let client = GithubClient::new(config.token.clone()).with_api_url(config.api_url.clone());

    let records = Runner::new(&client)
        .with_concurrency(config.concurrency)
        .run(&config.repositories, &config.username)
        .await
        .context("Failed to obtain contributions")?;

    info!(path = %config.output_path.display(), "Saving contributions data");
    write_records(&config.output_path, &records).with_context(|| {
        format!(
            "Failed to write contributions to {}",
            config.output_path.display()
        )
    })?;

    info!("Done");
    Ok(())
}
