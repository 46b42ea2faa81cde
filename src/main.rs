use coursegate::{App, ConfigBuilder, flags};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigBuilder::new().from_env().build()?;
    coursegate::init_tracing_with_config(&config);

    flags::init(config.flags.clone());

    tracing::info!(
        identity_configured = config.identity.is_configured(),
        webhook_secret_configured = config.webhook.has_secret(),
        "Starting coursegate"
    );

    App::new(config).serve().await?;
    Ok(())
}
