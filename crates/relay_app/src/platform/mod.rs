mod config;
mod discord;
mod handler;
mod logging;
mod status;

use std::sync::Arc;

use anyhow::Context as _;
use relay_engine::{ReqwestFetcher, RelayPipeline};
use relay_logging::{relay_debug, relay_info};
use serenity::model::gateway::GatewayIntents;
use serenity::Client;

use self::config::RelayConfig;
use self::handler::Handler;

pub async fn run() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let config = RelayConfig::from_env().context("reading configuration")?;
    logging::initialize(config.log_destination, config.log_level);
    match dotenv {
        Ok(path) => relay_info!("loaded environment from {}", path.display()),
        Err(err) => relay_debug!("no .env file loaded: {}", err),
    }

    let fetcher = ReqwestFetcher::new(config.fetch.clone()).context("building http client")?;
    let pipeline = RelayPipeline::new(
        Arc::new(fetcher),
        config.pixiv_base_url.clone(),
        config.pipeline.clone(),
    );
    relay_info!(
        "listening for {} (max {} pages, image ceiling {} bytes)",
        config.trigger_prefix,
        config.pipeline.max_pages,
        config.pipeline.resolve.image_byte_ceiling
    );

    let handler = Handler::new(Arc::new(pipeline), config.trigger_prefix.clone());
    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
    let mut client = Client::builder(&config.bot_token, intents)
        .event_handler(handler)
        .await
        .context("creating discord client")?;

    client.start().await.context("running discord client")
}
