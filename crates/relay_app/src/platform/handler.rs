use std::sync::Arc;

use relay_core::{parse_trigger, ProgressLog};
use relay_engine::{dispatch_bundles, RelayPipeline};
use relay_logging::{relay_debug, relay_error, relay_info, relay_warn};
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::{Context, EventHandler};

use super::discord::DiscordDispatcher;
use super::status::StatusMessage;

pub struct Handler {
    pipeline: Arc<RelayPipeline>,
    trigger_prefix: String,
}

impl Handler {
    pub fn new(pipeline: Arc<RelayPipeline>, trigger_prefix: String) -> Self {
        Self {
            pipeline,
            trigger_prefix,
        }
    }

    async fn relay(&self, ctx: &Context, msg: &Message) {
        let trigger = match parse_trigger(&msg.content, &self.trigger_prefix) {
            Ok(trigger) => trigger,
            Err(err) => {
                relay_debug!("ignoring message {}: {}", msg.id, err);
                return;
            }
        };
        relay_info!(
            "relaying illustration {} for {} in channel {}",
            trigger.illust_id,
            msg.author.name,
            msg.channel_id
        );

        // No status message exists yet, so a metadata failure stays out of the channel.
        let metadata = match self.pipeline.fetch_metadata(trigger.illust_id).await {
            Ok(metadata) => metadata,
            Err(err) => {
                relay_error!("metadata for {} failed: {}", trigger.illust_id, err);
                return;
            }
        };

        let (status, log) =
            match StatusMessage::open(ctx.http.clone(), msg.channel_id, msg.id).await {
                Ok((status, publisher)) => (Some(status), ProgressLog::new(publisher)),
                Err(err) => {
                    relay_warn!("could not post a status message: {}", err);
                    (None, ProgressLog::detached())
                }
            };

        let reply = self
            .pipeline
            .prepare_reply(&metadata, &trigger.page_selection(), &log)
            .await;

        let dispatcher = DiscordDispatcher::new(ctx.http.clone(), msg.channel_id, msg.id);
        let outcome = dispatch_bundles(
            &dispatcher,
            &reply.bundles,
            &self.pipeline.settings().escalation_hint,
            &log,
        )
        .await;

        let errors = log.finish();
        relay_info!(
            "illustration {}: attached {} of {}, sent {} message(s), {} failed, {} error(s)",
            trigger.illust_id,
            reply.attached,
            reply.requested,
            outcome.sent,
            outcome.failed,
            errors.len()
        );

        if let Some(status) = status {
            status.close(outcome.succeeded()).await;
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        relay_info!("connected as {}", ready.user.name);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        self.relay(&ctx, &msg).await;
    }
}
