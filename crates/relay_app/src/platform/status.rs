//! The editable "working on it" message that mirrors a request's progress log.

use std::sync::Arc;

use relay_core::{tail_text, ProgressObserver, MAX_CONTENT_CHARS};
use relay_logging::{relay_debug, relay_warn};
use serenity::builder::{CreateMessage, EditMessage};
use serenity::http::Http;
use serenity::model::id::{ChannelId, MessageId};
use tokio::sync::watch;
use tokio::task::JoinHandle;

const PLACEHOLDER: &str = "working on it…";
const FENCE: &str = "```";

/// Wraps the newest transcript lines in a code block that fits one message.
pub fn render_status(transcript: &str) -> String {
    let budget = MAX_CONTENT_CHARS - 2 * FENCE.len() - 2;
    format!("{FENCE}\n{}\n{FENCE}", tail_text(transcript, budget))
}

/// Feeds transcripts to the edit worker. Only the newest one is kept, so
/// edits coalesce while a previous edit is still in flight.
pub struct StatusPublisher {
    sender: watch::Sender<String>,
}

impl ProgressObserver for StatusPublisher {
    fn publish(&self, transcript: &str) {
        self.sender.send_replace(render_status(transcript));
    }
}

pub struct StatusMessage {
    http: Arc<Http>,
    channel_id: ChannelId,
    message_id: MessageId,
    worker: JoinHandle<()>,
}

impl StatusMessage {
    /// Posts the placeholder as a reply to the trigger and starts the edit worker.
    pub async fn open(
        http: Arc<Http>,
        channel_id: ChannelId,
        reply_to: MessageId,
    ) -> serenity::Result<(Self, StatusPublisher)> {
        let message = channel_id
            .send_message(
                &*http,
                CreateMessage::new()
                    .content(PLACEHOLDER)
                    .reference_message((channel_id, reply_to)),
            )
            .await?;

        let (sender, receiver) = watch::channel(String::new());
        let worker = tokio::spawn(edit_worker(
            http.clone(),
            channel_id,
            message.id,
            receiver,
        ));

        Ok((
            Self {
                http,
                channel_id,
                message_id: message.id,
                worker,
            },
            StatusPublisher { sender },
        ))
    }

    /// Waits for pending edits, then deletes the message when `remove` is set.
    ///
    /// The publisher must already be dropped, otherwise this waits forever.
    pub async fn close(self, remove: bool) {
        if let Err(err) = self.worker.await {
            relay_warn!("status edit worker ended abnormally: {}", err);
        }
        if !remove {
            return;
        }
        if let Err(err) = self
            .channel_id
            .delete_message(&self.http, self.message_id)
            .await
        {
            relay_warn!("could not delete status message {}: {}", self.message_id, err);
        }
    }
}

async fn edit_worker(
    http: Arc<Http>,
    channel_id: ChannelId,
    message_id: MessageId,
    mut receiver: watch::Receiver<String>,
) {
    // Ends once the publisher is dropped and the last value has been seen.
    while receiver.changed().await.is_ok() {
        let content = receiver.borrow_and_update().clone();
        let edit = EditMessage::new().content(content);
        if let Err(err) = channel_id
            .edit_message(&*http, message_id, edit)
            .await
        {
            relay_debug!("status edit for {} failed: {}", message_id, err);
        }
    }
}
