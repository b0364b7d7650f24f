//! Discord side of a request: turns bundles into messages and classifies
//! send failures.

use std::sync::Arc;

use relay_core::{
    clamp_text, Bundle, PreviewCard, MAX_AUTHOR_CHARS, MAX_CONTENT_CHARS,
    MAX_DESCRIPTION_CHARS, MAX_FOOTER_CHARS, MAX_TITLE_CHARS,
};
use relay_engine::{DispatchError, Dispatcher};
use serenity::builder::{
    CreateAllowedMentions, CreateAttachment, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter,
    CreateMessage, EditMessage,
};
use serenity::http::{Http, HttpError};
use serenity::model::id::{ChannelId, MessageId};

const STATUS_PAYLOAD_TOO_LARGE: u16 = 413;
const CODE_ENTITY_TOO_LARGE: i64 = 40005;

/// Replies to one trigger message in its channel.
pub struct DiscordDispatcher {
    http: Arc<Http>,
    channel_id: ChannelId,
    trigger_id: MessageId,
}

impl DiscordDispatcher {
    pub fn new(http: Arc<Http>, channel_id: ChannelId, trigger_id: MessageId) -> Self {
        Self {
            http,
            channel_id,
            trigger_id,
        }
    }

    fn reply(&self) -> CreateMessage {
        CreateMessage::new()
            .reference_message((self.channel_id, self.trigger_id))
            .allowed_mentions(CreateAllowedMentions::new())
    }
}

#[async_trait::async_trait]
impl Dispatcher for DiscordDispatcher {
    async fn send(&self, bundle: &Bundle) -> Result<(), DispatchError> {
        self.channel_id
            .send_message(&*self.http, build_message(self.reply(), bundle))
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn notify(&self, text: &str) -> Result<(), DispatchError> {
        self.channel_id
            .send_message(
                &*self.http,
                self.reply().content(clamp_text(text, MAX_CONTENT_CHARS)),
            )
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn suppress_source_previews(&self) -> Result<(), DispatchError> {
        self.channel_id
            .edit_message(
                &*self.http,
                self.trigger_id,
                EditMessage::new().suppress_embeds(true),
            )
            .await
            .map(|_| ())
            .map_err(classify)
    }
}

fn build_message(message: CreateMessage, bundle: &Bundle) -> CreateMessage {
    let mut message = message;
    if !bundle.content.is_empty() {
        message = message.content(clamp_text(&bundle.content, MAX_CONTENT_CHARS));
    }
    let embeds: Vec<CreateEmbed> = bundle.previews.iter().map(build_embed).collect();
    let files: Vec<CreateAttachment> = bundle
        .attachments
        .iter()
        .map(|attachment| CreateAttachment::bytes(attachment.bytes.clone(), attachment.name.clone()))
        .collect();
    message.embeds(embeds).add_files(files)
}

fn build_embed(card: &PreviewCard) -> CreateEmbed {
    let author = CreateEmbedAuthor::new(clamp_text(&card.author_name, MAX_AUTHOR_CHARS))
        .url(&card.author_url);
    let mut embed = CreateEmbed::new()
        .author(author)
        .image(attachment_url(&card.image_ref))
        .footer(CreateEmbedFooter::new(clamp_text(
            &card.footer,
            MAX_FOOTER_CHARS,
        )));
    if let Some(title) = &card.title {
        embed = embed.title(clamp_text(title, MAX_TITLE_CHARS));
    }
    if let Some(url) = &card.title_url {
        embed = embed.url(url);
    }
    if let Some(body) = &card.body {
        embed = embed.description(clamp_text(body, MAX_DESCRIPTION_CHARS));
    }
    if let Some(thumbnail) = &card.thumbnail_ref {
        embed = embed.thumbnail(attachment_url(thumbnail));
    }
    embed
}

fn attachment_url(name: &str) -> String {
    format!("attachment://{name}")
}

fn classify(err: serenity::Error) -> DispatchError {
    match err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => classify_status(
            response.status_code.as_u16(),
            response.error.code as i64,
            response.error.message,
        ),
        other => DispatchError::Transport {
            code: 0,
            message: other.to_string(),
        },
    }
}

/// Upload size rejections are told apart from every other failure.
pub fn classify_status(status: u16, code: i64, message: String) -> DispatchError {
    if status == STATUS_PAYLOAD_TOO_LARGE || code == CODE_ENTITY_TOO_LARGE {
        DispatchError::PayloadTooLarge
    } else {
        DispatchError::Transport { code, message }
    }
}
