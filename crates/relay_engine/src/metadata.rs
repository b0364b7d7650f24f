use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use relay_core::SizeVariant;
use relay_logging::relay_debug;
use scraper::{Html, Node};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::fetch::{FetchRequest, Fetcher};
use crate::FetchError;

/// Page-0 image URL per size variant.
pub type VariantUrls = BTreeMap<SizeVariant, String>;

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata request failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("metadata response is not valid json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("pixiv reported an error: {0}")]
    Upstream(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllustMetadata {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub title: Option<String>,
    /// Plain text with HTML removed.
    pub description: Option<String>,
    pub uploaded: Option<DateTime<Utc>>,
    /// `None` when the upstream value is missing or not a number.
    pub page_count: Option<u32>,
    pub urls: VariantUrls,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorMetadata {
    pub image_big: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    error: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    body: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IllustBody {
    user_id: Value,
    #[serde(default)]
    user_name: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    upload_date: Value,
    #[serde(default)]
    page_count: Value,
    #[serde(default)]
    urls: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserBody {
    #[serde(default)]
    image_big: Option<String>,
}

/// Client for the `/ajax` metadata endpoints.
#[derive(Clone)]
pub struct MetadataClient {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
}

impl MetadataClient {
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { fetcher, base_url }
    }

    pub async fn illustration(&self, illust_id: u64) -> Result<IllustMetadata, MetadataError> {
        let url = format!("{}/ajax/illust/{illust_id}", self.base_url);
        let body: IllustBody = self.fetch_body(&url).await?;

        let mut urls = VariantUrls::new();
        for (key, value) in body.urls {
            match (key.parse::<SizeVariant>(), value) {
                (Ok(variant), Some(url)) if !url.is_empty() => {
                    urls.insert(variant, url);
                }
                _ => relay_debug!("ignoring image url entry {key}"),
            }
        }

        Ok(IllustMetadata {
            id: illust_id.to_string(),
            user_id: value_to_id(&body.user_id),
            user_name: body.user_name,
            title: body.title.filter(|title| !title.is_empty()),
            description: body
                .description
                .map(|html| strip_html(&html))
                .filter(|text| !text.is_empty()),
            uploaded: parse_upload_date(&body.upload_date),
            page_count: parse_page_count(&body.page_count),
            urls,
        })
    }

    pub async fn author(&self, user_id: &str) -> Result<AuthorMetadata, MetadataError> {
        let url = format!("{}/ajax/user/{user_id}", self.base_url);
        let body: UserBody = self.fetch_body(&url).await?;
        Ok(AuthorMetadata {
            image_big: body.image_big.filter(|url| !url.is_empty()),
        })
    }

    async fn fetch_body<T: DeserializeOwned>(&self, url: &str) -> Result<T, MetadataError> {
        let output = self.fetcher.fetch(FetchRequest::new(url)).await?;
        let envelope: Envelope = serde_json::from_slice(&output.bytes)?;
        if envelope.error {
            return Err(MetadataError::Upstream(envelope.message));
        }
        Ok(serde_json::from_value(envelope.body)?)
    }
}

/// Flattens an HTML fragment to text, turning `<br>` into line breaks.
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::with_capacity(html.len());
    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(chunk) => text.push_str(chunk),
            Node::Element(element) if element.name() == "br" => text.push('\n'),
            _ => {}
        }
    }
    text.trim().to_string()
}

fn value_to_id(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    }
}

fn parse_page_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts RFC 3339 strings or epoch milliseconds.
fn parse_upload_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|date| date.with_timezone(&Utc)),
        Value::Number(number) => number
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}
