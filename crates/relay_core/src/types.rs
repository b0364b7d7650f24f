use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Zero-based page index inside an illustration.
pub type PageIndex = usize;

/// Named size tier of the same source image, ordered largest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeVariant {
    Original,
    Regular,
    Small,
    Thumb,
    Mini,
}

impl SizeVariant {
    pub const DEFAULT_ORDER: [SizeVariant; 3] =
        [SizeVariant::Original, SizeVariant::Regular, SizeVariant::Small];

    /// Key used by the metadata `urls` object.
    pub fn as_str(self) -> &'static str {
        match self {
            SizeVariant::Original => "original",
            SizeVariant::Regular => "regular",
            SizeVariant::Small => "small",
            SizeVariant::Thumb => "thumb",
            SizeVariant::Mini => "mini",
        }
    }
}

impl fmt::Display for SizeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown size variant {0:?}")]
pub struct UnknownVariant(pub String);

impl FromStr for SizeVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "original" => Ok(SizeVariant::Original),
            "regular" => Ok(SizeVariant::Regular),
            "small" => Ok(SizeVariant::Small),
            "thumb" => Ok(SizeVariant::Thumb),
            "mini" => Ok(SizeVariant::Mini),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllustrationRef {
    pub id: String,
    pub page_count: u32,
}

/// Display fields shared by every preview card of one illustration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllustrationDetails {
    pub illust: IllustrationRef,
    pub title: Option<String>,
    /// Plain text, HTML already stripped.
    pub description: Option<String>,
    pub author_name: String,
    pub author_url: String,
    pub artwork_url: String,
    pub uploaded: Option<DateTime<Utc>>,
}

/// One page image that fit under the per-image ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub page_index: PageIndex,
    pub variant: SizeVariant,
    pub bytes: Vec<u8>,
    /// File extension without the dot, taken from the source URL.
    pub extension: String,
}

impl ResolvedImage {
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// The author's avatar, shown as the preview thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub bytes: Vec<u8>,
    pub extension: String,
}

impl Thumbnail {
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Rich preview referencing attachments of the same bundle by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewCard {
    pub title: Option<String>,
    pub title_url: Option<String>,
    pub author_name: String,
    pub author_url: String,
    pub body: Option<String>,
    pub image_ref: String,
    pub thumbnail_ref: Option<String>,
    pub footer: String,
}

/// One outbound message worth of text, attachments and previews.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bundle {
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub previews: Vec<PreviewCard>,
}

impl Bundle {
    pub fn text_only(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn attachment_bytes(&self) -> u64 {
        self.attachments
            .iter()
            .map(|attachment| attachment.bytes.len() as u64)
            .sum()
    }
}
