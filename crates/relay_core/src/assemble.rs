use std::collections::BTreeMap;

use crate::limits::{
    clamp_text, MAX_AUTHOR_CHARS, MAX_DESCRIPTION_CHARS, MAX_FOOTER_CHARS, MAX_TITLE_CHARS,
};
use crate::{
    Attachment, Bundle, IllustrationDetails, PageIndex, PreviewCard, ProgressLog, ResolvedImage,
    Thumbnail,
};

/// Whether every bundle carries its own copy of the author thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbnailSharing {
    /// Each message attaches the thumbnail again. Required by Discord, which
    /// cannot reference attachments of another message.
    #[default]
    CopyPerBundle,
    /// Only the first bundle that has room attaches it; later cards still
    /// reference it by name.
    FirstBundleOnly,
}

#[derive(Debug, Clone)]
pub struct AssembleSettings {
    pub bundle_byte_ceiling: u64,
    pub thumbnail_sharing: ThumbnailSharing,
}

impl Default for AssembleSettings {
    fn default() -> Self {
        Self {
            bundle_byte_ceiling: 8 * 1024 * 1024,
            thumbnail_sharing: ThumbnailSharing::default(),
        }
    }
}

/// Builds one bundle per resolved page, in page order.
///
/// Bundle content is left empty; the reply summary is added afterwards.
pub fn assemble(
    resolved: BTreeMap<PageIndex, ResolvedImage>,
    thumbnail: Option<&Thumbnail>,
    details: &IllustrationDetails,
    settings: &AssembleSettings,
    log: &ProgressLog,
) -> Vec<Bundle> {
    let thumbnail_name = thumbnail.map(|thumb| format!("thumbnail.{}", thumb.extension));
    let mut thumbnail_attached = false;
    let mut bundles = Vec::with_capacity(resolved.len());

    for (page_index, image) in resolved {
        let image_bytes = image.size_bytes();
        if image_bytes > settings.bundle_byte_ceiling {
            log.error(format!(
                "page {}: {} bytes does not fit in one message (limit {})",
                page_index + 1,
                image_bytes,
                settings.bundle_byte_ceiling
            ));
            continue;
        }

        let image_name = format!(
            "page{}-{}.{}",
            page_index + 1,
            image.variant,
            image.extension
        );
        let mut attachments = vec![Attachment {
            name: image_name.clone(),
            bytes: image.bytes,
        }];

        let mut thumbnail_ref = None;
        if let (Some(thumb), Some(name)) = (thumbnail, thumbnail_name.as_ref()) {
            let wants_copy = match settings.thumbnail_sharing {
                ThumbnailSharing::CopyPerBundle => true,
                ThumbnailSharing::FirstBundleOnly => !thumbnail_attached,
            };
            if !wants_copy {
                thumbnail_ref = Some(name.clone());
            } else if image_bytes + thumb.size_bytes() <= settings.bundle_byte_ceiling {
                attachments.push(Attachment {
                    name: name.clone(),
                    bytes: thumb.bytes.clone(),
                });
                thumbnail_attached = true;
                thumbnail_ref = Some(name.clone());
            } else {
                log.warn(format!(
                    "page {}: no room for the author thumbnail; sending without it",
                    page_index + 1
                ));
            }
        }

        let first = bundles.is_empty();
        bundles.push(Bundle {
            content: String::new(),
            attachments,
            previews: vec![preview_card(
                details,
                page_index,
                image_name,
                thumbnail_ref,
                first,
            )],
        });
    }

    bundles
}

fn preview_card(
    details: &IllustrationDetails,
    page_index: PageIndex,
    image_ref: String,
    thumbnail_ref: Option<String>,
    first: bool,
) -> PreviewCard {
    let body = if first {
        details
            .description
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .map(|text| clamp_text(text, MAX_DESCRIPTION_CHARS))
    } else {
        None
    };

    PreviewCard {
        title: details
            .title
            .as_deref()
            .filter(|title| !title.is_empty())
            .map(|title| clamp_text(title, MAX_TITLE_CHARS)),
        title_url: Some(details.artwork_url.clone()),
        author_name: clamp_text(&details.author_name, MAX_AUTHOR_CHARS),
        author_url: details.author_url.clone(),
        body,
        image_ref,
        thumbnail_ref,
        footer: clamp_text(&footer_text(details, page_index), MAX_FOOTER_CHARS),
    }
}

fn footer_text(details: &IllustrationDetails, page_index: PageIndex) -> String {
    let mut footer = String::from("pixiv");
    if let Some(uploaded) = details.uploaded {
        footer.push_str(" ・ ");
        footer.push_str(&uploaded.format("%a %b %d %Y").to_string());
    }
    if details.illust.page_count > 1 {
        footer.push_str(&format!(
            " ・ {}/{}",
            page_index + 1,
            details.illust.page_count
        ));
    }
    footer
}
