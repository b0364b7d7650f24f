use std::collections::{BTreeMap, HashSet};

use futures_util::{stream, StreamExt};
use relay_core::{PageIndex, ProgressLog, ResolvedImage, SizeVariant, Thumbnail};
use relay_logging::relay_debug;

use crate::fetch::{FetchRequest, Fetcher};
use crate::metadata::VariantUrls;
use crate::pixiv::{page_url, url_extension};
use crate::FailureKind;

#[derive(Debug, Clone)]
pub struct ResolveSettings {
    /// Variants to try, best first.
    pub variant_order: Vec<SizeVariant>,
    pub image_byte_ceiling: u64,
    /// Pages resolved at once; 1 resolves strictly in order.
    pub page_concurrency: usize,
}

impl Default for ResolveSettings {
    fn default() -> Self {
        Self {
            variant_order: SizeVariant::DEFAULT_ORDER.to_vec(),
            image_byte_ceiling: 7_864_320,
            page_concurrency: 1,
        }
    }
}

/// Returns the first variant, in rank order, that downloads and fits.
///
/// Smaller variants are never compared against each other once one fits.
pub async fn resolve_variant(
    fetcher: &dyn Fetcher,
    urls: &VariantUrls,
    page_index: PageIndex,
    referer: &str,
    settings: &ResolveSettings,
    log: &ProgressLog,
) -> Option<ResolvedImage> {
    let page = page_index + 1;
    let ceiling = settings.image_byte_ceiling;

    for &variant in &settings.variant_order {
        let Some(url) = urls.get(&variant) else {
            relay_debug!("page {page}: no {variant} url");
            continue;
        };

        log.log(format!("page {page}: fetching {variant}"));
        let request = FetchRequest::new(url).referer(referer).max_bytes(ceiling);
        let output = match fetcher.fetch(request).await {
            Ok(output) => output,
            Err(err) => {
                if let FailureKind::TooLarge { actual, .. } = err.kind {
                    let size = actual.map_or_else(String::new, |n| format!(" ({n} bytes)"));
                    log.warn(format!(
                        "page {page}: {variant} is over the {ceiling} byte limit{size}"
                    ));
                } else {
                    log.warn(format!("page {page}: could not fetch {variant}: {err}"));
                }
                continue;
            }
        };

        let size = output.bytes.len() as u64;
        if size > ceiling {
            log.warn(format!(
                "page {page}: {variant} is {size} bytes, over the {ceiling} byte limit"
            ));
            continue;
        }

        log.log(format!("page {page}: using {variant} ({size} bytes)"));
        return Some(ResolvedImage {
            page_index,
            variant,
            bytes: output.bytes,
            extension: url_extension(url),
        });
    }

    None
}

/// Resolves every requested page; a failed page never stops the others.
///
/// Repeated indices are fetched once. The result holds one entry per
/// distinct page, `None` for pages where no variant worked.
pub async fn resolve_pages(
    fetcher: &dyn Fetcher,
    templates: &VariantUrls,
    pages: &[PageIndex],
    referer: &str,
    settings: &ResolveSettings,
    log: &ProgressLog,
) -> BTreeMap<PageIndex, Option<ResolvedImage>> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(pages.len());
    for &page_index in pages {
        if seen.insert(page_index) {
            unique.push(page_index);
        } else {
            log.log(format!(
                "page {} requested again; reusing the first result",
                page_index + 1
            ));
        }
    }

    stream::iter(unique)
        .map(|page_index| async move {
            let urls = urls_for_page(templates, page_index, log);
            let resolved =
                resolve_variant(fetcher, &urls, page_index, referer, settings, log).await;
            if resolved.is_none() {
                log.error(format!(
                    "page {}: no image under {} bytes could be fetched",
                    page_index + 1,
                    settings.image_byte_ceiling
                ));
            }
            (page_index, resolved)
        })
        .buffered(settings.page_concurrency.max(1))
        .collect()
        .await
}

fn urls_for_page(templates: &VariantUrls, page_index: PageIndex, log: &ProgressLog) -> VariantUrls {
    let mut urls = VariantUrls::new();
    for (&variant, template) in templates {
        match page_url(template, page_index) {
            Some(url) => {
                urls.insert(variant, url);
            }
            None => log.warn(format!(
                "page {}: {variant} url has no page marker; skipping it",
                page_index + 1
            )),
        }
    }
    urls
}

/// Fetches the author avatar. Failure only costs the preview its thumbnail.
pub async fn fetch_thumbnail(
    fetcher: &dyn Fetcher,
    url: Option<&str>,
    referer: &str,
    log: &ProgressLog,
) -> Option<Thumbnail> {
    let Some(url) = url else {
        log.warn("author has no profile image; continuing without thumbnail");
        return None;
    };
    match fetcher.fetch(FetchRequest::new(url).referer(referer)).await {
        Ok(output) => Some(Thumbnail {
            bytes: output.bytes,
            extension: url_extension(url),
        }),
        Err(err) => {
            log.warn(format!(
                "could not fetch author thumbnail ({err}); continuing without it"
            ));
            None
        }
    }
}
