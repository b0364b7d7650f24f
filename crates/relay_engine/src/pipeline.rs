use std::collections::BTreeMap;
use std::sync::Arc;

use relay_core::{
    assemble, finalize_bundles, plan, resolve_page_count, AssembleSettings, Bundle,
    IllustrationDetails, IllustrationRef, PageSelection, PlanPolicy, ProgressLog, ReplySummary,
    ARTWORK_URL_BASE,
};
use relay_logging::relay_info;

use crate::fetch::Fetcher;
use crate::metadata::{AuthorMetadata, IllustMetadata, MetadataClient, MetadataError};
use crate::pixiv::author_url;
use crate::resolve::{fetch_thumbnail, resolve_pages, ResolveSettings};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub resolve: ResolveSettings,
    pub assemble: AssembleSettings,
    pub max_pages: usize,
    pub plan_policy: PlanPolicy,
    pub escalation_hint: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            resolve: ResolveSettings::default(),
            assemble: AssembleSettings::default(),
            max_pages: 9,
            plan_policy: PlanPolicy::default(),
            escalation_hint: "ask an operator to check the logs".to_string(),
        }
    }
}

/// Everything known about the illustration before any image is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    pub artwork_url: String,
    pub illust: IllustMetadata,
    pub author: AuthorMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedReply {
    pub bundles: Vec<Bundle>,
    pub attached: usize,
    pub requested: usize,
}

/// Runs one request from metadata lookup to ready-to-send bundles.
pub struct RelayPipeline {
    fetcher: Arc<dyn Fetcher>,
    metadata: MetadataClient,
    settings: PipelineSettings,
}

impl RelayPipeline {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        base_url: impl Into<String>,
        settings: PipelineSettings,
    ) -> Self {
        let metadata = MetadataClient::new(fetcher.clone(), base_url);
        Self {
            fetcher,
            metadata,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Illustration then author; the author lookup needs the illustration's user id.
    pub async fn fetch_metadata(&self, illust_id: u64) -> Result<RequestMetadata, MetadataError> {
        let illust = self.metadata.illustration(illust_id).await?;
        let author = self.metadata.author(&illust.user_id).await?;
        relay_info!(
            "metadata for {} by {}: {} variant urls",
            illust.id,
            illust.user_name,
            illust.urls.len()
        );
        Ok(RequestMetadata {
            artwork_url: format!("{ARTWORK_URL_BASE}{illust_id}"),
            illust,
            author,
        })
    }

    pub async fn prepare_reply(
        &self,
        metadata: &RequestMetadata,
        selection: &PageSelection,
        log: &ProgressLog,
    ) -> PreparedReply {
        let settings = &self.settings;
        let referer = metadata.artwork_url.as_str();

        for rejected in &selection.rejected {
            log.warn(format!("ignoring page {rejected:?}; pages are positive numbers"));
        }

        let page_count = resolve_page_count(metadata.illust.page_count, log);
        let page_plan = plan(
            &selection.pages,
            page_count,
            settings.max_pages,
            settings.plan_policy,
            log,
        );
        log.log(format!(
            "fetching {} of {page_count} page(s)",
            page_plan.requested()
        ));

        let thumbnail = fetch_thumbnail(
            self.fetcher.as_ref(),
            metadata.author.image_big.as_deref(),
            referer,
            log,
        )
        .await;

        let resolved: BTreeMap<_, _> = resolve_pages(
            self.fetcher.as_ref(),
            &metadata.illust.urls,
            &page_plan.pages,
            referer,
            &settings.resolve,
            log,
        )
        .await
        .into_iter()
        .filter_map(|(page_index, image)| image.map(|image| (page_index, image)))
        .collect();

        let details = IllustrationDetails {
            illust: IllustrationRef {
                id: metadata.illust.id.clone(),
                page_count,
            },
            title: metadata.illust.title.clone(),
            description: metadata.illust.description.clone(),
            author_name: metadata.illust.user_name.clone(),
            author_url: author_url(&metadata.illust.user_id),
            artwork_url: metadata.artwork_url.clone(),
            uploaded: metadata.illust.uploaded,
        };
        let bundles = assemble(
            resolved,
            thumbnail.as_ref(),
            &details,
            &settings.assemble,
            log,
        );

        let attached = bundles.len();
        let requested = page_plan.requested();
        let errors = log.errors();
        let summary = ReplySummary {
            artwork_url: &metadata.artwork_url,
            attached,
            requested,
            clipped: page_plan.clipped,
            errors: &errors,
            escalation_hint: &settings.escalation_hint,
        }
        .render();
        log.log(format!("attached {attached} of {requested} image(s)"));

        PreparedReply {
            bundles: finalize_bundles(bundles, summary),
            attached,
            requested,
        }
    }
}
