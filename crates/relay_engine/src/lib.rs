//! Relay engine: network IO, media resolution and dispatch policy.
mod dispatch;
mod fetch;
mod metadata;
mod pipeline;
mod pixiv;
mod resolve;
mod types;

pub use dispatch::{dispatch_bundles, DispatchError, DispatchOutcome, Dispatcher};
pub use fetch::{FetchRequest, FetchSettings, Fetcher, ReqwestFetcher};
pub use metadata::{
    strip_html, AuthorMetadata, IllustMetadata, MetadataClient, MetadataError, VariantUrls,
};
pub use pipeline::{PipelineSettings, PreparedReply, RelayPipeline, RequestMetadata};
pub use pixiv::{author_url, page_url, url_extension, DEFAULT_BASE_URL};
pub use resolve::{fetch_thumbnail, resolve_pages, resolve_variant, ResolveSettings};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
