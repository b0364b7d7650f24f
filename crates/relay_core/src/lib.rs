//! Relay core: request planning, bundle assembly and progress reporting.
//!
//! Nothing in this crate performs IO. The engine feeds it fetched data and the
//! application turns its bundles into chat messages.
mod assemble;
mod limits;
mod planner;
mod progress;
mod summary;
mod trigger;
mod types;

pub use assemble::{assemble, AssembleSettings, ThumbnailSharing};
pub use limits::{
    clamp_text, tail_text, MAX_AUTHOR_CHARS, MAX_CONTENT_CHARS, MAX_DESCRIPTION_CHARS,
    MAX_FOOTER_CHARS, MAX_TITLE_CHARS,
};
pub use planner::{plan, resolve_page_count, PagePlan, PlanPolicy};
pub use progress::{Clock, EntryLevel, LogEntry, NullObserver, ProgressLog, ProgressObserver};
pub use summary::{finalize_bundles, ReplySummary};
pub use trigger::{parse_trigger, PageSelection, Trigger, TriggerError, ARTWORK_URL_BASE};
pub use types::{
    Attachment, Bundle, IllustrationDetails, IllustrationRef, PageIndex, PreviewCard,
    ResolvedImage, SizeVariant, Thumbnail, UnknownVariant,
};
