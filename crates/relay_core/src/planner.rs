use std::collections::BTreeSet;

use crate::{PageIndex, ProgressLog};

/// How explicit page requests are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanPolicy {
    /// Keep request order and duplicates; out-of-range pages are attempted anyway.
    #[default]
    Compatible,
    /// Sort, deduplicate and drop pages past the end of the illustration.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    pub pages: Vec<PageIndex>,
    /// More pages exist than were planned; the requested count is a lower bound.
    pub clipped: bool,
}

impl PagePlan {
    pub fn requested(&self) -> usize {
        self.pages.len()
    }
}

/// Falls back to a single page when the metadata count is missing or zero.
pub fn resolve_page_count(raw: Option<u32>, log: &ProgressLog) -> u32 {
    match raw {
        Some(count) if count >= 1 => count,
        Some(count) => {
            log.warn(format!("page count {count} is invalid; assuming 1 page"));
            1
        }
        None => {
            log.warn("page count missing from metadata; assuming 1 page");
            1
        }
    }
}

/// Expands a page selection into 0-based indices.
///
/// `explicit_pages` are 1-based. An empty selection means "all pages".
pub fn plan(
    explicit_pages: &[u32],
    total_page_count: u32,
    max_pages: usize,
    policy: PlanPolicy,
    log: &ProgressLog,
) -> PagePlan {
    if explicit_pages.is_empty() {
        return plan_all(total_page_count, max_pages, log);
    }
    match policy {
        PlanPolicy::Compatible => plan_explicit(explicit_pages, total_page_count, max_pages, log),
        PlanPolicy::Strict => plan_strict(explicit_pages, total_page_count, max_pages, log),
    }
}

fn plan_all(total_page_count: u32, max_pages: usize, log: &ProgressLog) -> PagePlan {
    let total = total_page_count.max(1) as usize;
    let clipped = total > max_pages;
    if clipped {
        log.warn(format!(
            "illustration has {total} pages; only the first {max_pages} will be fetched"
        ));
    }
    PagePlan {
        pages: (0..total.min(max_pages)).collect(),
        clipped,
    }
}

fn plan_explicit(
    explicit_pages: &[u32],
    total_page_count: u32,
    max_pages: usize,
    log: &ProgressLog,
) -> PagePlan {
    let mut requested = explicit_pages;
    if requested.len() > max_pages {
        log.warn(format!(
            "{} pages requested; only the first {max_pages} will be fetched",
            requested.len()
        ));
        requested = &requested[..max_pages];
    }

    let mut pages = Vec::with_capacity(requested.len());
    for &page in requested {
        if page == 0 {
            log.warn("page 0 does not exist; pages are numbered from 1");
            continue;
        }
        if page > total_page_count {
            log.warn(format!(
                "page {page} is past the last page ({total_page_count}); trying anyway"
            ));
        }
        pages.push(page as PageIndex - 1);
    }

    PagePlan {
        pages,
        clipped: false,
    }
}

fn plan_strict(
    explicit_pages: &[u32],
    total_page_count: u32,
    max_pages: usize,
    log: &ProgressLog,
) -> PagePlan {
    let mut unique = BTreeSet::new();
    for &page in explicit_pages {
        if page == 0 || page > total_page_count {
            log.warn(format!(
                "page {page} is outside 1..={total_page_count}; skipping"
            ));
            continue;
        }
        unique.insert(page as PageIndex - 1);
    }

    let mut pages: Vec<PageIndex> = unique.into_iter().collect();
    if pages.len() > max_pages {
        log.warn(format!(
            "{} pages requested; only the first {max_pages} will be fetched",
            pages.len()
        ));
        pages.truncate(max_pages);
    }

    PagePlan {
        pages,
        clipped: false,
    }
}
