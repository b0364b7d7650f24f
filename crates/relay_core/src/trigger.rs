//! Trigger grammar: `<prefix> [tokens...]` where one token is a pixiv artwork
//! URL and `key=value` tokens populate the options map.

use std::collections::BTreeMap;

use url::Url;

pub const ARTWORK_URL_BASE: &str = "https://www.pixiv.net/artworks/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub illust_id: u64,
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriggerError {
    #[error("message does not start with {0}")]
    MissingPrefix(String),
    #[error("no pixiv artwork url found")]
    MissingArtworkUrl,
}

/// Parsed `pages=` option. Values are 1-based as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageSelection {
    pub pages: Vec<u32>,
    pub rejected: Vec<String>,
}

impl PageSelection {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl Trigger {
    /// Canonical artwork page, also used as the image referer.
    pub fn artwork_url(&self) -> String {
        format!("{ARTWORK_URL_BASE}{}", self.illust_id)
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Reads `pages`, falling back to `page`.
    pub fn page_selection(&self) -> PageSelection {
        let raw = self.option("pages").or_else(|| self.option("page"));
        match raw {
            Some(raw) => parse_page_list(raw),
            None => PageSelection::default(),
        }
    }
}

pub fn parse_trigger(line: &str, prefix: &str) -> Result<Trigger, TriggerError> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some(prefix) {
        return Err(TriggerError::MissingPrefix(prefix.to_string()));
    }

    let mut illust_id = None;
    let mut options = BTreeMap::new();
    for token in tokens {
        if illust_id.is_none() {
            if let Some(id) = artwork_id(token) {
                illust_id = Some(id);
                continue;
            }
        }
        if looks_like_url(token) {
            continue;
        }
        if let Some((key, value)) = token.split_once('=') {
            if !key.is_empty() {
                options.insert(key.to_ascii_lowercase(), value.to_string());
            }
        }
    }

    illust_id
        .map(|illust_id| Trigger { illust_id, options })
        .ok_or(TriggerError::MissingArtworkUrl)
}

fn looks_like_url(token: &str) -> bool {
    token.contains("://") || token.contains("pixiv.net/")
}

/// Extracts the id from `[https://][www.]pixiv.net/[lang/]artworks/<id>`.
fn artwork_id(token: &str) -> Option<u64> {
    let token = token.trim_start_matches('<').trim_end_matches('>');
    if !token.contains("pixiv.net/") {
        return None;
    }
    let parsed = if token.contains("://") {
        Url::parse(token).ok()?
    } else {
        Url::parse(&format!("https://{token}")).ok()?
    };

    let host = parsed.host_str()?;
    if host != "pixiv.net" && !host.ends_with(".pixiv.net") {
        return None;
    }

    let mut segments = parsed.path_segments()?;
    segments.find(|segment| *segment == "artworks")?;
    let id = segments.next()?;
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    id.parse::<u64>().ok().filter(|id| *id > 0)
}

fn parse_page_list(raw: &str) -> PageSelection {
    let mut selection = PageSelection::default();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        match part.parse::<u32>() {
            Ok(page) if page > 0 => selection.pages.push(page),
            _ => selection.rejected.push(part.to_string()),
        }
    }
    selection
}
