//! Knowledge of pixiv's URL scheme lives here and nowhere else.

pub const DEFAULT_BASE_URL: &str = "https://www.pixiv.net";

/// Token marking the page number inside every image URL, e.g. `12345_p0.png`.
const PAGE_ZERO_TOKEN: &str = "_p0";

pub fn author_url(user_id: &str) -> String {
    format!("{DEFAULT_BASE_URL}/users/{user_id}")
}

/// Rewrites a page-0 image URL so it points at `page_index`.
///
/// Assumes all size variants carry the page number as the last `_p0` in the
/// URL. Returns `None` when the token is missing and another page is wanted.
pub fn page_url(template: &str, page_index: usize) -> Option<String> {
    if page_index == 0 {
        return Some(template.to_string());
    }
    let at = template.rfind(PAGE_ZERO_TOKEN)?;
    let mut url = String::with_capacity(template.len() + 2);
    url.push_str(&template[..at]);
    url.push_str(&format!("_p{page_index}"));
    url.push_str(&template[at + PAGE_ZERO_TOKEN.len()..]);
    Some(url)
}

/// Lower-case extension of the URL path, `jpg` when there is none.
pub fn url_extension(url: &str) -> String {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };
    let file = path.rsplit('/').next().unwrap_or("");
    match file.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 5
                && ext.bytes().all(|b| b.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => "jpg".to_string(),
    }
}
