use crate::limits::{clamp_text, MAX_CONTENT_CHARS};
use crate::Bundle;

/// Human-facing reply text for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplySummary<'a> {
    pub artwork_url: &'a str,
    pub attached: usize,
    pub requested: usize,
    /// The illustration has more pages than were requested.
    pub clipped: bool,
    pub errors: &'a [String],
    pub escalation_hint: &'a str,
}

impl ReplySummary<'_> {
    pub fn render(&self) -> String {
        let plus = if self.clipped { "+" } else { "" };
        let noun = if self.requested == 1 && !self.clipped {
            "image"
        } else {
            "images"
        };
        let mut text = format!(
            "{}\nattached {} of {}{plus} {noun}",
            self.artwork_url, self.attached, self.requested
        );
        if !self.errors.is_empty() {
            for error in self.errors {
                text.push_str("\n- ");
                text.push_str(error);
            }
            text.push('\n');
            text.push_str(self.escalation_hint);
        }
        clamp_text(&text, MAX_CONTENT_CHARS)
    }
}

/// Puts the summary on the first bundle, or sends it alone when nothing resolved.
pub fn finalize_bundles(mut bundles: Vec<Bundle>, summary: String) -> Vec<Bundle> {
    match bundles.first_mut() {
        Some(first) => first.content = summary,
        None => bundles.push(Bundle::text_only(summary)),
    }
    bundles
}
