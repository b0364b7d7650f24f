use relay_core::{Bundle, ProgressLog};
use relay_logging::relay_error;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The platform rejected the upload size.
    #[error("request entity too large")]
    PayloadTooLarge,
    #[error("discord error ({code}): {message}")]
    Transport { code: i64, message: String },
}

/// Outbound side of one request: the reply channel plus the trigger message.
#[async_trait::async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(&self, bundle: &Bundle) -> Result<(), DispatchError>;

    /// Plain text follow-up, used after a failed send.
    async fn notify(&self, text: &str) -> Result<(), DispatchError>;

    /// Hides the platform's own link preview on the trigger message.
    async fn suppress_source_previews(&self) -> Result<(), DispatchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    pub sent: usize,
    pub failed: usize,
}

impl DispatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.failed == 0 && self.sent > 0
    }
}

/// Sends bundles in order; a failed bundle does not stop the rest.
pub async fn dispatch_bundles(
    dispatcher: &dyn Dispatcher,
    bundles: &[Bundle],
    escalation_hint: &str,
    log: &ProgressLog,
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    let total = bundles.len();

    for (position, bundle) in bundles.iter().enumerate() {
        let number = position + 1;
        match dispatcher.send(bundle).await {
            Ok(()) => {
                outcome.sent += 1;
                log.log(format!(
                    "sent message {number}/{total} ({} bytes attached)",
                    bundle.attachment_bytes()
                ));
            }
            Err(DispatchError::PayloadTooLarge) => {
                outcome.failed += 1;
                log.warn(format!(
                    "message {number}/{total} was still too large to send ({} bytes); the size limits need adjusting",
                    bundle.attachment_bytes()
                ));
            }
            Err(err) => {
                outcome.failed += 1;
                log.error(err.to_string());
                let notice = format!("{err}\n{escalation_hint}");
                if let Err(notify_err) = dispatcher.notify(&notice).await {
                    relay_error!("failed to send failure notice: {}", notify_err);
                }
            }
        }
    }

    if outcome.succeeded() {
        if let Err(err) = dispatcher.suppress_source_previews().await {
            log.warn(format!("could not hide the link preview: {err}"));
        }
    }

    outcome
}
