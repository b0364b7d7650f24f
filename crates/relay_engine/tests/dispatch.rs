use std::collections::VecDeque;
use std::sync::Mutex;

use pretty_assertions::assert_eq;
use relay_core::{Bundle, EntryLevel, ProgressLog};
use relay_engine::{dispatch_bundles, DispatchError, DispatchOutcome, Dispatcher};

const HINT: &str = "ask an operator to check the logs";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Send(String),
    Notify(String),
    Suppress,
}

/// Replays scripted send results and records every call.
#[derive(Default)]
struct ScriptedDispatcher {
    send_results: Mutex<VecDeque<Result<(), DispatchError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedDispatcher {
    fn new(results: Vec<Result<(), DispatchError>>) -> Self {
        Self {
            send_results: Mutex::new(results.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Dispatcher for ScriptedDispatcher {
    async fn send(&self, bundle: &Bundle) -> Result<(), DispatchError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Send(bundle.content.clone()));
        self.send_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn notify(&self, text: &str) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push(Call::Notify(text.to_string()));
        Ok(())
    }

    async fn suppress_source_previews(&self) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push(Call::Suppress);
        Ok(())
    }
}

fn bundles(contents: &[&str]) -> Vec<Bundle> {
    contents.iter().map(|c| Bundle::text_only(*c)).collect()
}

#[tokio::test]
async fn successful_dispatch_suppresses_the_source_preview() {
    let dispatcher = ScriptedDispatcher::new(Vec::new());
    let log = ProgressLog::detached();

    let outcome = dispatch_bundles(&dispatcher, &bundles(&["a", "b"]), HINT, &log).await;

    assert_eq!(outcome, DispatchOutcome { sent: 2, failed: 0 });
    assert!(outcome.succeeded());
    assert_eq!(
        dispatcher.calls(),
        vec![
            Call::Send("a".to_string()),
            Call::Send("b".to_string()),
            Call::Suppress
        ]
    );
}

#[tokio::test]
async fn entity_too_large_is_a_warning_without_notification() {
    let dispatcher = ScriptedDispatcher::new(vec![Err(DispatchError::PayloadTooLarge)]);
    let log = ProgressLog::detached();

    let outcome = dispatch_bundles(&dispatcher, &bundles(&["a"]), HINT, &log).await;

    assert_eq!(outcome, DispatchOutcome { sent: 0, failed: 1 });
    assert!(!outcome.succeeded());
    assert_eq!(dispatcher.calls(), vec![Call::Send("a".to_string())]);
    assert_eq!(log.error_count(), 0);
    let last = log.entries().pop().unwrap();
    assert_eq!(last.level, EntryLevel::Warn);
    assert!(last.message.contains("too large"));
}

#[tokio::test]
async fn transport_error_is_logged_and_notified() {
    let dispatcher = ScriptedDispatcher::new(vec![
        Err(DispatchError::Transport {
            code: 50013,
            message: "Missing Permissions".to_string(),
        }),
        Ok(()),
    ]);
    let log = ProgressLog::detached();

    let outcome = dispatch_bundles(&dispatcher, &bundles(&["a", "b"]), HINT, &log).await;

    assert_eq!(outcome, DispatchOutcome { sent: 1, failed: 1 });
    assert_eq!(
        dispatcher.calls(),
        vec![
            Call::Send("a".to_string()),
            Call::Notify(format!("discord error (50013): Missing Permissions\n{HINT}")),
            Call::Send("b".to_string()),
        ]
    );
    assert_eq!(
        log.errors(),
        vec!["discord error (50013): Missing Permissions".to_string()]
    );
}
