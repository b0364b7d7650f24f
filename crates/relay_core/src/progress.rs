use std::sync::{Arc, Mutex, MutexGuard};

use relay_logging::{relay_error, relay_info, relay_warn};

/// Receives the full transcript every time an entry is appended.
pub trait ProgressObserver: Send + Sync {
    fn publish(&self, transcript: &str);
}

/// Observer that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn publish(&self, _transcript: &str) {}
}

/// Produces the timestamp printed in front of each entry.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: EntryLevel,
    pub message: String,
}

impl LogEntry {
    pub fn render(&self) -> String {
        match self.level {
            EntryLevel::Info => format!("[{}] {}", self.timestamp, self.message),
            EntryLevel::Warn => format!("[{}] warn: {}", self.timestamp, self.message),
            EntryLevel::Error => format!("[{}] error: {}", self.timestamp, self.message),
        }
    }
}

#[derive(Default)]
struct Transcript {
    entries: Vec<LogEntry>,
    errors: Vec<String>,
}

impl Transcript {
    fn render(&self) -> String {
        self.entries
            .iter()
            .map(LogEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Append-only transcript of one request, republished on every append.
///
/// Methods take `&self` so concurrently resolving pages can share one log.
/// Entries from a single caller keep their order; entries from different
/// callers may interleave.
pub struct ProgressLog {
    observer: Box<dyn ProgressObserver>,
    clock: Clock,
    state: Mutex<Transcript>,
}

impl ProgressLog {
    pub fn new(observer: impl ProgressObserver + 'static) -> Self {
        Self::with_clock(
            observer,
            Arc::new(|| chrono::Utc::now().format("%H:%M:%S").to_string()),
        )
    }

    pub fn with_clock(observer: impl ProgressObserver + 'static, clock: Clock) -> Self {
        Self {
            observer: Box::new(observer),
            clock,
            state: Mutex::new(Transcript::default()),
        }
    }

    /// A log nobody watches; entries still reach the process log.
    pub fn detached() -> Self {
        Self::new(NullObserver)
    }

    pub fn log(&self, message: impl Into<String>) {
        self.append(EntryLevel::Info, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.append(EntryLevel::Warn, message.into());
    }

    /// Records an error that will also appear in the final reply.
    pub fn error(&self, message: impl Into<String>) {
        self.append(EntryLevel::Error, message.into());
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().entries.clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lock().errors.clone()
    }

    pub fn error_count(&self) -> usize {
        self.lock().errors.len()
    }

    pub fn transcript(&self) -> String {
        self.lock().render()
    }

    /// Ends the request and hands back the accumulated error lines.
    pub fn finish(self) -> Vec<String> {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.errors
    }

    fn append(&self, level: EntryLevel, message: String) {
        match level {
            EntryLevel::Info => relay_info!("{}", message),
            EntryLevel::Warn => relay_warn!("{}", message),
            EntryLevel::Error => relay_error!("{}", message),
        }

        let entry = LogEntry {
            timestamp: (self.clock)(),
            level,
            message,
        };

        // Publishing under the lock keeps observer updates in append order.
        let mut state = self.lock();
        if level == EntryLevel::Error {
            state.errors.push(entry.message.clone());
        }
        state.entries.push(entry);
        let transcript = state.render();
        self.observer.publish(&transcript);
    }

    fn lock(&self) -> MutexGuard<'_, Transcript> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
