#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use relay_core::{ProgressLog, ProgressObserver};

/// Records every transcript the log publishes.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    published: Arc<Mutex<Vec<String>>>,
}

impl RecordingObserver {
    pub fn published(&self) -> Vec<String> {
        self.published.lock().unwrap().clone()
    }
}

impl ProgressObserver for RecordingObserver {
    fn publish(&self, transcript: &str) {
        self.published.lock().unwrap().push(transcript.to_string());
    }
}

pub fn fixed_clock_log(observer: RecordingObserver) -> ProgressLog {
    ProgressLog::with_clock(observer, Arc::new(|| "00:00:00".to_string()))
}
