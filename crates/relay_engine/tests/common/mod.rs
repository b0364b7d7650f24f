#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use relay_engine::{FetchError, FetchMetadata, FetchOutput, FetchRequest, Fetcher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFetch {
    pub url: String,
    pub referer: Option<String>,
    pub max_bytes: Option<u64>,
}

/// Serves generated bodies of a given length per URL; unknown URLs are 404s.
#[derive(Default)]
pub struct FakeFetcher {
    responses: HashMap<String, Result<usize, FetchError>>,
    requests: Arc<Mutex<Vec<RecordedFetch>>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: impl Into<String>, len: usize) -> Self {
        self.responses.insert(url.into(), Ok(len));
        self
    }

    pub fn with_error(mut self, url: impl Into<String>, err: FetchError) -> Self {
        self.responses.insert(url.into(), Err(err));
        self
    }

    pub fn requests(&self) -> Vec<RecordedFetch> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait::async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, request: FetchRequest<'_>) -> Result<FetchOutput, FetchError> {
        self.requests.lock().unwrap().push(RecordedFetch {
            url: request.url.to_string(),
            referer: request.referer.map(str::to_string),
            max_bytes: request.max_bytes,
        });
        match self.responses.get(request.url) {
            Some(Ok(len)) => Ok(FetchOutput {
                bytes: vec![0xAB; *len],
                metadata: FetchMetadata {
                    original_url: request.url.to_string(),
                    final_url: request.url.to_string(),
                    content_type: None,
                    byte_len: *len as u64,
                },
            }),
            Some(Err(err)) => Err(err.clone()),
            None => Err(FetchError::new(
                relay_engine::FailureKind::HttpStatus(404),
                "404 Not Found",
            )),
        }
    }
}

pub const MB: usize = 1024 * 1024;

pub fn pximg(kind: &str, page: usize, suffix: &str) -> String {
    format!("https://i.pximg.net/{kind}/img/2024/01/02/03/04/05/12345_p{page}{suffix}")
}
