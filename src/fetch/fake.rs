//! Canned-response client for unit tests.

use super::client::HttpClient;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves registered bodies by exact URL and answers 404 for everything else.
/// Every request is recorded so tests can assert on network traffic.
#[derive(Default)]
pub struct FakeClient {
    routes: HashMap<String, (u16, Vec<u8>)>,
    calls: Mutex<Vec<String>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.routes.insert(url.to_string(), (status, body.into()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for FakeClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let url = req.url().to_string();
        self.calls.lock().unwrap().push(url.clone());
        let (status, body) = self
            .routes
            .get(&url)
            .cloned()
            .unwrap_or((404, b"not found".to_vec()));
        let resp = http::Response::builder()
            .status(status)
            .body(body)
            .unwrap();
        Ok(reqwest::Response::from(resp))
    }
}
