use async_trait::async_trait;
use reqwest::{Request, Response};

/// The one network seam of the crate. Everything that talks HTTP goes through
/// an implementation of this trait so tests can substitute canned responses.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
