mod basic;
mod client;
mod url_param;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use url_param::UrlParam;

use url::Url;

/// Issues a single GET through `client`. Status handling is left to the caller.
pub async fn get<C: HttpClient + ?Sized>(
    client: &C,
    url: &Url,
) -> reqwest::Result<reqwest::Response> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.clone());
    client.execute(req).await
}

#[cfg(test)]
pub(crate) mod fake;
