use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{MetricsError, Result};

/// How a provider expects the credential to be presented.
#[derive(Debug, Clone)]
pub enum Credential {
    /// `Authorization: Bearer <token>`
    Bearer(Token),
    /// Token sent verbatim in a provider-specific header
    Header(&'static str, Token),
}

/// Thin JSON-over-HTTP client shared by the providers.
///
/// Requests are issued one at a time and never retried; any transport
/// failure or non-success status is returned to the caller.
pub struct ApiClient {
    client: Client,
    api_url: Url,
    credential: Credential,
}

impl ApiClient {
    pub fn new(base_url: &str, accept: &'static str, credential: Credential) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(accept));

        let client = Client::builder()
            .user_agent(concat!("engmetrics/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| MetricsError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_base_url(base_url)?,
            credential,
        })
    }

    /// Helper to build authenticated requests
    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credential {
            Credential::Bearer(token) => request.bearer_auth(token.as_str()),
            Credential::Header(name, token) => request.header(*name, token.as_str()),
        }
    }

    /// Construct an endpoint URL relative to the API root
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.api_url
            .join(path)
            .map_err(|e| MetricsError::Config(format!("Invalid endpoint URL '{path}': {e}")))
    }

    /// GET `path` with `query` and decode the JSON body into `T`.
    ///
    /// `context` names the resource in error messages (e.g., "pull request #12").
    pub async fn get_json<T>(&self, path: &str, query: &[(&str, String)], context: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("GET {url} {query:?}");

        let response = self
            .auth_request(self.client.get(url).query(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(MetricsError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| MetricsError::Decode {
            context: context.to_string(),
            source,
        })
    }
}

/// Parses a base URL, making sure relative joins append to its path.
fn api_base_url(base_url: &str) -> Result<Url> {
    let mut url =
        Url::parse(base_url).map_err(|e| MetricsError::Config(format!("Invalid base URL: {e}")))?;

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
