use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::ApiError;

/// Blocking HTTP session against the v3 API.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    base_url: Url,
    headers: Vec<(String, String)>,
}

impl Session {
    /// Create a session for the API at `base_url` (e.g. `https://tc.example.com/api`).
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client: Client::new(),
            base_url,
            headers: Vec::new(),
        })
    }

    /// Add a header sent with every request, e.g. `Authorization`.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path (`/v3/tags/12`) against the base url.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.headers
            .iter()
            .fold(self.client.request(method, url), |r, (k, v)| {
                r.header(k.as_str(), v.as_str())
            })
    }

    /// Send a request and return the decoded JSON body.
    ///
    /// An empty body decodes to `Value::Null`.
    pub fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value, ApiError> {
        debug!(method = %method, url = %url, "API request");
        let mut request = self.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(ApiError::Status {
                code: status.as_u16(),
                body: text,
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
