//! Minimal JSON-over-HTTP client shared by the fixture and remote adapters.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response, Url};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::application::repos::SourceError;

#[derive(Clone, Debug)]
pub struct JsonClient {
    client: Client,
    base: Url,
}

impl JsonClient {
    pub fn new(base: &Url, timeout: Option<Duration>) -> Result<Self, SourceError> {
        let mut builder = Client::builder().user_agent(Self::user_agent());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|err| SourceError::Transport {
            url: base.to_string(),
            message: err.to_string(),
        })?;

        Ok(Self {
            client,
            base: directory_url(base),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("mosaico/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn url(&self, path: &str) -> Result<Url, SourceError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|err| SourceError::Location(format!("{path}: {err}")))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    pub async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, SourceError> {
        self.request(method, path, Some(body)).await
    }

    /// Issue a DELETE and only check the status; the response body is ignored.
    pub async fn delete(&self, path: &str) -> Result<(), SourceError> {
        let url = self.url(path)?;
        let resp = self
            .client
            .delete(url.clone())
            .send()
            .await
            .map_err(|err| transport(&url, &err))?;
        check_status(&url, &resp)?;
        Ok(())
    }

    async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, SourceError> {
        let url = self.url(path)?;
        debug!(%method, %url, "Sending JSON request");

        let mut req = self.client.request(method, url.clone());
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await.map_err(|err| transport(&url, &err))?;
        Self::handle(&url, resp).await
    }

    async fn handle<T: DeserializeOwned>(url: &Url, resp: Response) -> Result<T, SourceError> {
        check_status(url, &resp)?;

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        // A missing header is accepted.
        if !content_type.is_empty() && !is_json(&content_type) {
            return Err(SourceError::ContentType {
                url: url.to_string(),
                content_type,
            });
        }

        let bytes = resp.bytes().await.map_err(|err| transport(url, &err))?;
        serde_json::from_slice(&bytes).map_err(|err| SourceError::Decode {
            location: url.to_string(),
            message: err.to_string(),
        })
    }
}

/// Ensure the base ends with `/` so relative joins append instead of replace.
fn directory_url(base: &Url) -> Url {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

fn check_status(url: &Url, resp: &Response) -> Result<(), SourceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    Err(SourceError::Status {
        url: url.to_string(),
        status: status.as_u16(),
    })
}

fn transport(url: &Url, err: &reqwest::Error) -> SourceError {
    SourceError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_without_trailing_slash_keeps_its_path() {
        let base = Url::parse("http://localhost:3000/mock-api").expect("url");
        let client = JsonClient::new(&base, None).expect("client");
        assert_eq!(
            client.url("/posts.json").expect("join").as_str(),
            "http://localhost:3000/mock-api/posts.json"
        );
    }

    #[test]
    fn json_content_types_are_recognised() {
        assert!(is_json("application/json; charset=utf-8"));
        assert!(is_json("application/vnd.api+json"));
        assert!(!is_json("text/html"));
        assert!(!is_json(""));
    }
}
