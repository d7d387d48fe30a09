//! REST client for the Anaml API
//!
//! `AnamlApi` is the seam the orchestrator talks through; `HttpClient` is
//! the `reqwest` implementation used in production.

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value as Json;
use url::Url;

use crate::config::ProviderConfig;
use crate::error::{ClientError, ConfigError};

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Truncate a response body for logging
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };
    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Operations the orchestrator needs from the backend
#[async_trait]
pub trait AnamlApi: Send + Sync {
    /// Fetch one object; `None` when the backend does not know it
    async fn get(&self, collection: &str, id: i64) -> Result<Option<Json>, ClientError>;

    /// Create an object and return its new id
    async fn create(&self, collection: &str, body: &Json) -> Result<i64, ClientError>;

    async fn update(&self, collection: &str, id: i64, body: &Json) -> Result<(), ClientError>;

    /// Delete an object; `ClientError::NotFound` when it is already gone
    async fn delete(&self, collection: &str, id: i64) -> Result<(), ClientError>;

    /// Look an object up by its unique name
    async fn find_by_name(&self, collection: &str, name: &str)
    -> Result<Option<Json>, ClientError>;
}

/// HTTP client wrapper for Anaml API calls
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: ProviderConfig,
}

impl HttpClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(concat!("anaml-provider/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ConfigError::Client)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn request(&self, method: reqwest::Method, url: Url) -> RequestBuilder {
        debug!("{} {}", method, url);
        let mut request = self
            .client
            .request(method, url)
            .basic_auth(&self.config.username, Some(&self.config.password));
        if let Some(branch) = &self.config.branch {
            request = request.query(&[("branch", branch)]);
        }
        request
    }

    /// Send a request, returning the status and the raw body
    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, String), ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    fn failure(status: StatusCode, body: String) -> ClientError {
        error!("API error: {} - {}", status, sanitize_for_log(&body));
        ClientError::Status {
            status: status.as_u16(),
            body: sanitize_for_log(&body),
        }
    }

    fn parse(body: &str) -> Result<Json, ClientError> {
        if body.trim().is_empty() {
            return Ok(Json::Null);
        }
        serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AnamlApi for HttpClient {
    async fn get(&self, collection: &str, id: i64) -> Result<Option<Json>, ClientError> {
        let url = self.config.object_url(collection, id);
        let (status, body) = self.send(self.request(reqwest::Method::GET, url)).await?;
        match status {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Self::parse(&body).map(Some),
            s => Err(Self::failure(s, body)),
        }
    }

    async fn create(&self, collection: &str, body: &Json) -> Result<i64, ClientError> {
        let url = self.config.collection_url(collection);
        let request = self.request(reqwest::Method::POST, url).json(body);
        let (status, response) = self.send(request).await?;
        if !status.is_success() {
            return Err(Self::failure(status, response));
        }
        let created = Self::parse(&response)?;
        created.get("id").and_then(Json::as_i64).ok_or_else(|| {
            ClientError::Decode(format!(
                "Response to POST {} has no numeric id: {}",
                collection,
                sanitize_for_log(&response)
            ))
        })
    }

    async fn update(&self, collection: &str, id: i64, body: &Json) -> Result<(), ClientError> {
        let url = self.config.object_url(collection, id);
        let request = self.request(reqwest::Method::PUT, url).json(body);
        let (status, response) = self.send(request).await?;
        if !status.is_success() {
            return Err(Self::failure(status, response));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: i64) -> Result<(), ClientError> {
        let url = self.config.object_url(collection, id);
        let (status, body) = self.send(self.request(reqwest::Method::DELETE, url)).await?;
        match status {
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(format!("{}/{}", collection, id))),
            s if s.is_success() => Ok(()),
            s => Err(Self::failure(s, body)),
        }
    }

    async fn find_by_name(
        &self,
        collection: &str,
        name: &str,
    ) -> Result<Option<Json>, ClientError> {
        let url = self.config.collection_url(collection);
        let request = self
            .request(reqwest::Method::GET, url)
            .query(&[("name", name)]);
        let (status, body) = self.send(request).await?;
        match status {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => match Self::parse(&body)? {
                Json::Null => Ok(None),
                Json::Array(items) => Ok(items.into_iter().next()),
                found => Ok(Some(found)),
            },
            s => Err(Self::failure(s, body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_body_is_logged_as_is() {
        assert_eq!(sanitize_for_log("{\"error\": \"nope\"}"), "{\"error\": \"nope\"}");
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(500);
        let logged = sanitize_for_log(&body);
        assert!(logged.starts_with(&"x".repeat(200)));
        assert!(logged.ends_with("[truncated, 500 bytes total]"));
    }

    #[test]
    fn test_control_characters_are_stripped() {
        assert_eq!(sanitize_for_log("line\nbreak\t"), "linebreak");
    }

    #[test]
    fn test_empty_body_parses_to_null() {
        assert_eq!(HttpClient::parse("").unwrap(), Json::Null);
        assert!(matches!(
            HttpClient::parse("<html>"),
            Err(ClientError::Decode(_))
        ));
    }
}
