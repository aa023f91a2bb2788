//! HTTP access to the dataset server
//!
//! Responses with a status in [200, 400) are successes and their JSON body is
//! returned. Every other outcome becomes a [`TransportError`] and is handed back
//! to the caller unchanged.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::config::ServerConfig;
use super::resolver::Probe;

/// Failure reported by the HTTP layer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// The server answered with a 4xx status
    #[error("request to {path} was rejected: {message}")]
    Client {
        path: String,
        status: u16,
        message: String,
    },

    /// The server answered with a 5xx status
    #[error("server error for {path}: {message}")]
    Server {
        path: String,
        status: u16,
        message: String,
    },

    /// A status outside every known range
    #[error("unexpected status {status} for {path}")]
    Unexpected { path: String, status: u16 },

    /// No response at all: refused connection, DNS failure or timeout
    #[error("could not reach the server for {path}: {message}")]
    Connectivity { path: String, message: String },

    /// The body did not decode as the expected JSON
    #[error("invalid response body from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl TransportError {
    /// Whether repeating the same request might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Server { .. } | Self::Connectivity { .. })
    }
}

/// Map a response status to success or the matching error
pub fn check_status(path: &str, status: u16) -> Result<(), TransportError> {
    let message = format!("Request failed with status code {status}");
    match status {
        200..=399 => Ok(()),
        400..=499 => Err(TransportError::Client {
            path: path.to_string(),
            status,
            message,
        }),
        500..=u16::MAX => Err(TransportError::Server {
            path: path.to_string(),
            status,
            message,
        }),
        _ => Err(TransportError::Unexpected {
            path: path.to_string(),
            status,
        }),
    }
}

/// Parse an origin such as `http://localhost:5173`
pub fn parse_origin(origin: &str) -> Result<Url, TransportError> {
    Url::parse(origin).map_err(|e| TransportError::InvalidUrl {
        url: origin.to_string(),
        message: e.to_string(),
    })
}

/// JSON client bound to one server origin
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    origin: Url,
    base_path: String,
}

impl HttpClient {
    /// Create a client from the server section of the app config
    pub fn new(config: &ServerConfig) -> Result<Self, TransportError> {
        let origin = parse_origin(&config.origin)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Connectivity {
                path: config.origin.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            origin,
            base_path: config.base_path.trim_end_matches('/').to_string(),
        })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Absolute URL for an application path, below the configured base path
    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.absolute(&format!("{}{}", self.base_path, path))
    }

    /// Absolute URL for a path that is already rooted at the origin
    fn absolute(&self, path: &str) -> Result<Url, TransportError> {
        self.origin.join(path).map_err(|e| TransportError::InvalidUrl {
            url: path.to_string(),
            message: e.to_string(),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let request = self.client.get(self.endpoint(path)?);
        self.send(path, request).await
    }

    #[allow(dead_code)]
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.post(self.endpoint(path)?).json(body);
        self.send(path, request).await
    }

    #[allow(dead_code)]
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.put(self.endpoint(path)?).json(body);
        self.send(path, request).await
    }

    #[allow(dead_code)]
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let request = self.client.delete(self.endpoint(path)?);
        self.send(path, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, TransportError> {
        tracing::debug!("HTTP {}", path);
        let response = request
            .send()
            .await
            .map_err(|e| connectivity(path, &e))?;
        check_status(path, response.status().as_u16())?;

        response.json::<T>().await.map_err(|e| TransportError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

fn connectivity(path: &str, err: &reqwest::Error) -> TransportError {
    TransportError::Connectivity {
        path: path.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl Probe for HttpClient {
    async fn probe(&self, path: &str) -> Result<u16, TransportError> {
        let url = self.absolute(path)?;
        let response = self
            .client
            .request(Method::HEAD, url)
            .send()
            .await
            .map_err(|e| connectivity(path, &e))?;
        Ok(response.status().as_u16())
    }
}
