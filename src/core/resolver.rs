//! Resolution of versioned PDF files to absolute URLs
//!
//! A file is only handed out once a HEAD probe has confirmed it exists. The
//! resolver performs exactly one probe per call and neither retries nor caches;
//! both belong to the caller.

use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;

use super::transport::TransportError;

/// Default prefix under which the web server exposes the mock files
pub const DEFAULT_WEB_PREFIX: &str = "/web";

/// Existence check against a path rooted at the server origin
#[async_trait]
pub trait Probe: Send + Sync {
    /// Issue a metadata-only request and report the response status
    async fn probe(&self, path: &str) -> Result<u16, TransportError>;
}

/// Path scheme for versioned mock data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePaths {
    web_prefix: String,
}

impl Default for FilePaths {
    fn default() -> Self {
        Self::new(DEFAULT_WEB_PREFIX)
    }
}

impl FilePaths {
    pub fn new(web_prefix: &str) -> Self {
        Self {
            web_prefix: web_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// `/mocks/v{version}/data.json`
    pub fn dataset(&self, version: &str) -> String {
        format!("/mocks/v{version}/data.json")
    }

    /// `/mocks/v{version}/{filename}.pdf`
    pub fn pdf(&self, version: &str, filename: &str) -> String {
        format!("/mocks/v{version}/{filename}.pdf")
    }

    /// The PDF path as served, e.g. `/web/mocks/v1/2.pdf`
    pub fn served_pdf(&self, version: &str, filename: &str) -> String {
        format!("{}{}", self.web_prefix, self.pdf(version, filename))
    }
}

/// A file confirmed to exist, with the URL it can be fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub version: String,
    pub filename: String,
    pub url: Url,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// The probe was answered and the file is not there
    #[error("file not found: {path} (status {status})")]
    NotFound { path: String, status: u16 },

    /// The probe itself failed, so existence is unknown
    #[error("could not check {path}")]
    ResolutionFailed {
        path: String,
        #[source]
        source: TransportError,
    },

    #[error("invalid file request: {0}")]
    InvalidInput(String),
}

impl ResolveError {
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::NotFound { path, .. } | Self::ResolutionFailed { path, .. } => Some(path),
            Self::InvalidInput(_) => None,
        }
    }

    /// Only a failed check is worth repeating; a missing file stays missing
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ResolutionFailed { .. })
    }

    /// Short message for the viewer panel
    pub fn user_message(&self) -> &str {
        match self {
            Self::NotFound { .. } => "This file is missing from the dataset.",
            Self::ResolutionFailed { .. } => "Could not reach the server to check this file.",
            Self::InvalidInput(_) => "No file selected.",
        }
    }
}

/// Turns `(version, filename)` into a [`ResolvedFile`]
pub struct FileResolver<P> {
    probe: P,
    origin: Url,
    paths: FilePaths,
}

impl<P: Probe> FileResolver<P> {
    pub fn new(probe: P, origin: Url, paths: FilePaths) -> Self {
        Self {
            probe,
            origin,
            paths,
        }
    }

    /// Probe the served path and return its absolute URL if the file exists
    pub async fn resolve(&self, version: &str, filename: &str) -> Result<ResolvedFile, ResolveError> {
        if version.is_empty() {
            return Err(ResolveError::InvalidInput("empty version".to_string()));
        }
        if filename.is_empty() {
            return Err(ResolveError::InvalidInput("empty filename".to_string()));
        }

        let path = self.paths.served_pdf(version, filename);
        tracing::debug!("Probing {}", path);

        let status = match self.probe.probe(&path).await {
            Ok(status) => status,
            Err(source) => {
                tracing::warn!("Probe for {} failed: {}", path, source);
                return Err(ResolveError::ResolutionFailed { path, source });
            }
        };
        if !(200..300).contains(&status) {
            return Err(ResolveError::NotFound { path, status });
        }

        let url = match self.origin.join(&path) {
            Ok(url) => url,
            Err(e) => {
                let source = TransportError::InvalidUrl {
                    url: path.clone(),
                    message: e.to_string(),
                };
                return Err(ResolveError::ResolutionFailed { path, source });
            }
        };

        Ok(ResolvedFile {
            version: version.to_string(),
            filename: filename.to_string(),
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory probe answering from a fixed table; unknown paths are 404
    #[derive(Default)]
    struct FakeProbe {
        answers: HashMap<String, Result<u16, TransportError>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeProbe {
        fn with(mut self, path: &str, answer: Result<u16, TransportError>) -> Self {
            self.answers.insert(path.to_string(), answer);
            self
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Probe for FakeProbe {
        async fn probe(&self, path: &str) -> Result<u16, TransportError> {
            self.calls.lock().unwrap().push(path.to_string());
            self.answers.get(path).cloned().unwrap_or(Ok(404))
        }
    }

    fn resolver(probe: FakeProbe) -> FileResolver<FakeProbe> {
        let origin = Url::parse("http://localhost:5173").unwrap();
        FileResolver::new(probe, origin, FilePaths::default())
    }

    #[test]
    fn test_path_scheme() {
        let paths = FilePaths::new("/web/");
        assert_eq!(paths.dataset("2"), "/mocks/v2/data.json");
        assert_eq!(paths.pdf("1", "2"), "/mocks/v1/2.pdf");
        assert_eq!(paths.served_pdf("1", "2"), "/web/mocks/v1/2.pdf");
    }

    #[tokio::test]
    async fn test_existing_file_resolves_to_absolute_url() {
        let resolver = resolver(FakeProbe::default().with("/web/mocks/v1/2.pdf", Ok(200)));

        let file = resolver.resolve("1", "2").await.unwrap();
        assert_eq!(file.url.as_str(), "http://localhost:5173/web/mocks/v1/2.pdf");
        assert!(file.url.path().ends_with("/web/mocks/v1/2.pdf"));
        assert_eq!(file.version, "1");
        assert_eq!(file.filename, "2");
        assert_eq!(resolver.probe.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found_with_path() {
        let resolver = resolver(FakeProbe::default());

        let err = resolver.resolve("1", "999").await.unwrap_err();
        assert_eq!(
            err,
            ResolveError::NotFound {
                path: "/web/mocks/v1/999.pdf".to_string(),
                status: 404,
            }
        );
        assert!(!err.is_retryable());
        assert_eq!(err.path(), Some("/web/mocks/v1/999.pdf"));
    }

    #[tokio::test]
    async fn test_server_error_status_is_not_found() {
        let resolver = resolver(FakeProbe::default().with("/web/mocks/v3/1.pdf", Ok(500)));

        let err = resolver.resolve("3", "1").await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_network_failure_is_distinct_from_not_found() {
        let failure = TransportError::Connectivity {
            path: "/web/mocks/v1/2.pdf".to_string(),
            message: "connection refused".to_string(),
        };
        let resolver = resolver(FakeProbe::default().with("/web/mocks/v1/2.pdf", Err(failure.clone())));

        let err = resolver.resolve("1", "2").await.unwrap_err();
        match &err {
            ResolveError::ResolutionFailed { path, source } => {
                assert_eq!(path, "/web/mocks/v1/2.pdf");
                assert_eq!(source, &failure);
            }
            other => panic!("expected ResolutionFailed, got {other:?}"),
        }
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_input_skips_probe() {
        let resolver = resolver(FakeProbe::default());

        assert!(matches!(
            resolver.resolve("", "2").await,
            Err(ResolveError::InvalidInput(_))
        ));
        assert!(matches!(
            resolver.resolve("1", "").await,
            Err(ResolveError::InvalidInput(_))
        ));
        assert_eq!(resolver.probe.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_caching_between_calls() {
        let resolver = resolver(FakeProbe::default().with("/web/mocks/v1/2.pdf", Ok(200)));

        resolver.resolve("1", "2").await.unwrap();
        resolver.resolve("1", "2").await.unwrap();
        assert_eq!(resolver.probe.call_count(), 2);
    }
}
