use async_trait::async_trait;
use odl_api::{FetchError, OdlClient};
use serde_json::Value;
use tracing::debug;

/// Source of the JSON documents queries run against.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetches the document behind a controller-relative URI.
    async fn fetch(&self, uri: &str) -> Result<Value, FetchError>;

    /// Human-readable location of the source, used in health messages.
    fn describe(&self) -> String;
}

/// Fetches documents from the controller over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDocumentFetcher {
    client: OdlClient,
}

impl HttpDocumentFetcher {
    pub fn new(client: OdlClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &OdlClient {
        &self.client
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, uri: &str) -> Result<Value, FetchError> {
        debug!(uri, "fetching controller document");
        self.client.get_json(uri).await
    }

    fn describe(&self) -> String {
        self.client.base_url().to_string()
    }
}

/// Serves one fixed document for every URI, e.g. a saved controller response.
#[derive(Debug, Clone)]
pub struct StaticDocumentFetcher {
    document: Value,
    label: String,
}

impl StaticDocumentFetcher {
    pub fn new(document: Value) -> Self {
        Self {
            document,
            label: "static document".to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[async_trait]
impl DocumentFetcher for StaticDocumentFetcher {
    async fn fetch(&self, uri: &str) -> Result<Value, FetchError> {
        debug!(uri, source = %self.label, "serving static document");
        Ok(self.document.clone())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
