//! Multi-query front door: fetch each query's document, run the pipeline,
//! and collect the outcomes keyed by `refId`.
//!
//! Queries are independent. A query that fails to compile, fetch or extract
//! becomes an error response while the others still produce tables.

use std::sync::Arc;

use odl_api::{FetchError, OdlClient};
use odl_types::{DataResponse, DataSourceSettings, HealthCheckResult, Query, QueryDataResponse};
use tracing::{debug, error, info, warn};

use crate::convert::ConverterRegistry;
use crate::fetch::{DocumentFetcher, HttpDocumentFetcher};
use crate::pipeline::{CompiledQuery, ExtractionOptions};

pub struct DataSource {
    fetcher: Arc<dyn DocumentFetcher>,
    registry: Arc<ConverterRegistry>,
    options: ExtractionOptions,
    settings: DataSourceSettings,
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("source", &self.fetcher.describe())
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("settings", &self.settings)
            .finish()
    }
}

impl DataSource {
    /// Data source talking to the controller named in `settings`.
    pub fn new(settings: DataSourceSettings) -> Result<Self, FetchError> {
        let client = OdlClient::new(&settings)?;
        Ok(Self::with_fetcher(settings, Arc::new(HttpDocumentFetcher::new(client))))
    }

    /// Data source reading documents from any [`DocumentFetcher`].
    pub fn with_fetcher(settings: DataSourceSettings, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self {
            fetcher,
            registry: Arc::new(ConverterRegistry::with_builtins()),
            options: ExtractionOptions::default(),
            settings,
        }
    }

    pub fn with_registry(mut self, registry: ConverterRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_options(mut self, options: ExtractionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn settings(&self) -> &DataSourceSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    /// Runs every query and returns one response per `refId`, in request order.
    /// A repeated `refId` keeps the last query's response.
    pub async fn query_data(&self, queries: &[Query]) -> QueryDataResponse {
        let mut response = QueryDataResponse::default();
        for query in queries {
            let outcome = self.query(query).await;
            if response.responses.insert(query.ref_id.clone(), outcome).is_some() {
                warn!(ref_id = %query.ref_id, "duplicate refId; keeping the later query");
            }
        }
        response
    }

    async fn query(&self, query: &Query) -> DataResponse {
        let compiled = match CompiledQuery::compile(query, &self.registry) {
            Ok(compiled) => compiled,
            Err(error) => {
                warn!(ref_id = %query.ref_id, %error, "query rejected");
                return DataResponse::error(format!("invalid query: {error}"));
            }
        };

        let document = match self.fetcher.fetch(&query.uri).await {
            Ok(document) => document,
            Err(error) => {
                error!(ref_id = %query.ref_id, uri = %query.uri, %error, "document fetch failed");
                return DataResponse::error(format!("fetch failed: {error}"));
            }
        };

        match compiled.execute(&document, &self.options) {
            Ok(table) => {
                debug!(ref_id = %query.ref_id, rows = table.len(), "query served");
                DataResponse::ok(table)
            }
            Err(error) => {
                warn!(ref_id = %query.ref_id, %error, "extraction failed");
                DataResponse::error(error.to_string())
            }
        }
    }

    /// Reports the configured base URL. With a `probe_uri`, also fetches that
    /// document and reports failure if the controller cannot serve it.
    pub async fn check_health(&self, probe_uri: Option<&str>) -> HealthCheckResult {
        if let Err(error) = odl_api::validate_base_url(&self.settings.base_url) {
            return HealthCheckResult::error(error.to_string());
        }

        if let Some(uri) = probe_uri
            && let Err(error) = self.fetcher.fetch(uri).await
        {
            warn!(uri, %error, "health probe failed");
            return HealthCheckResult::error(format!("Data source probe of {uri} failed: {error}"));
        }

        let message = format!("Data source is working. BaseUrl {}", self.settings.base_url);
        info!(source = %self.fetcher.describe(), "{message}");
        HealthCheckResult::ok(message)
    }
}
