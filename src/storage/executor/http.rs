//! SurrealDB HTTP executor.
//!
//! Sends rendered queries to the `/sql` endpoint of a SurrealDB server. The
//! endpoint executes every statement in the body and answers with one
//! `{ status, time, result }` object per statement.

use crate::config::ConnectionConfig;
use crate::storage::surrealql::Query;
use crate::storage::traits::{QueryExecutor, Response, StatementResult};
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use std::time::{Duration, Instant};

/// Executes queries against a SurrealDB server over HTTP.
pub struct HttpExecutor {
    /// Server base URL, without a trailing slash.
    endpoint: String,
    /// Namespace sent with every request.
    namespace: String,
    /// Database sent with every request.
    database: String,
    /// Optional basic-auth credentials.
    credentials: Option<(String, SecretString)>,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl HttpExecutor {
    /// Default server endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "http://localhost:8000";

    /// Default request timeout in milliseconds.
    pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

    /// Default connect timeout in milliseconds.
    pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_000;

    /// Creates an executor for `namespace`/`database` on `endpoint`.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        namespace: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            namespace: namespace.into(),
            database: database.into(),
            credentials: None,
            client: build_http_client(Self::DEFAULT_TIMEOUT_MS, Self::DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }

    /// Creates an executor from connection settings.
    #[must_use]
    pub fn from_config(config: &ConnectionConfig) -> Self {
        let mut executor = Self::new(&config.endpoint, &config.namespace, &config.database)
            .with_timeouts(config.timeout_ms, config.connect_timeout_ms);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            executor = executor.with_credentials(username.clone(), password.clone());
        }
        executor
    }

    /// Sets basic-auth credentials.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: SecretString) -> Self {
        self.credentials = Some((username.into(), password));
        self
    }

    /// Sets request and connect timeouts. Zero disables a timeout.
    #[must_use]
    pub fn with_timeouts(mut self, timeout_ms: u64, connect_timeout_ms: u64) -> Self {
        self.client = build_http_client(timeout_ms, connect_timeout_ms);
        self
    }

    /// Returns the server endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Checks if the server answers its health endpoint.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/health", self.endpoint))
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

impl QueryExecutor for HttpExecutor {
    fn execute(&self, query: &Query) -> Result<Response> {
        let text = query.to_string();
        tracing::debug!(
            endpoint = %self.endpoint,
            statements = query.len(),
            query = %text,
            "Executing SurrealQL"
        );
        let start = Instant::now();

        let mut request = self
            .client
            .post(format!("{}/sql", self.endpoint))
            .header("Accept", "application/json")
            .header("surreal-ns", &self.namespace)
            .header("surreal-db", &self.database)
            .header("NS", &self.namespace)
            .header("DB", &self.database)
            .body(text);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password.expose_secret()));
        }

        let response = request.send().map_err(|e| {
            let error_kind = if e.is_timeout() {
                "timeout"
            } else if e.is_connect() {
                "connect"
            } else if e.is_request() {
                "request"
            } else {
                "unknown"
            };
            tracing::error!(
                endpoint = %self.endpoint,
                error = %e,
                error_kind = error_kind,
                is_timeout = e.is_timeout(),
                is_connect = e.is_connect(),
                "SurrealDB request failed"
            );
            metrics::counter!("surrealvec_http_errors_total", "kind" => error_kind).increment(1);
            Error::ExecutionFailure {
                operation: "surrealdb_request".to_string(),
                cause: format!("{error_kind} error: {e}"),
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            tracing::error!(
                endpoint = %self.endpoint,
                status = %status,
                body = %body,
                "SurrealDB returned error status"
            );
            metrics::counter!("surrealvec_http_errors_total", "kind" => "status").increment(1);
            return Err(Error::ExecutionFailure {
                operation: "surrealdb_request".to_string(),
                cause: format!("server returned status: {status} - {body}"),
            });
        }

        let results: Vec<StatementResult> = response.json().map_err(|e| {
            tracing::error!(endpoint = %self.endpoint, error = %e, "Failed to parse SurrealDB response");
            Error::ExecutionFailure {
                operation: "surrealdb_response".to_string(),
                cause: e.to_string(),
            }
        })?;

        metrics::histogram!("surrealvec_http_request_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);

        if results.len() != query.len() {
            tracing::warn!(
                expected = query.len(),
                received = results.len(),
                "SurrealDB returned an unexpected number of statement results"
            );
        }
        Ok(Response::new(results))
    }
}

/// Builds a blocking HTTP client with the given timeouts.
fn build_http_client(timeout_ms: u64, connect_timeout_ms: u64) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(timeout_ms));
    }
    if connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build SurrealDB HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}
