//! Configuration management.
//!
//! Configuration is read from a TOML file and then overlaid with `SURREALVEC_*`
//! environment variables:
//!
//! ```toml
//! [store]
//! table_name = "docs"
//! distance = "euclidean"
//! initialize_schema = true
//!
//! [connection]
//! endpoint = "http://localhost:8000"
//! namespace = "ai"
//! database = "vectors"
//!
//! [logging]
//! format = "json"
//! ```

use crate::storage::surrealql::{Algorithm, Distance, UpsertMode, VectorType};
use crate::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration for surrealvec.
#[derive(Debug, Clone, Default)]
pub struct SurrealvecConfig {
    /// Vector store settings.
    pub store: VectorStoreConfig,
    /// SurrealDB connection settings.
    pub connection: ConnectionConfig,
    /// Raw logging settings, resolved by the observability module.
    pub logging: LoggingSettings,
}

/// Settings of a [`SurrealVectorStore`](crate::SurrealVectorStore).
///
/// Names are validated as identifiers when the store is built, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorStoreConfig {
    /// Name of the vector index.
    pub index_name: String,
    /// Table holding the documents.
    pub table_name: String,
    /// Field holding the document text.
    pub content_field_name: String,
    /// Field holding the embedding.
    pub embedding_field_name: String,
    /// Element type of stored vectors.
    pub vector_type: VectorType,
    /// Distance metric of the index and of scoring.
    pub distance: Distance,
    /// Index algorithm.
    pub algorithm: Algorithm,
    /// HNSW search breadth.
    pub ef: usize,
    /// How upserts write a record.
    pub upsert_mode: UpsertMode,
    /// Whether to define the index when the store is built.
    pub initialize_schema: bool,
    /// HNSW construction breadth (`EFC`), server default when absent.
    pub efc: Option<usize>,
    /// HNSW links per node (`M`), server default when absent.
    pub m: Option<usize>,
}

impl VectorStoreConfig {
    /// Default index name.
    pub const DEFAULT_INDEX_NAME: &'static str = "surrealvec_index";
    /// Default table name.
    pub const DEFAULT_TABLE_NAME: &'static str = "surrealvec_embedding";
    /// Default content field.
    pub const DEFAULT_CONTENT_FIELD_NAME: &'static str = "content";
    /// Default embedding field.
    pub const DEFAULT_EMBEDDING_FIELD_NAME: &'static str = "embedding";
    /// Default HNSW search breadth.
    pub const DEFAULT_EF: usize = 100;
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            index_name: Self::DEFAULT_INDEX_NAME.to_string(),
            table_name: Self::DEFAULT_TABLE_NAME.to_string(),
            content_field_name: Self::DEFAULT_CONTENT_FIELD_NAME.to_string(),
            embedding_field_name: Self::DEFAULT_EMBEDDING_FIELD_NAME.to_string(),
            vector_type: VectorType::default(),
            distance: Distance::default(),
            algorithm: Algorithm::default(),
            ef: Self::DEFAULT_EF,
            upsert_mode: UpsertMode::default(),
            initialize_schema: false,
            efc: None,
            m: None,
        }
    }
}

/// SurrealDB connection settings.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server base URL.
    pub endpoint: String,
    /// Namespace.
    pub namespace: String,
    /// Database.
    pub database: String,
    /// Basic-auth user.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<SecretString>,
    /// Request timeout in milliseconds (0 disables).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 disables).
    pub connect_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: crate::storage::executor::HttpExecutor::DEFAULT_ENDPOINT.to_string(),
            namespace: "surrealvec".to_string(),
            database: "surrealvec".to_string(),
            username: None,
            password: None,
            timeout_ms: crate::storage::executor::HttpExecutor::DEFAULT_TIMEOUT_MS,
            connect_timeout_ms: crate::storage::executor::HttpExecutor::DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

/// Logging section, kept as raw strings until observability resolves it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Filter directive such as `info` or `surrealvec=debug`.
    pub level: Option<String>,
    /// Log file path; stderr when absent.
    pub file: Option<String>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Store section.
    pub store: Option<ConfigFileStore>,
    /// Connection section.
    pub connection: Option<ConfigFileConnection>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

/// Store section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileStore {
    /// Index name.
    pub index_name: Option<String>,
    /// Table name.
    pub table_name: Option<String>,
    /// Content field.
    pub content_field_name: Option<String>,
    /// Embedding field.
    pub embedding_field_name: Option<String>,
    /// Vector element type.
    pub vector_type: Option<VectorType>,
    /// Distance metric.
    pub distance: Option<Distance>,
    /// Index algorithm.
    pub algorithm: Option<Algorithm>,
    /// HNSW search breadth.
    pub ef: Option<usize>,
    /// Upsert mode.
    pub upsert_mode: Option<UpsertMode>,
    /// Schema initialization flag.
    pub initialize_schema: Option<bool>,
    /// HNSW construction breadth.
    pub efc: Option<usize>,
    /// HNSW links per node.
    pub m: Option<usize>,
}

/// Connection section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileConnection {
    /// Endpoint.
    pub endpoint: Option<String>,
    /// Namespace.
    pub namespace: Option<String>,
    /// Database.
    pub database: Option<String>,
    /// User.
    pub username: Option<String>,
    /// Password, wrapped in a [`SecretString`] on load.
    pub password: Option<String>,
    /// Request timeout.
    pub timeout_ms: Option<u64>,
    /// Connect timeout.
    pub connect_timeout_ms: Option<u64>,
}

impl SurrealvecConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ExecutionFailure {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Self::parse(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the text is not a valid config file.
    pub fn parse(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| Error::InvalidInput(format!("invalid config file: {e}")))?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/surrealvec/` on macOS)
    /// 2. XDG config dir (`~/.config/surrealvec/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        for path in Self::default_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(&path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Candidate config file locations, in lookup order.
    #[must_use]
    pub fn default_paths() -> Vec<PathBuf> {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Vec::new();
        };

        let platform_config = base_dirs
            .config_dir()
            .join("surrealvec")
            .join("config.toml");
        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("surrealvec")
            .join("config.toml");

        if platform_config == xdg_config {
            vec![platform_config]
        } else {
            vec![platform_config, xdg_config]
        }
    }

    /// Overlays `SURREALVEC_*` environment variables.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlays values returned by `lookup` for the `SURREALVEC_*` keys.
    ///
    /// Unparsable numeric or enum values are ignored with a warning.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SURREALVEC_ENDPOINT") {
            self.connection.endpoint = v;
        }
        if let Some(v) = get("SURREALVEC_NAMESPACE") {
            self.connection.namespace = v;
        }
        if let Some(v) = get("SURREALVEC_DATABASE") {
            self.connection.database = v;
        }
        if let Some(v) = get("SURREALVEC_USERNAME") {
            self.connection.username = Some(v);
        }
        if let Some(v) = get("SURREALVEC_PASSWORD") {
            self.connection.password = Some(SecretString::from(v));
        }
        if let Some(v) = get("SURREALVEC_INDEX_NAME") {
            self.store.index_name = v;
        }
        if let Some(v) = get("SURREALVEC_TABLE_NAME") {
            self.store.table_name = v;
        }
        if let Some(v) = get("SURREALVEC_DISTANCE") {
            apply_parsed("SURREALVEC_DISTANCE", &v, &mut self.store.distance);
        }
        if let Some(v) = get("SURREALVEC_ALGORITHM") {
            apply_parsed("SURREALVEC_ALGORITHM", &v, &mut self.store.algorithm);
        }
        if let Some(v) = get("SURREALVEC_EF") {
            apply_parsed("SURREALVEC_EF", &v, &mut self.store.ef);
        }
        if let Some(v) = get("SURREALVEC_INITIALIZE_SCHEMA") {
            apply_parsed(
                "SURREALVEC_INITIALIZE_SCHEMA",
                &v,
                &mut self.store.initialize_schema,
            );
        }

        self
    }

    /// Converts a `ConfigFile` to `SurrealvecConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(store) = file.store {
            let target = &mut config.store;
            if let Some(v) = store.index_name {
                target.index_name = v;
            }
            if let Some(v) = store.table_name {
                target.table_name = v;
            }
            if let Some(v) = store.content_field_name {
                target.content_field_name = v;
            }
            if let Some(v) = store.embedding_field_name {
                target.embedding_field_name = v;
            }
            if let Some(v) = store.vector_type {
                target.vector_type = v;
            }
            if let Some(v) = store.distance {
                target.distance = v;
            }
            if let Some(v) = store.algorithm {
                target.algorithm = v;
            }
            if let Some(v) = store.ef {
                target.ef = v;
            }
            if let Some(v) = store.upsert_mode {
                target.upsert_mode = v;
            }
            if let Some(v) = store.initialize_schema {
                target.initialize_schema = v;
            }
            target.efc = store.efc;
            target.m = store.m;
        }
        if let Some(connection) = file.connection {
            let target = &mut config.connection;
            if let Some(v) = connection.endpoint {
                target.endpoint = v;
            }
            if let Some(v) = connection.namespace {
                target.namespace = v;
            }
            if let Some(v) = connection.database {
                target.database = v;
            }
            if let Some(v) = connection.timeout_ms {
                target.timeout_ms = v;
            }
            if let Some(v) = connection.connect_timeout_ms {
                target.connect_timeout_ms = v;
            }
            target.username = connection.username;
            target.password = connection.password.map(SecretString::from);
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        config
    }
}

fn apply_parsed<T: std::str::FromStr>(key: &str, raw: &str, target: &mut T) {
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => tracing::warn!(key, value = raw, "Ignoring unparsable environment override"),
    }
}
