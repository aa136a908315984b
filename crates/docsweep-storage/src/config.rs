//! Storage Configuration
//!
//! Selects the object store backing every bucket and log:
//!
//! - **memory**: `object_store::memory::InMemory`, lost on exit (tests, demos)
//! - **local**: `LocalFileSystem` rooted at `local_root`
//! - **s3**: one S3 (or S3-compatible, e.g. localstack/MinIO) bucket;
//!   docsweep buckets and logs are prefixes inside it
//!
//! ## Usage
//!
//! ```ignore
//! let config = StoreConfig {
//!     backend: StoreBackend::S3,
//!     endpoint: Some("http://localstack:4566".to_string()),
//!     allow_http: true,
//!     ..Default::default()
//! };
//! let stores = Stores::from_config(&config)?;
//! let staging = stores.bucket("temp")?;
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::error::{Error, Result};
use crate::log::ObjectStoreLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    Local,
    S3,
}

impl FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "local" => Ok(StoreBackend::Local),
            "s3" => Ok(StoreBackend::S3),
            other => Err(Error::Config(format!(
                "unknown store backend '{}': expected memory, local or s3",
                other
            ))),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Local => write!(f, "local"),
            StoreBackend::S3 => write!(f, "s3"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Root directory for the local backend (default: ./data/storage)
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,

    /// S3 bucket holding all docsweep prefixes (default: docsweep)
    #[serde(default = "default_s3_bucket")]
    pub s3_bucket: String,

    /// Optional S3 endpoint (for localstack/MinIO)
    pub endpoint: Option<String>,

    /// S3 region (default: us-east-1)
    #[serde(default = "default_region")]
    pub region: String,

    pub access_key_id: Option<String>,

    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,

    /// Allow plain-HTTP endpoints
    #[serde(default)]
    pub allow_http: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            local_root: default_local_root(),
            s3_bucket: default_s3_bucket(),
            endpoint: None,
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
            allow_http: false,
        }
    }
}

fn default_local_root() -> PathBuf {
    PathBuf::from("./data/storage")
}

fn default_s3_bucket() -> String {
    "docsweep".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Shared root store from which buckets and logs are carved.
#[derive(Debug, Clone)]
pub struct Stores {
    root: Arc<dyn ObjectStore>,
}

impl Stores {
    pub fn new(root: Arc<dyn ObjectStore>) -> Self {
        Self { root }
    }

    /// Build the root store for the configured backend.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let root: Arc<dyn ObjectStore> = match config.backend {
            StoreBackend::Memory => Arc::new(InMemory::new()),
            StoreBackend::Local => {
                std::fs::create_dir_all(&config.local_root).map_err(|e| {
                    Error::Config(format!(
                        "cannot create local root {}: {}",
                        config.local_root.display(),
                        e
                    ))
                })?;
                Arc::new(LocalFileSystem::new_with_prefix(&config.local_root)?)
            }
            StoreBackend::S3 => {
                let mut builder = AmazonS3Builder::from_env()
                    .with_bucket_name(&config.s3_bucket)
                    .with_region(&config.region)
                    .with_allow_http(config.allow_http);
                if let Some(endpoint) = &config.endpoint {
                    builder = builder.with_endpoint(endpoint);
                }
                if let Some(key_id) = &config.access_key_id {
                    builder = builder.with_access_key_id(key_id);
                }
                if let Some(secret) = &config.secret_access_key {
                    builder = builder.with_secret_access_key(secret);
                }
                Arc::new(
                    builder
                        .build()
                        .map_err(|e| Error::Config(format!("invalid S3 configuration: {}", e)))?,
                )
            }
        };

        tracing::info!(backend = %config.backend, "Object store initialized");
        Ok(Self { root })
    }

    pub fn root(&self) -> Arc<dyn ObjectStore> {
        self.root.clone()
    }

    pub fn bucket(&self, name: &str) -> Result<Bucket> {
        Bucket::new(self.root.clone(), name)
    }

    pub fn log(&self) -> ObjectStoreLog {
        ObjectStoreLog::new(self.root.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogClient;
    use bytes::Bytes;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("LOCAL".parse::<StoreBackend>().unwrap(), StoreBackend::Local);
        assert_eq!("s3".parse::<StoreBackend>().unwrap(), StoreBackend::S3);
        assert!("gcs".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.backend, StoreBackend::Local);
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.s3_bucket, "docsweep");
        assert!(!config.allow_http);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"backend":"s3","endpoint":"http://localstack:4566"}"#).unwrap();
        assert_eq!(config.backend, StoreBackend::S3);
        assert_eq!(config.endpoint.as_deref(), Some("http://localstack:4566"));
        assert_eq!(config.local_root, PathBuf::from("./data/storage"));
    }

    #[test]
    fn test_secret_not_serialized() {
        let config = StoreConfig {
            secret_access_key: Some("hunter2".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_local_backend_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            backend: StoreBackend::Local,
            local_root: dir.path().join("storage"),
            ..Default::default()
        };

        let first = Stores::from_config(&config).unwrap();
        first.bucket("temp").unwrap().put("r1.json", Bytes::from_static(b"{}")).await.unwrap();
        first.log().create_log("MyStream").await.unwrap();

        let second = Stores::from_config(&config).unwrap();
        assert_eq!(
            second.bucket("temp").unwrap().list_keys().await.unwrap(),
            vec!["r1.json".to_string()]
        );
        assert!(second.log().open("MyStream").await.is_ok());
    }

    #[test]
    fn test_s3_backend_builds_with_endpoint() {
        let config = StoreConfig {
            backend: StoreBackend::S3,
            endpoint: Some("http://localstack:4566".to_string()),
            access_key_id: Some("test".to_string()),
            secret_access_key: Some("test".to_string()),
            allow_http: true,
            ..Default::default()
        };
        assert!(Stores::from_config(&config).is_ok());
    }
}
