//! Shared command-line options.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use docsweep_storage::{Bucket, StoreBackend, StoreConfig, Stores};

/// Where buckets and logs live.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Object store backend: memory, local or s3
    #[arg(long, env = "DOCSWEEP_STORE", default_value = "local")]
    pub store: StoreBackend,

    /// Root directory of the local backend
    #[arg(long, env = "DOCSWEEP_LOCAL_ROOT", default_value = "./data/storage")]
    pub local_root: PathBuf,

    /// S3 bucket holding every docsweep bucket and log
    #[arg(long, env = "DOCSWEEP_S3_BUCKET", default_value = "docsweep")]
    pub s3_bucket: String,

    /// S3 endpoint (localstack, MinIO)
    #[arg(long, env = "S3_ENDPOINT")]
    pub endpoint: Option<String>,

    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,

    /// Allow plain-HTTP S3 endpoints
    #[arg(long, env = "DOCSWEEP_ALLOW_HTTP")]
    pub allow_http: bool,
}

impl StoreArgs {
    pub fn to_config(&self) -> StoreConfig {
        StoreConfig {
            backend: self.store,
            local_root: self.local_root.clone(),
            s3_bucket: self.s3_bucket.clone(),
            endpoint: self.endpoint.clone(),
            region: self.region.clone(),
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            allow_http: self.allow_http,
        }
    }

    pub fn open(&self) -> Result<Stores> {
        Stores::from_config(&self.to_config()).context("Failed to open object store")
    }

    /// Arguments that select the same store in a child `docsweep` process.
    ///
    /// The secret key is left out; pass it through the environment.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--store".to_string(),
            self.store.to_string(),
            "--local-root".to_string(),
            self.local_root.display().to_string(),
            "--s3-bucket".to_string(),
            self.s3_bucket.clone(),
            "--region".to_string(),
            self.region.clone(),
        ];
        if let Some(endpoint) = &self.endpoint {
            args.extend(["--endpoint".to_string(), endpoint.clone()]);
        }
        if let Some(key_id) = &self.access_key_id {
            args.extend(["--access-key-id".to_string(), key_id.clone()]);
        }
        if self.allow_http {
            args.push("--allow-http".to_string());
        }
        args
    }
}

/// Staging and destination bucket names.
#[derive(Args, Debug, Clone)]
pub struct BucketArgs {
    #[arg(long, env = "DOCSWEEP_STAGING_BUCKET", default_value = "temp")]
    pub staging_bucket: String,

    #[arg(long, env = "DOCSWEEP_DESTINATION_BUCKET", default_value = "my-bucket")]
    pub destination_bucket: String,
}

impl BucketArgs {
    pub fn open(&self, stores: &Stores) -> Result<(Bucket, Bucket)> {
        let staging = stores
            .bucket(&self.staging_bucket)
            .with_context(|| format!("Invalid staging bucket '{}'", self.staging_bucket))?;
        let destination = stores
            .bucket(&self.destination_bucket)
            .with_context(|| format!("Invalid destination bucket '{}'", self.destination_bucket))?;
        Ok((staging, destination))
    }

    pub fn to_args(&self) -> Vec<String> {
        vec![
            "--staging-bucket".to_string(),
            self.staging_bucket.clone(),
            "--destination-bucket".to_string(),
            self.destination_bucket.clone(),
        ]
    }
}
