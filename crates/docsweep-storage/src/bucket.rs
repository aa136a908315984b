//! Object-store buckets.
//!
//! A [`Bucket`] is a flat key/value namespace: one top-level prefix of a
//! shared `ObjectStore`. Keys are single path segments (`<id>.json`), so
//! objects nested deeper under the prefix are not part of the bucket.
//!
//! Object stores have no portable notion of bucket creation, so a bucket
//! exists once its `.bucket` marker object exists. [`Bucket::ensure_exists`]
//! writes the marker with a create-only put, which makes it idempotent.
//!
//! ## Ordering
//!
//! [`Bucket::list_keys`] returns keys in whatever order the backing store
//! enumerates them. The in-memory store lists lexicographically; the local
//! filesystem lists in directory order.

use std::sync::Arc;

use bytes::Bytes;
use docsweep_core::Document;
use futures::TryStreamExt;
use object_store::path::Path;
use object_store::{ObjectStore, PutMode};

use crate::error::{Error, Result};

/// Name of the marker object that makes a bucket exist.
pub const BUCKET_MARKER: &str = ".bucket";

/// A named key/value namespace on an object store.
#[derive(Debug, Clone)]
pub struct Bucket {
    store: Arc<dyn ObjectStore>,
    name: String,
    prefix: Path,
}

impl Bucket {
    pub fn new(store: Arc<dyn ObjectStore>, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.contains('/') {
            return Err(Error::InvalidBucket(name));
        }
        let prefix = Path::parse(&name).map_err(|_| Error::InvalidBucket(name.clone()))?;
        Ok(Self {
            store,
            name,
            prefix,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn path(&self, key: &str) -> Result<Path> {
        if key.is_empty() || key.contains('/') {
            return Err(Error::InvalidKey {
                key: key.to_string(),
                reason: "must be a single non-empty path segment".to_string(),
            });
        }
        Path::parse(format!("{}/{}", self.name, key)).map_err(|e| Error::InvalidKey {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Create the bucket if it does not exist yet.
    ///
    /// Returns `true` if this call created it.
    pub async fn ensure_exists(&self) -> Result<bool> {
        let marker = self.path(BUCKET_MARKER)?;
        match self
            .store
            .put_opts(&marker, Bytes::new(), PutMode::Create.into())
            .await
        {
            Ok(_) => {
                tracing::info!(bucket = %self.name, "Bucket created");
                Ok(true)
            }
            Err(object_store::Error::AlreadyExists { .. }) => {
                tracing::debug!(bucket = %self.name, "Bucket already exists");
                Ok(false)
            }
            Err(object_store::Error::NotImplemented) => {
                // Store without conditional puts: check, then write.
                if self.exists().await? {
                    return Ok(false);
                }
                self.store.put(&marker, Bytes::new()).await?;
                tracing::info!(bucket = %self.name, "Bucket created");
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the bucket marker is present.
    pub async fn exists(&self) -> Result<bool> {
        let marker = self.path(BUCKET_MARKER)?;
        match self.store.head(&marker).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `body` under `key`, replacing any previous object.
    pub async fn put(&self, key: &str, body: Bytes) -> Result<()> {
        let path = self.path(key)?;
        self.store.put(&path, body).await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Bytes> {
        let path = self.path(key)?;
        let result = self.store.get(&path).await?;
        Ok(result.bytes().await?)
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path(key)?;
        self.store.delete(&path).await?;
        Ok(())
    }

    /// Enumerate the keys currently in the bucket, marker excluded.
    pub async fn list_keys(&self) -> Result<Vec<String>> {
        let objects: Vec<_> = self
            .store
            .list(Some(&self.prefix))
            .try_collect()
            .await?;

        let mut keys = Vec::with_capacity(objects.len());
        for meta in objects {
            let Some(parts) = meta.location.prefix_match(&self.prefix) else {
                continue;
            };
            let parts: Vec<_> = parts.collect();
            if parts.len() != 1 {
                tracing::trace!(bucket = %self.name, location = %meta.location, "Skipping nested object");
                continue;
            }
            let key = parts[0].as_ref();
            if key != BUCKET_MARKER {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }

    /// Stage or publish a document under its `<id>.json` key.
    pub async fn put_document(&self, doc: &Document) -> Result<String> {
        let key = doc.object_key()?;
        self.put(&key, doc.to_bytes()?).await?;
        Ok(key)
    }

    pub async fn get_document(&self, key: &str) -> Result<Document> {
        let body = self.get(key).await?;
        Ok(Document::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    fn bucket(name: &str) -> Bucket {
        Bucket::new(Arc::new(InMemory::new()), name).unwrap()
    }

    #[test]
    fn test_rejects_bad_bucket_names() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        assert!(Bucket::new(store.clone(), "").is_err());
        assert!(Bucket::new(store.clone(), "a/b").is_err());
        assert!(Bucket::new(store, "..").is_err());
    }

    #[tokio::test]
    async fn test_ensure_exists_is_idempotent() {
        let b = bucket("temp");
        assert!(!b.exists().await.unwrap());
        assert!(b.ensure_exists().await.unwrap());
        assert!(!b.ensure_exists().await.unwrap());
        assert!(b.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_marker_is_not_listed() {
        let b = bucket("temp");
        b.ensure_exists().await.unwrap();
        assert!(b.list_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let b = bucket("temp");
        b.put("r1.json", Bytes::from_static(b"{}")).await.unwrap();
        assert_eq!(b.get("r1.json").await.unwrap(), Bytes::from_static(b"{}"));
        assert_eq!(b.list_keys().await.unwrap(), vec!["r1.json".to_string()]);

        b.delete("r1.json").await.unwrap();
        assert!(b.list_keys().await.unwrap().is_empty());
        assert!(Error::from(b.store.get(&b.path("r1.json").unwrap()).await.unwrap_err()).is_not_found());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let b = bucket("my-bucket");
        b.put("r1.json", Bytes::from_static(b"old")).await.unwrap();
        b.put("r1.json", Bytes::from_static(b"new")).await.unwrap();
        assert_eq!(b.list_keys().await.unwrap().len(), 1);
        assert_eq!(b.get("r1.json").await.unwrap(), Bytes::from_static(b"new"));
    }

    #[tokio::test]
    async fn test_buckets_share_store_without_overlap() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let staging = Bucket::new(store.clone(), "temp").unwrap();
        let dest = Bucket::new(store, "my-bucket").unwrap();

        staging.put("a.json", Bytes::from_static(b"1")).await.unwrap();
        dest.put("b.json", Bytes::from_static(b"2")).await.unwrap();

        assert_eq!(staging.list_keys().await.unwrap(), vec!["a.json".to_string()]);
        assert_eq!(dest.list_keys().await.unwrap(), vec!["b.json".to_string()]);
    }

    #[tokio::test]
    async fn test_rejects_nested_keys() {
        let b = bucket("temp");
        let err = b.put("a/b.json", Bytes::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidKey { .. }));
    }

    #[tokio::test]
    async fn test_document_helpers() {
        let b = bucket("temp");
        let doc = Document::new("r1", "a b c");
        assert_eq!(b.put_document(&doc).await.unwrap(), "r1.json");
        assert_eq!(b.get_document("r1.json").await.unwrap(), doc);
    }
}
