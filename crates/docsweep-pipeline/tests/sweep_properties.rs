//! End-to-end sweep behavior against in-memory and fault-injecting stores.

use std::fmt::{Debug, Display, Formatter};
use std::ops::Range;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use docsweep_core::Document;
use docsweep_pipeline::{PipelineError, SweepPipeline};
use docsweep_storage::Bucket;
use futures::stream::BoxStream;
use object_store::memory::InMemory;
use object_store::{
    path::Path, GetOptions, GetResult, ListResult, MultipartId, ObjectMeta, ObjectStore,
    PutOptions, PutResult, Result,
};
use tokio::io::AsyncWrite;

/// Wraps a store and fails selected operations on paths containing a needle.
#[derive(Default)]
struct Faults {
    put: Option<String>,
    get: Option<String>,
    delete: Option<String>,
}

struct FaultyStore {
    inner: Arc<dyn ObjectStore>,
    faults: Mutex<Faults>,
}

impl FaultyStore {
    fn new(inner: Arc<dyn ObjectStore>) -> Self {
        Self {
            inner,
            faults: Mutex::new(Faults::default()),
        }
    }

    fn fail_put(&self, needle: &str) {
        self.faults.lock().unwrap().put = Some(needle.to_string());
    }

    fn fail_get(&self, needle: &str) {
        self.faults.lock().unwrap().get = Some(needle.to_string());
    }

    fn fail_delete(&self, needle: Option<&str>) {
        self.faults.lock().unwrap().delete = needle.map(str::to_string);
    }

    fn check(&self, needle: &Option<String>, location: &Path) -> Result<()> {
        match needle {
            Some(n) if location.as_ref().contains(n.as_str()) => Err(injected(location)),
            _ => Ok(()),
        }
    }
}

fn injected(location: &Path) -> object_store::Error {
    object_store::Error::Generic {
        store: "faulty",
        source: Box::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            format!("injected failure on {}", location),
        )),
    }
}

impl Debug for FaultyStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultyStore").field("inner", &self.inner).finish()
    }
}

impl Display for FaultyStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "FaultyStore({})", self.inner)
    }
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn put(&self, location: &Path, bytes: Bytes) -> Result<PutResult> {
        let needle = self.faults.lock().unwrap().put.clone();
        self.check(&needle, location)?;
        self.inner.put(location, bytes).await
    }

    async fn put_opts(&self, location: &Path, bytes: Bytes, opts: PutOptions) -> Result<PutResult> {
        let needle = self.faults.lock().unwrap().put.clone();
        self.check(&needle, location)?;
        self.inner.put_opts(location, bytes, opts).await
    }

    async fn put_multipart(
        &self,
        location: &Path,
    ) -> Result<(MultipartId, Box<dyn AsyncWrite + Unpin + Send>)> {
        self.inner.put_multipart(location).await
    }

    async fn abort_multipart(&self, location: &Path, multipart_id: &MultipartId) -> Result<()> {
        self.inner.abort_multipart(location, multipart_id).await
    }

    async fn get_opts(&self, location: &Path, options: GetOptions) -> Result<GetResult> {
        let needle = self.faults.lock().unwrap().get.clone();
        self.check(&needle, location)?;
        self.inner.get_opts(location, options).await
    }

    async fn get_range(&self, location: &Path, range: Range<usize>) -> Result<Bytes> {
        let needle = self.faults.lock().unwrap().get.clone();
        self.check(&needle, location)?;
        self.inner.get_range(location, range).await
    }

    async fn head(&self, location: &Path) -> Result<ObjectMeta> {
        self.inner.head(location).await
    }

    async fn delete(&self, location: &Path) -> Result<()> {
        let needle = self.faults.lock().unwrap().delete.clone();
        self.check(&needle, location)?;
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&Path>) -> BoxStream<'_, Result<ObjectMeta>> {
        self.inner.list(prefix)
    }

    async fn list_with_delimiter(&self, prefix: Option<&Path>) -> Result<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(&self, from: &Path, to: &Path) -> Result<()> {
        self.inner.copy_if_not_exists(from, to).await
    }
}

fn buckets(store: Arc<dyn ObjectStore>) -> (Bucket, Bucket) {
    (
        Bucket::new(store.clone(), "temp").unwrap(),
        Bucket::new(store, "my-bucket").unwrap(),
    )
}

fn faulty() -> (Arc<FaultyStore>, SweepPipeline) {
    let store = Arc::new(FaultyStore::new(Arc::new(InMemory::new())));
    let (staging, destination) = buckets(store.clone());
    (store, SweepPipeline::new(staging, destination))
}

async fn stage(bucket: &Bucket, id: &str, content: &str) {
    bucket.put_document(&Document::new(id, content)).await.unwrap();
}

#[tokio::test]
async fn sweep_drains_staging_into_destination() {
    let (staging, destination) = buckets(Arc::new(InMemory::new()));
    let pipeline = SweepPipeline::new(staging.clone(), destination.clone());
    stage(&staging, "r1", "one").await;
    stage(&staging, "r2", "one two").await;
    stage(&staging, "r3", "one two three").await;

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.collected, 3);
    assert_eq!(report.words, 6);
    assert!(staging.list_keys().await.unwrap().is_empty());
    for (id, words) in [("r1", 1), ("r2", 2), ("r3", 3)] {
        let doc = destination.get_document(&format!("{id}.json")).await.unwrap();
        assert_eq!(doc.word_count, Some(words));
    }
}

#[tokio::test]
async fn republishing_an_id_replaces_the_previous_version() {
    let (staging, destination) = buckets(Arc::new(InMemory::new()));
    let pipeline = SweepPipeline::new(staging.clone(), destination.clone());

    stage(&staging, "r1", "first draft").await;
    pipeline.run().await.unwrap();
    stage(&staging, "r1", "the final three").await;
    pipeline.run().await.unwrap();

    assert_eq!(destination.list_keys().await.unwrap(), vec!["r1.json".to_string()]);
    let doc = destination.get_document("r1.json").await.unwrap();
    assert_eq!(doc.content, "the final three");
    assert_eq!(doc.word_count, Some(3));
}

#[tokio::test]
async fn one_sweep_picks_up_documents_left_by_earlier_runs() {
    let (staging, destination) = buckets(Arc::new(InMemory::new()));
    // Staged without a sweep, as if the previous run stopped after staging.
    stage(&staging, "orphan-1", "a").await;
    stage(&staging, "orphan-2", "b").await;

    let pipeline = SweepPipeline::new(staging.clone(), destination.clone());
    stage(&staging, "fresh", "c").await;
    let report = pipeline.run().await.unwrap();

    assert_eq!(report.published.len(), 3);
    assert!(staging.list_keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_staged_object_does_not_block_valid_ones() {
    let (staging, destination) = buckets(Arc::new(InMemory::new()));
    stage(&staging, "a", "x y").await;
    staging
        .put("b.json", Bytes::from_static(b"not json at all"))
        .await
        .unwrap();
    stage(&staging, "c", "z").await;

    let report = SweepPipeline::new(staging.clone(), destination.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(report.dropped, vec!["b.json".to_string()]);
    assert_eq!(report.published, vec!["a.json".to_string(), "c.json".to_string()]);
    assert!(staging.list_keys().await.unwrap().is_empty());
    assert!(destination.get("b.json").await.is_err());
}

#[tokio::test]
async fn publish_order_follows_staging_listing_order() {
    let (staging, destination) = buckets(Arc::new(InMemory::new()));
    // Staged out of lexicographic order; the in-memory store lists sorted.
    for id in ["c", "a", "b"] {
        stage(&staging, id, "w").await;
    }

    let listed = staging.list_keys().await.unwrap();
    let report = SweepPipeline::new(staging, destination).run().await.unwrap();
    assert_eq!(report.published, listed);

    let staged_order = vec!["c.json", "a.json", "b.json"];
    assert_ne!(report.published, staged_order);
    assert_eq!(report.published, vec!["a.json", "b.json", "c.json"]);
}

#[tokio::test]
async fn stale_word_count_is_recounted() {
    let (staging, destination) = buckets(Arc::new(InMemory::new()));
    let mut doc = Document::new("r1", "a b c d");
    doc.word_count = Some(99);
    staging.put_document(&doc).await.unwrap();

    SweepPipeline::new(staging, destination.clone()).run().await.unwrap();
    assert_eq!(
        destination.get_document("r1.json").await.unwrap().word_count,
        Some(4)
    );
}

#[tokio::test]
async fn generator_payload_keeps_extra_fields() {
    let (staging, destination) = buckets(Arc::new(InMemory::new()));
    let payload = serde_json::json!({
        "article_id": "a-17",
        "title": "Hello",
        "author": "someone",
        "publish_date": "2024-01-02T03:04:05",
        "content": "lorem ipsum dolor",
        "source": "generator"
    });
    staging
        .put("a-17.json", Bytes::from(serde_json::to_vec(&payload).unwrap()))
        .await
        .unwrap();

    SweepPipeline::new(staging, destination.clone()).run().await.unwrap();

    let published: serde_json::Value =
        serde_json::from_slice(&destination.get("a-17.json").await.unwrap()).unwrap();
    assert_eq!(published["id"], "a-17");
    assert_eq!(published["word_count"], 3);
    assert_eq!(published["source"], "generator");
}

#[tokio::test]
async fn undeletable_document_stays_staged_and_is_not_published() {
    let (store, pipeline) = faulty();
    stage(pipeline.staging(), "stuck", "a b").await;
    stage(pipeline.staging(), "free", "c").await;
    store.fail_delete(Some("temp/stuck.json"));

    let report = pipeline.run().await.unwrap();
    assert_eq!(report.deferred, vec!["stuck.json".to_string()]);
    assert_eq!(report.published, vec!["free.json".to_string()]);
    assert_eq!(
        pipeline.staging().list_keys().await.unwrap(),
        vec!["stuck.json".to_string()]
    );
    assert!(pipeline.destination().get("stuck.json").await.is_err());

    // Once deletes work again the next sweep moves it.
    store.fail_delete(None);
    let report = pipeline.run().await.unwrap();
    assert_eq!(report.published, vec!["stuck.json".to_string()]);
    assert!(pipeline.staging().list_keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreadable_document_is_dropped() {
    let (store, pipeline) = faulty();
    stage(pipeline.staging(), "bad", "a").await;
    stage(pipeline.staging(), "good", "b").await;
    store.fail_get("temp/bad.json");

    let report = pipeline.run().await.unwrap();
    assert_eq!(report.dropped, vec!["bad.json".to_string()]);
    assert_eq!(report.published, vec!["good.json".to_string()]);
    assert!(pipeline.staging().list_keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn publish_write_failure_fails_the_sweep() {
    let (store, pipeline) = faulty();
    stage(pipeline.staging(), "a", "x").await;
    stage(pipeline.staging(), "b", "y").await;
    stage(pipeline.staging(), "c", "z").await;
    store.fail_put("my-bucket/b.json");

    let err = pipeline.run().await.unwrap_err();
    match err {
        PipelineError::PublishWrite { id, .. } => assert_eq!(id, "b"),
        other => panic!("expected PublishWrite, got {other:?}"),
    }

    // Documents already published stay published; the rest of the batch
    // has left staging and is not retried.
    assert!(pipeline.destination().get("a.json").await.is_ok());
    assert!(pipeline.destination().get("c.json").await.is_err());
    assert!(pipeline.staging().list_keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn destination_bucket_is_created_on_first_sweep() {
    let (staging, destination) = buckets(Arc::new(InMemory::new()));
    assert!(!destination.exists().await.unwrap());

    SweepPipeline::new(staging, destination.clone()).run().await.unwrap();
    assert!(destination.exists().await.unwrap());
}
