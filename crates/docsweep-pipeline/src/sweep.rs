//! The sweep: Collect → Transform → Publish → End.
//!
//! ## Collect
//!
//! Lists the staging bucket and, for each key, reads the object, deletes it,
//! then parses it. Only a document whose staged object was deleted is
//! admitted to the batch, so a document is never both staged and in flight.
//!
//! - Read or parse failure: logged, the key is deleted and the object is
//!   dropped for good. It is not retried by later sweeps.
//! - Delete failure: logged, the document stays staged and is left for the
//!   next sweep.
//! - Listing failure: logged, the sweep continues with an empty batch.
//!
//! Collect never fails the sweep.
//!
//! ## Transform
//!
//! Sets `word_count` on every document from its `content`. A count the
//! document arrived with is replaced.
//!
//! ## Publish
//!
//! Ensures the destination bucket exists, then writes every document under
//! `<id>.json`, replacing earlier versions. A write failure ends the sweep
//! with [`PipelineError::PublishWrite`]; documents after the failing one in
//! the batch are not published and, having left staging, are lost.

use std::fmt;
use std::time::Instant;

use docsweep_core::Document;
use docsweep_observability::metrics;
use docsweep_storage::Bucket;

use crate::error::{PipelineError, Result};

/// Stage of a sweep, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStage {
    Collect,
    Transform,
    Publish,
    End,
}

impl fmt::Display for SweepStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepStage::Collect => write!(f, "collect"),
            SweepStage::Transform => write!(f, "transform"),
            SweepStage::Publish => write!(f, "publish"),
            SweepStage::End => write!(f, "end"),
        }
    }
}

/// Output of the Collect stage.
#[derive(Debug, Default)]
pub struct Collected {
    /// Documents moved out of staging, in listing order.
    pub batch: Vec<Document>,
    /// Keys whose objects could not be read or parsed. Already deleted.
    pub dropped: Vec<String>,
    /// Keys that could not be deleted and remain staged.
    pub deferred: Vec<String>,
}

/// Summary of one completed sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub collected: usize,
    pub dropped: Vec<String>,
    pub deferred: Vec<String>,
    /// Destination keys in the order they were written.
    pub published: Vec<String>,
    /// Sum of `word_count` over the published documents.
    pub words: u64,
}

/// Sweeps the staging bucket into the destination bucket.
#[derive(Debug, Clone)]
pub struct SweepPipeline {
    staging: Bucket,
    destination: Bucket,
}

impl SweepPipeline {
    pub fn new(staging: Bucket, destination: Bucket) -> Self {
        Self {
            staging,
            destination,
        }
    }

    pub fn staging(&self) -> &Bucket {
        &self.staging
    }

    pub fn destination(&self) -> &Bucket {
        &self.destination
    }

    /// Run one full sweep over whatever is currently staged.
    pub async fn run(&self) -> Result<SweepReport> {
        let start = Instant::now();
        let staging_label = [self.staging.name()];

        let Collected {
            batch,
            dropped,
            deferred,
        } = self.collect().await;
        let collected = batch.len();

        tracing::debug!(stage = %SweepStage::Transform, documents = collected, "Entering stage");
        let batch = transform(batch);

        let published = self.publish(&batch).await?;
        let words = batch.iter().filter_map(|doc| doc.word_count).sum();

        let elapsed = start.elapsed();
        metrics::SWEEPS_TOTAL.with_label_values(&staging_label).inc();
        metrics::SWEEP_DURATION.observe(elapsed.as_secs_f64());

        tracing::info!(
            stage = %SweepStage::End,
            collected,
            dropped = dropped.len(),
            deferred = deferred.len(),
            published = published.len(),
            words,
            elapsed_ms = elapsed.as_millis() as u64,
            "Sweep completed"
        );

        Ok(SweepReport {
            collected,
            dropped,
            deferred,
            published,
            words,
        })
    }

    /// Collect stage. Drains the staging bucket into a batch.
    pub async fn collect(&self) -> Collected {
        let bucket = self.staging.name();
        tracing::debug!(stage = %SweepStage::Collect, bucket = %bucket, "Entering stage");

        let keys = match self.staging.list_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::error!(bucket = %bucket, error = %e, "Failed to list staged documents");
                return Collected::default();
            }
        };
        if keys.is_empty() {
            tracing::info!(bucket = %bucket, "No staged documents found");
        }

        let mut collected = Collected::default();
        for key in keys {
            let body = match self.staging.get(&key).await {
                Ok(body) => Some(body),
                Err(e) => {
                    tracing::warn!(bucket = %bucket, key = %key, error = %e, "Failed to read staged document, dropping");
                    None
                }
            };

            if let Err(e) = self.staging.delete(&key).await {
                if e.is_not_found() {
                    // Gone already; nothing left to transfer.
                    continue;
                }
                tracing::warn!(bucket = %bucket, key = %key, error = %e, "Failed to remove staged document, leaving it for the next sweep");
                collected.deferred.push(key);
                continue;
            }

            let Some(body) = body else {
                collected.dropped.push(key);
                continue;
            };

            match Document::from_slice(&body) {
                Ok(doc) => {
                    tracing::debug!(bucket = %bucket, key = %key, id = %doc.id, "Collected document");
                    collected.batch.push(doc);
                }
                Err(e) => {
                    tracing::warn!(bucket = %bucket, key = %key, error = %e, "Staged document is not valid, dropping");
                    collected.dropped.push(key);
                }
            }
        }

        metrics::SWEEP_COLLECTED_TOTAL
            .with_label_values(&[bucket])
            .inc_by(collected.batch.len() as u64);
        metrics::SWEEP_DROPPED_TOTAL
            .with_label_values(&[bucket])
            .inc_by(collected.dropped.len() as u64);

        tracing::info!(bucket = %bucket, documents = collected.batch.len(), "Read staged documents");
        collected
    }

    /// Publish stage. Writes every document of the batch to the destination.
    pub async fn publish(&self, batch: &[Document]) -> Result<Vec<String>> {
        let bucket = self.destination.name();
        tracing::debug!(stage = %SweepStage::Publish, bucket = %bucket, documents = batch.len(), "Entering stage");

        self.destination
            .ensure_exists()
            .await
            .map_err(|source| PipelineError::EnsureBucket {
                bucket: bucket.to_string(),
                source,
            })?;

        let mut published = Vec::with_capacity(batch.len());
        for doc in batch {
            let key = self
                .destination
                .put_document(doc)
                .await
                .map_err(|source| {
                    tracing::error!(bucket = %bucket, id = %doc.id, error = %source, "Failed to publish document");
                    PipelineError::PublishWrite {
                        id: doc.id.clone(),
                        source,
                    }
                })?;
            metrics::SWEEP_PUBLISHED_TOTAL
                .with_label_values(&[bucket])
                .inc();
            published.push(key);
        }
        Ok(published)
    }
}

/// Transform stage. Counts the words of every document.
pub fn transform(mut batch: Vec<Document>) -> Vec<Document> {
    for doc in &mut batch {
        let words = doc.recount_words();
        tracing::trace!(id = %doc.id, words, "Counted words");
    }
    batch
}
