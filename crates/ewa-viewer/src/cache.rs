use std::sync::Arc;

use ewa_document::{Document, DocumentTransformer};
use moka::future::Cache;
use sha2::{Digest, Sha256};

/// Transformed documents keyed by a SHA-256 digest of their source markdown.
///
/// Size-bounded; moka picks what to evict once `capacity` is reached.
#[derive(Clone)]
pub struct DocumentCache {
    documents: Cache<String, Arc<Document>>,
}

impl DocumentCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            documents: Cache::builder().max_capacity(capacity.max(1) as u64).build(),
        }
    }

    /// Cached document for `markdown`, transforming on a miss. Concurrent misses
    /// for the same source share one transform.
    pub async fn get_or_transform(
        &self,
        markdown: &str,
        transformer: &DocumentTransformer,
    ) -> Arc<Document> {
        self.documents
            .get_with(content_key(markdown), async {
                Arc::new(transformer.transform(markdown))
            })
            .await
    }
}

fn content_key(markdown: &str) -> String {
    format!("{:x}", Sha256::digest(markdown.as_bytes()))
}
