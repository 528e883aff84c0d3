use crate::adapter::ImageMaterializer;
use crate::error::Result;
use crate::model::ImageSnapshot;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::debug;

/// Takes registry snapshots one at a time.
///
/// Listing is the critical section: a listing that overlaps another one
/// while builds are finishing could observe a partial state. Every call
/// returns a new immutable snapshot.
pub struct SnapshotProvider<'a> {
    materializer: &'a dyn ImageMaterializer,
    lock: Mutex<()>,
}

impl<'a> SnapshotProvider<'a> {
    pub fn new(materializer: &'a dyn ImageMaterializer) -> Self {
        Self {
            materializer,
            lock: Mutex::new(()),
        }
    }

    pub async fn take(&self) -> Result<Arc<ImageSnapshot>> {
        let _guard = self.lock.lock().await;
        let started = Instant::now();

        let records = self.materializer.list_images().await?;
        let snapshot = ImageSnapshot::from_records(records);

        debug!(
            repositories = snapshot.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Image snapshot taken"
        );
        Ok(Arc::new(snapshot))
    }
}
