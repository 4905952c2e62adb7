use super::HostService;
use crate::models::{BatchRequest, Item};
use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockHost {
    batch: Arc<Mutex<BatchRequest>>,
    emitted: Arc<Mutex<Option<Vec<Item>>>>,
    fetch_count: Arc<Mutex<usize>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            batch: Arc::new(Mutex::new(BatchRequest::default())),
            emitted: Arc::new(Mutex::new(None)),
            fetch_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_batch(self, batch: BatchRequest) -> Self {
        *self.batch.lock().unwrap() = batch;
        self
    }

    pub fn get_fetch_count(&self) -> usize {
        *self.fetch_count.lock().unwrap()
    }

    /// Results passed to `emit_results`, if it was called.
    pub fn get_emitted(&self) -> Option<Vec<Item>> {
        self.emitted.lock().unwrap().clone()
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostService for MockHost {
    async fn fetch_batch(&self) -> Result<BatchRequest> {
        *self.fetch_count.lock().unwrap() += 1;
        Ok(self.batch.lock().unwrap().clone())
    }

    async fn emit_results(&self, items: &[Item]) -> Result<()> {
        *self.emitted.lock().unwrap() = Some(items.to_vec());
        Ok(())
    }
}
