//! Host harness integration
//!
//! The host supplies the batch of items and receives the converted results.
//! The file-backed host reads a JSON batch document and writes the result
//! items as a JSON array.

pub mod file;
pub mod mock;

pub use file::FileHost;
pub use mock::MockHost;

use crate::models::{BatchRequest, Item};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait HostService: Send + Sync {
    async fn fetch_batch(&self) -> Result<BatchRequest>;
    async fn emit_results(&self, items: &[Item]) -> Result<()>;
}
