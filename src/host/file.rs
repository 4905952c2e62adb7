use super::HostService;
use crate::models::{BatchRequest, Item};
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;

/// Reads the batch from a file (or stdin) and writes results to a file (or stdout).
pub struct FileHost {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl FileHost {
    /// `None` for either side means the standard stream.
    pub fn new(input: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        Self { input, output }
    }
}

#[async_trait]
impl HostService for FileHost {
    async fn fetch_batch(&self) -> Result<BatchRequest> {
        let raw = match &self.input {
            Some(path) => {
                info!("Reading batch from {}", path.display());
                tokio::fs::read_to_string(path).await?
            }
            None => {
                info!("Reading batch from stdin");
                let mut raw = String::new();
                tokio::io::stdin().read_to_string(&mut raw).await?;
                raw
            }
        };

        let batch: BatchRequest = serde_json::from_str(&raw)?;
        info!("Loaded batch with {} item(s)", batch.items.len());
        Ok(batch)
    }

    async fn emit_results(&self, items: &[Item]) -> Result<()> {
        let json = serde_json::to_string_pretty(items)?;
        match &self.output {
            Some(path) => {
                tokio::fs::write(path, &json).await?;
                info!("Wrote {} result(s) to {}", items.len(), path.display());
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BinaryData;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fetch_batch_from_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("batch.json");
        std::fs::write(
            &input,
            r#"{
                "parameters": { "outputFileFormat": "image/png", "continueOnFail": true },
                "items": [
                    { "json": { "data": "abc" }, "parameters": { "quality": 5 } },
                    { "json": {}, "binary": { "data": { "fileType": "image", "data": "xyz" } } }
                ]
            }"#,
        )
        .unwrap();

        let host = FileHost::new(Some(input), None);
        let batch = host.fetch_batch().await.unwrap();

        assert_eq!(batch.parameters.output_file_format.as_deref(), Some("image/png"));
        assert_eq!(batch.parameters.continue_on_fail, Some(true));
        assert_eq!(batch.items.len(), 2);
        assert_eq!(batch.items[0].parameters.quality, Some(5.0));
        assert_eq!(
            batch.items[1].item.attachment("data").unwrap().data.as_deref(),
            Some("xyz")
        );
    }

    #[tokio::test]
    async fn test_fetch_batch_rejects_malformed_json() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("batch.json");
        std::fs::write(&input, "{ not json").unwrap();

        let host = FileHost::new(Some(input), None);
        let err = host.fetch_batch().await.unwrap_err();
        assert!(matches!(err, crate::Error::Serialization(_)));
    }

    #[tokio::test]
    async fn test_emit_results_writes_json_array() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.json");
        let host = FileHost::new(None, Some(output.clone()));

        let items = vec![
            Item::failure("No image data exists on item!"),
            Item::default().with_attachment(
                "data",
                BinaryData {
                    file_name: Some("imagepng".to_string()),
                    ..Default::default()
                },
            ),
        ];
        host.emit_results(&items).await.unwrap();

        let written: Vec<Item> =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written, items);
    }
}
