//! Batch driver: runs every item through resolve → decode → encode → package
//! and applies the partial-failure policy.

use crate::image::CodecService;
use crate::models::{BatchItem, Item, OutputRecord};
use crate::settings::{ConverterParameters, ItemSettings};
use crate::{input, output, Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Convert a single item with already-resolved settings.
pub fn convert_item(
    codec: &dyn CodecService,
    item: &Item,
    settings: &ItemSettings,
) -> Result<OutputRecord> {
    let source = input::resolve(item, settings)?;
    debug!("Resolved {} input", source.mode);

    let encoded = codec.convert(&source.raw_data, &settings.request)?;
    debug!("Encoded {} bytes as {}", encoded.bytes.len(), encoded.mime_type);

    Ok(output::package(
        &encoded,
        settings.request.output_mode,
        &source.original_file_name,
    ))
}

fn process_item(
    codec: &dyn CodecService,
    defaults: &ConverterParameters,
    batch_item: &BatchItem,
) -> Result<OutputRecord> {
    let settings = defaults.resolve_item(&batch_item.parameters)?;
    convert_item(codec, &batch_item.item, &settings)
}

/// Runs a batch of items against one codec.
pub struct BatchDriver {
    codec: Arc<dyn CodecService>,
    defaults: ConverterParameters,
    max_concurrency: usize,
}

impl BatchDriver {
    pub fn new(codec: Arc<dyn CodecService>, defaults: ConverterParameters) -> Self {
        Self {
            codec,
            defaults,
            max_concurrency: 1,
        }
    }

    /// Number of items converted at once; values below 1 are treated as 1.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Convert every item, returning one output item per input item in order.
    ///
    /// With `continue_on_fail` a failed item becomes `{ "error": message }`.
    /// Otherwise the first failure (by input position) aborts the batch and no
    /// results are returned; items not yet started are skipped.
    pub async fn run(&self, items: Vec<BatchItem>) -> Result<Vec<Item>> {
        let total = items.len();
        let continue_on_fail = self.defaults.continue_on_fail;
        info!(
            "Converting {} item(s) (concurrency {}, continue on fail: {})",
            total, self.max_concurrency, continue_on_fail
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let aborted = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::with_capacity(total);

        for (index, batch_item) in items.into_iter().enumerate() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| Error::Invariant(format!("Worker semaphore closed: {}", e)))?;
            if aborted.load(Ordering::SeqCst) {
                debug!("Batch aborted; not scheduling item {}", index);
                break;
            }

            let codec = Arc::clone(&self.codec);
            let defaults = self.defaults.clone();
            let aborted = Arc::clone(&aborted);
            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let _span = tracing::debug_span!("item", index).entered();
                if aborted.load(Ordering::SeqCst) {
                    return None;
                }
                let result = process_item(codec.as_ref(), &defaults, &batch_item);
                if result.is_err() && !continue_on_fail {
                    aborted.store(true, Ordering::SeqCst);
                }
                Some(result)
            }));
        }

        let mut results = Vec::with_capacity(total);
        let mut failures = 0;
        for (index, handle) in handles.into_iter().enumerate() {
            let outcome = handle.await.map_err(|e| {
                Error::Invariant(format!("Worker for item {} did not complete: {}", index, e))
            })?;

            match outcome {
                // Skipped after another item failed; that failure is returned below.
                None => continue,
                Some(Ok(record)) => results.push(record.into_item()),
                Some(Err(e)) if continue_on_fail => {
                    warn!("Item {} failed: {}", index, e);
                    failures += 1;
                    results.push(Item::failure(e.to_string()));
                }
                Some(Err(e)) => {
                    error!("Item {} failed, aborting batch: {}", index, e);
                    return Err(e);
                }
            }
        }

        info!(
            "Converted {} item(s), {} failed",
            results.len() - failures,
            failures
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{MockCodec, TargetFormat};
    use crate::models::BinaryData;
    use crate::settings::ParameterOverrides;
    use tokio_test::{assert_err, assert_ok};

    fn base64_item(payload: &str) -> BatchItem {
        Item::default().with_field("data", payload).into()
    }

    fn base64_defaults(continue_on_fail: bool) -> ConverterParameters {
        ConverterParameters {
            input_type: crate::models::InputMode::Base64,
            output_type: crate::models::OutputMode::Base64,
            continue_on_fail,
            ..Default::default()
        }
    }

    #[test]
    fn test_convert_item_runs_each_stage_once() {
        let codec = MockCodec::new().with_dimensions(5, 6);
        let settings = ConverterParameters::default()
            .resolve_item(&ParameterOverrides::default())
            .unwrap();
        let item = Item::default().with_attachment(
            "data",
            BinaryData {
                file_name: Some("cat.png".to_string()),
                file_type: Some("image".to_string()),
                data: Some("payload".to_string()),
                ..Default::default()
            },
        );

        let record = assert_ok!(convert_item(&codec, &item, &settings));
        let OutputRecord::Attachment(binary) = record else {
            panic!("expected attachment record");
        };
        assert_eq!(binary.file_name.as_deref(), Some("catjpeg"));
        assert_eq!(binary.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(codec.get_decode_count(), 1);
        assert_eq!(codec.get_encode_count(), 1);
    }

    /// Only knows how to convert in one step.
    struct DirectCodec;

    impl CodecService for DirectCodec {
        fn decode(&self, _raw_base64: &str) -> Result<crate::image::DecodedImage> {
            Err(Error::Invariant("decode called directly".to_string()))
        }

        fn encode(
            &self,
            _image: &crate::image::DecodedImage,
            _target: TargetFormat,
            _quality: u8,
        ) -> Result<Vec<u8>> {
            Err(Error::Invariant("encode called directly".to_string()))
        }

        fn convert(
            &self,
            _raw_base64: &str,
            request: &crate::models::ConversionRequest,
        ) -> Result<crate::models::EncodedResult> {
            Ok(crate::models::EncodedResult::new(
                b"direct".to_vec(),
                request.target_format,
            ))
        }
    }

    #[test]
    fn test_convert_item_goes_through_codec_convert() {
        let settings = base64_defaults(false)
            .resolve_item(&ParameterOverrides::default())
            .unwrap();
        let item = Item::default().with_field("data", "anything");

        let record = assert_ok!(convert_item(&DirectCodec, &item, &settings));
        assert_eq!(
            record,
            OutputRecord::Inline {
                data: "ZGlyZWN0".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_tolerant_mode_emits_failure_records_in_place() {
        let codec = MockCodec::new().with_corrupt_input("broken");
        let driver = BatchDriver::new(Arc::new(codec), base64_defaults(true));

        let results = driver
            .run(vec![base64_item("one"), base64_item("broken"), base64_item("three")])
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].json.contains_key("data"));
        assert_eq!(
            results[1].error_message(),
            Some("Could not decode image: Mock decode failure")
        );
        assert!(results[2].json.contains_key("data"));
    }

    #[tokio::test]
    async fn test_strict_mode_aborts_and_skips_rest() {
        let codec = MockCodec::new().with_corrupt_input("broken");
        let counters = codec.clone();
        let driver = BatchDriver::new(Arc::new(codec), base64_defaults(false));

        let result = driver
            .run(vec![base64_item("one"), base64_item("broken"), base64_item("three")])
            .await;

        let err = assert_err!(result);
        assert!(matches!(err, Error::UnsupportedOrCorruptImage(_)));
        assert_eq!(counters.get_decode_count(), 2);
    }

    #[tokio::test]
    async fn test_item_overrides_are_resolved_per_item() {
        let codec = MockCodec::new();
        let driver = BatchDriver::new(Arc::new(codec), base64_defaults(true));

        let mut png_item = base64_item("a");
        png_item.parameters.output_file_format = Some("image/png".to_string());
        let mut bad_quality = base64_item("b");
        bad_quality.parameters.quality = Some(250.0);

        let results = driver
            .run(vec![base64_item("c"), png_item, bad_quality])
            .await
            .unwrap();

        use base64::Engine as _;
        let decode = |item: &Item| {
            let text = item.json["data"].as_str().unwrap();
            String::from_utf8(
                base64::engine::general_purpose::STANDARD
                    .decode(text)
                    .unwrap(),
            )
            .unwrap()
        };
        assert_eq!(decode(&results[0]), "image/jpeg:4x4:q80");
        assert_eq!(decode(&results[1]), "image/png:4x4:q0");
        assert!(results[2]
            .error_message()
            .unwrap()
            .contains("outside the range 0-100"));
    }

    #[tokio::test]
    async fn test_parallel_run_preserves_order() {
        let codec = MockCodec::new().with_corrupt_input("item-3");
        let driver =
            BatchDriver::new(Arc::new(codec), base64_defaults(true)).with_max_concurrency(4);

        let items = (0..12).map(|i| base64_item(&format!("item-{}", i))).collect();
        let results = driver.run(items).await.unwrap();

        assert_eq!(results.len(), 12);
        for (index, item) in results.iter().enumerate() {
            assert_eq!(item.error_message().is_some(), index == 3, "item {}", index);
        }
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let driver = BatchDriver::new(Arc::new(MockCodec::new()), ConverterParameters::default());
        assert!(driver.run(Vec::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_encode_failure_is_not_retried() {
        let codec = MockCodec::new().with_encode_failure(true);
        let counters = codec.clone();
        let defaults = ConverterParameters {
            output_file_format: TargetFormat::Gif,
            ..base64_defaults(true)
        };
        let driver = BatchDriver::new(Arc::new(codec), defaults);

        let results = driver.run(vec![base64_item("x")]).await.unwrap();
        assert!(results[0]
            .error_message()
            .unwrap()
            .starts_with("Could not encode image as image/gif"));
        assert_eq!(counters.get_encode_count(), 1);
    }
}
