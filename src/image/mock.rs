use super::{CodecService, DecodedImage, TargetFormat};
use crate::{Error, Result};
use image::{DynamicImage, RgbImage};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// In-memory codec for driver tests: no real decoding, configurable failures.
#[derive(Clone)]
pub struct MockCodec {
    decode_count: Arc<Mutex<usize>>,
    encode_count: Arc<Mutex<usize>>,
    corrupt_inputs: Arc<Mutex<HashSet<String>>>,
    should_fail_encode: Arc<Mutex<bool>>,
    dimensions: (u32, u32),
}

impl MockCodec {
    pub fn new() -> Self {
        Self {
            decode_count: Arc::new(Mutex::new(0)),
            encode_count: Arc::new(Mutex::new(0)),
            corrupt_inputs: Arc::new(Mutex::new(HashSet::new())),
            should_fail_encode: Arc::new(Mutex::new(false)),
            dimensions: (4, 4),
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = (width, height);
        self
    }

    /// Make `decode` fail for this exact input text.
    pub fn with_corrupt_input(self, raw_base64: &str) -> Self {
        self.corrupt_inputs
            .lock()
            .unwrap()
            .insert(raw_base64.to_string());
        self
    }

    pub fn with_encode_failure(self, should_fail: bool) -> Self {
        *self.should_fail_encode.lock().unwrap() = should_fail;
        self
    }

    pub fn get_decode_count(&self) -> usize {
        *self.decode_count.lock().unwrap()
    }

    pub fn get_encode_count(&self) -> usize {
        *self.encode_count.lock().unwrap()
    }
}

impl Default for MockCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecService for MockCodec {
    fn decode(&self, raw_base64: &str) -> Result<DecodedImage> {
        *self.decode_count.lock().unwrap() += 1;

        if self.corrupt_inputs.lock().unwrap().contains(raw_base64) {
            return Err(Error::UnsupportedOrCorruptImage(
                "Mock decode failure".to_string(),
            ));
        }

        let (width, height) = self.dimensions;
        Ok(DecodedImage::new(DynamicImage::ImageRgb8(RgbImage::new(
            width, height,
        ))))
    }

    fn encode(&self, image: &DecodedImage, target: TargetFormat, quality: u8) -> Result<Vec<u8>> {
        *self.encode_count.lock().unwrap() += 1;

        if *self.should_fail_encode.lock().unwrap() {
            return Err(Error::EncodeFailure {
                format: target.mime_type(),
                message: "Mock encode failure".to_string(),
            });
        }

        let quality = if target.is_lossy() { quality } else { 0 };
        Ok(format!(
            "{}:{}x{}:q{}",
            target.mime_type(),
            image.width(),
            image.height(),
            quality
        )
        .into_bytes())
    }
}
