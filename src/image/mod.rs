//! Image decoding and format conversion
//!
//! Decodes base64 image text into an in-memory raster and re-encodes it
//! into one of the supported target formats.

pub mod codec;
pub mod formats;
pub mod mock;

pub use codec::ImageCodec;
pub use formats::TargetFormat;
pub use mock::MockCodec;

use crate::models::{ConversionRequest, EncodedResult};
use crate::Result;
use image::DynamicImage;

/// A decoded raster owned by one pipeline invocation.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    inner: DynamicImage,
}

impl DecodedImage {
    pub fn new(inner: DynamicImage) -> Self {
        Self { inner }
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.inner
    }
}

pub trait CodecService: Send + Sync {
    fn decode(&self, raw_base64: &str) -> Result<DecodedImage>;

    /// `quality` is only consulted for lossy targets.
    fn encode(&self, image: &DecodedImage, target: TargetFormat, quality: u8) -> Result<Vec<u8>>;

    fn convert(&self, raw_base64: &str, request: &ConversionRequest) -> Result<EncodedResult> {
        let decoded = self.decode(raw_base64)?;
        let bytes = self.encode(&decoded, request.target_format, request.quality)?;
        Ok(EncodedResult::new(bytes, request.target_format))
    }
}
