use super::{CodecService, DecodedImage, TargetFormat};
use crate::{Error, Result};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::borrow::Cow;
use std::io::Cursor;

/// Standard alphabet, padding optional. URL-safe symbols are mapped onto it
/// before decoding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The JPEG encoder treats 1 as its lowest setting.
const MIN_JPEG_QUALITY: u8 = 1;

/// Codec backed by the `image` crate's decoders and encoders.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl ImageCodec {
    pub fn new() -> Self {
        Self
    }

    fn decode_base64(raw_base64: &str) -> Result<Vec<u8>> {
        let compact: String = raw_base64
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                other => other,
            })
            .collect();
        if compact.is_empty() {
            return Err(Error::UnsupportedOrCorruptImage(
                "image data is empty".to_string(),
            ));
        }
        LENIENT_BASE64
            .decode(compact)
            .map_err(|e| Error::UnsupportedOrCorruptImage(format!("invalid base64: {}", e)))
    }

    /// Convert the raster into a color model the target encoder writes.
    fn prepare_for(image: &DynamicImage, target: TargetFormat) -> Cow<'_, DynamicImage> {
        if target.accepted_color_types().contains(&image.color()) {
            return Cow::Borrowed(image);
        }

        let has_alpha = image.color().has_alpha();
        let converted = match target {
            TargetFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
            TargetFormat::Gif => DynamicImage::ImageRgba8(image.to_rgba8()),
            TargetFormat::Bmp | TargetFormat::MsBmp if has_alpha => {
                DynamicImage::ImageRgba8(image.to_rgba8())
            }
            TargetFormat::Bmp | TargetFormat::MsBmp => DynamicImage::ImageRgb8(image.to_rgb8()),
            TargetFormat::Png | TargetFormat::Tiff if has_alpha => {
                DynamicImage::ImageRgba16(image.to_rgba16())
            }
            TargetFormat::Png | TargetFormat::Tiff => DynamicImage::ImageRgb16(image.to_rgb16()),
        };
        tracing::debug!(
            "Converted {:?} raster to {:?} for {}",
            image.color(),
            converted.color(),
            target
        );
        Cow::Owned(converted)
    }
}

impl CodecService for ImageCodec {
    fn decode(&self, raw_base64: &str) -> Result<DecodedImage> {
        let bytes = Self::decode_base64(raw_base64)?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| Error::UnsupportedOrCorruptImage(e.to_string()))?;
        tracing::debug!(
            "Decoded {}x{} image ({:?}, {} bytes)",
            image.width(),
            image.height(),
            image.color(),
            bytes.len()
        );
        Ok(DecodedImage::new(image))
    }

    fn encode(&self, image: &DecodedImage, target: TargetFormat, quality: u8) -> Result<Vec<u8>> {
        let prepared = Self::prepare_for(image.as_dynamic(), target);
        let encode_failure = |e: image::ImageError| Error::EncodeFailure {
            format: target.mime_type(),
            message: e.to_string(),
        };

        let mut bytes = Vec::new();
        if target.is_lossy() {
            let quality = quality.clamp(MIN_JPEG_QUALITY, 100);
            let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
            prepared.write_with_encoder(encoder).map_err(encode_failure)?;
        } else {
            prepared
                .write_to(&mut Cursor::new(&mut bytes), target.image_format())
                .map_err(encode_failure)?;
        }

        tracing::debug!("Encoded {} ({} bytes)", target, bytes.len());
        Ok(bytes)
    }
}
