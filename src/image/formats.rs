//! Target format table: MIME strings, file extensions, encoder formats and
//! the color models each encoder accepts.

use crate::{Error, Result};
use image::{ColorType, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetFormat {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/bmp")]
    Bmp,
    #[serde(rename = "image/x-ms-bmp")]
    MsBmp,
    #[serde(rename = "image/tiff")]
    Tiff,
    #[serde(rename = "image/gif")]
    Gif,
}

/// Extensions that do not follow the MIME subtype.
const EXTENSION_ALIASES: &[(&str, &str)] = &[("image/x-ms-bmp", "bmp")];

impl TargetFormat {
    pub const ALL: [TargetFormat; 6] = [
        TargetFormat::Jpeg,
        TargetFormat::Png,
        TargetFormat::Bmp,
        TargetFormat::MsBmp,
        TargetFormat::Tiff,
        TargetFormat::Gif,
    ];

    pub fn mime_type(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "image/jpeg",
            TargetFormat::Png => "image/png",
            TargetFormat::Bmp => "image/bmp",
            TargetFormat::MsBmp => "image/x-ms-bmp",
            TargetFormat::Tiff => "image/tiff",
            TargetFormat::Gif => "image/gif",
        }
    }

    pub fn extension(self) -> String {
        extension_for_mime(self.mime_type())
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            TargetFormat::Jpeg => ImageFormat::Jpeg,
            TargetFormat::Png => ImageFormat::Png,
            TargetFormat::Bmp | TargetFormat::MsBmp => ImageFormat::Bmp,
            TargetFormat::Tiff => ImageFormat::Tiff,
            TargetFormat::Gif => ImageFormat::Gif,
        }
    }

    pub fn is_lossy(self) -> bool {
        matches!(self, TargetFormat::Jpeg)
    }

    /// Color models the encoder for this format writes without conversion.
    pub fn accepted_color_types(self) -> &'static [ColorType] {
        match self {
            TargetFormat::Jpeg => &[ColorType::L8, ColorType::Rgb8],
            TargetFormat::Png => &[
                ColorType::L8,
                ColorType::La8,
                ColorType::Rgb8,
                ColorType::Rgba8,
                ColorType::L16,
                ColorType::La16,
                ColorType::Rgb16,
                ColorType::Rgba16,
            ],
            TargetFormat::Bmp | TargetFormat::MsBmp => &[
                ColorType::L8,
                ColorType::La8,
                ColorType::Rgb8,
                ColorType::Rgba8,
            ],
            TargetFormat::Tiff => &[
                ColorType::L8,
                ColorType::L16,
                ColorType::Rgb8,
                ColorType::Rgba8,
                ColorType::Rgb16,
                ColorType::Rgba16,
            ],
            TargetFormat::Gif => &[ColorType::Rgba8],
        }
    }
}

/// Lower-case extension for a MIME type: alias table first, then the subtype.
pub fn extension_for_mime(mime_type: &str) -> String {
    let mime_type = mime_type.trim().to_ascii_lowercase();
    if let Some((_, extension)) = EXTENSION_ALIASES
        .iter()
        .find(|(alias, _)| *alias == mime_type)
    {
        return (*extension).to_string();
    }
    match mime_type.split_once('/') {
        Some((_, subtype)) => subtype.to_string(),
        None => mime_type,
    }
}

impl FromStr for TargetFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        TargetFormat::ALL
            .into_iter()
            .find(|format| format.mime_type() == wanted)
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "Unsupported output file format '{}'. Expected one of: {}",
                    s,
                    TargetFormat::ALL.map(TargetFormat::mime_type).join(", ")
                ))
            })
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}
