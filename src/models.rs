//! Data models and structures
//!
//! Defines the host item shape (structured JSON plus named binary
//! attachments), the batch document, and the per-item pipeline records that
//! flow from input resolution through encoding to packaging.

use crate::image::TargetFormat;
use crate::settings::ParameterOverrides;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Content-kind tag the host puts on image attachments.
pub const IMAGE_FILE_TYPE: &str = "image";

/// Where the source image is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    Base64,
    File,
}

/// How the converted image is handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Base64,
    File,
}

fn parse_mode(input: &str, what: &str) -> Result<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "base64" => Ok(true),
        "file" => Ok(false),
        other => Err(Error::Configuration(format!(
            "Unknown {} '{}'. Expected 'base64' or 'file'",
            what, other
        ))),
    }
}

impl FromStr for InputMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(if parse_mode(s, "input type")? {
            InputMode::Base64
        } else {
            InputMode::File
        })
    }
}

impl FromStr for OutputMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(if parse_mode(s, "output type")? {
            OutputMode::Base64
        } else {
            OutputMode::File
        })
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputMode::Base64 => "base64",
            InputMode::File => "file",
        })
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputMode::Base64 => "base64",
            OutputMode::File => "file",
        })
    }
}

/// A binary attachment as the host represents it.
///
/// Every field is optional on input; the packager fills all of them on output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// One unit of work exchanged with the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub json: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<BTreeMap<String, BinaryData>>,
}

impl Item {
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.json.insert(key.to_string(), value.into());
        self
    }

    pub fn with_attachment(mut self, slot: &str, data: BinaryData) -> Self {
        self.binary
            .get_or_insert_with(BTreeMap::new)
            .insert(slot.to_string(), data);
        self
    }

    /// Failure marker emitted in place of an item under tolerant mode.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::default().with_field("error", message.into())
    }

    pub fn attachment(&self, slot: &str) -> Option<&BinaryData> {
        self.binary.as_ref().and_then(|binary| binary.get(slot))
    }

    pub fn error_message(&self) -> Option<&str> {
        self.json.get("error").and_then(Value::as_str)
    }
}

/// An item as it appears in a batch document, with optional per-item
/// parameter overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchItem {
    #[serde(flatten)]
    pub item: Item,
    #[serde(default, skip_serializing_if = "ParameterOverrides::is_empty")]
    pub parameters: ParameterOverrides,
}

impl From<Item> for BatchItem {
    fn from(item: Item) -> Self {
        Self {
            item,
            parameters: ParameterOverrides::default(),
        }
    }
}

/// A batch document: shared parameters plus the items to convert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub parameters: ParameterOverrides,
    #[serde(default)]
    pub items: Vec<BatchItem>,
}

/// Raw image text and naming context pulled out of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub mode: InputMode,
    /// Still base64 text; decoding to bytes belongs to the codec.
    pub raw_data: String,
    /// Empty when the source carried no name.
    pub original_file_name: String,
}

/// What to produce for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionRequest {
    pub target_format: TargetFormat,
    pub output_mode: OutputMode,
    /// Only consulted for JPEG.
    pub quality: u8,
}

/// Encoded bytes plus the metadata derived from the requested format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedResult {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub extension: String,
}

impl EncodedResult {
    pub fn new(bytes: Vec<u8>, format: TargetFormat) -> Self {
        Self {
            bytes,
            mime_type: format.mime_type(),
            extension: format.extension(),
        }
    }
}

/// Successful conversion output for one item.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputRecord {
    Inline { data: String },
    Attachment(BinaryData),
}

impl OutputRecord {
    pub fn into_item(self) -> Item {
        match self {
            OutputRecord::Inline { data } => {
                Item::default().with_field(crate::output::OUTPUT_FIELD, data)
            }
            OutputRecord::Attachment(binary) => {
                Item::default().with_attachment(crate::input::BINARY_SLOT, binary)
            }
        }
    }
}
