//! Converter parameters and per-item settings resolution
//!
//! Parameters are layered: built-in defaults, `CONVERTER_*` environment
//! variables, batch-level parameters, then per-item overrides. Each item gets
//! an immutable [`ItemSettings`] snapshot before its pipeline runs.

use crate::image::TargetFormat;
use crate::models::{ConversionRequest, InputMode, OutputMode};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE64_FIELD: &str = "data";
pub const DEFAULT_QUALITY: f64 = 80.0;

/// Fully populated parameter set shared by a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterParameters {
    pub input_type: InputMode,
    pub base64_field: String,
    pub output_file_format: TargetFormat,
    pub output_type: OutputMode,
    /// Unvalidated; checked and rounded when an item's settings are resolved.
    pub quality: f64,
    pub continue_on_fail: bool,
}

impl Default for ConverterParameters {
    fn default() -> Self {
        Self {
            input_type: InputMode::File,
            base64_field: DEFAULT_BASE64_FIELD.to_string(),
            output_file_format: TargetFormat::Jpeg,
            output_type: OutputMode::File,
            quality: DEFAULT_QUALITY,
            continue_on_fail: false,
        }
    }
}

/// Sparse parameter values as they appear in batch documents, on items, in
/// the environment, or on the command line.
///
/// Enumerated values stay as strings so an unknown value on one item fails
/// that item instead of the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_on_fail: Option<bool>,
}

impl ParameterOverrides {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Read `CONVERTER_*` variables, loading `.env` first when present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let quality = lookup("CONVERTER_QUALITY")
            .map(|raw| {
                raw.trim().parse::<f64>().map_err(|_| {
                    Error::Configuration(format!("CONVERTER_QUALITY '{}' is not a number", raw))
                })
            })
            .transpose()?;
        let continue_on_fail = lookup("CONVERTER_CONTINUE_ON_FAIL")
            .map(|raw| parse_bool(&raw))
            .transpose()?;

        Ok(Self {
            input_type: lookup("CONVERTER_INPUT_TYPE"),
            base64_field: lookup("CONVERTER_BASE64_FIELD"),
            output_file_format: lookup("CONVERTER_OUTPUT_FILE_FORMAT"),
            output_type: lookup("CONVERTER_OUTPUT_TYPE"),
            quality,
            continue_on_fail,
        })
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Configuration(format!(
            "CONVERTER_CONTINUE_ON_FAIL '{}' is not a boolean",
            raw
        ))),
    }
}

/// Immutable settings for one item's pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSettings {
    pub input_type: InputMode,
    pub base64_field: String,
    pub request: ConversionRequest,
}

impl ConverterParameters {
    pub fn apply(&mut self, overrides: &ParameterOverrides) -> Result<()> {
        if let Some(input_type) = &overrides.input_type {
            self.input_type = input_type.parse()?;
        }
        if let Some(base64_field) = &overrides.base64_field {
            self.base64_field = base64_field.clone();
        }
        if let Some(format) = &overrides.output_file_format {
            self.output_file_format = format.parse()?;
        }
        if let Some(output_type) = &overrides.output_type {
            self.output_type = output_type.parse()?;
        }
        if let Some(quality) = overrides.quality {
            self.quality = quality;
        }
        if let Some(continue_on_fail) = overrides.continue_on_fail {
            self.continue_on_fail = continue_on_fail;
        }
        Ok(())
    }

    pub fn with_overrides(mut self, overrides: &ParameterOverrides) -> Result<Self> {
        self.apply(overrides)?;
        Ok(self)
    }

    /// Merge an item's overrides and validate the result.
    ///
    /// `continue_on_fail` is a batch-level policy; item overrides of it are
    /// ignored here.
    pub fn resolve_item(&self, overrides: &ParameterOverrides) -> Result<ItemSettings> {
        let merged = self.clone().with_overrides(overrides)?;
        let quality = validate_quality(merged.quality)?;

        Ok(ItemSettings {
            input_type: merged.input_type,
            base64_field: merged.base64_field,
            request: ConversionRequest {
                target_format: merged.output_file_format,
                output_mode: merged.output_type,
                quality,
            },
        })
    }
}

/// Fractional qualities round to the nearest step.
fn validate_quality(quality: f64) -> Result<u8> {
    if quality.is_finite() && (0.0..=100.0).contains(&quality) {
        Ok(quality.round() as u8)
    } else {
        Err(Error::Configuration(format!(
            "Quality {} is outside the range 0-100",
            quality
        )))
    }
}
