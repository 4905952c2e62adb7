//! Input resolution
//!
//! Pulls the base64 image text (and the original filename, when there is
//! one) out of an item, either from a JSON field or from its attachment.

use crate::error::MissingPart;
use crate::models::{InputMode, InputSpec, Item, IMAGE_FILE_TYPE};
use crate::settings::ItemSettings;
use crate::{Error, Result};

/// Attachment slot read in file mode and written by the packager.
pub const BINARY_SLOT: &str = "data";

pub fn resolve(item: &Item, settings: &ItemSettings) -> Result<InputSpec> {
    match settings.input_type {
        InputMode::Base64 => resolve_base64(item, &settings.base64_field),
        InputMode::File => resolve_binary(item),
    }
}

fn resolve_base64(item: &Item, field: &str) -> Result<InputSpec> {
    let raw_data = item
        .json
        .get(field)
        .and_then(|value| value.as_str())
        .ok_or_else(|| Error::MissingInputField {
            field: field.to_string(),
        })?;

    Ok(InputSpec {
        mode: InputMode::Base64,
        raw_data: raw_data.to_string(),
        original_file_name: String::new(),
    })
}

fn resolve_binary(item: &Item) -> Result<InputSpec> {
    let binary = item.binary.as_ref().ok_or(Error::MissingBinaryData {
        missing: MissingPart::Attachments,
    })?;
    let attachment = binary.get(BINARY_SLOT).ok_or(Error::MissingBinaryData {
        missing: MissingPart::Slot,
    })?;
    let payload = attachment.data.as_ref().ok_or(Error::MissingBinaryData {
        missing: MissingPart::Payload,
    })?;

    if attachment.file_type.as_deref() != Some(IMAGE_FILE_TYPE) {
        return Err(Error::NotAnImage {
            file_type: attachment.file_type.clone(),
        });
    }

    Ok(InputSpec {
        mode: InputMode::File,
        raw_data: payload.clone(),
        original_file_name: attachment.file_name.clone().unwrap_or_default(),
    })
}
