//! Output packaging
//!
//! Turns encoded bytes into either an inline base64 field or an image
//! attachment with derived name, extension and size label.

use crate::models::{BinaryData, EncodedResult, OutputMode, OutputRecord, IMAGE_FILE_TYPE};
use base64::Engine as _;

/// JSON field holding inline base64 output.
pub const OUTPUT_FIELD: &str = "data";

/// Base name used when the source carried no filename.
pub const DEFAULT_BASE_NAME: &str = "image";

pub fn package(
    encoded: &EncodedResult,
    output_mode: OutputMode,
    original_file_name: &str,
) -> OutputRecord {
    let data = base64::engine::general_purpose::STANDARD.encode(&encoded.bytes);

    match output_mode {
        OutputMode::Base64 => OutputRecord::Inline { data },
        OutputMode::File => OutputRecord::Attachment(BinaryData {
            file_name: Some(derive_file_name(original_file_name, &encoded.extension)),
            file_type: Some(IMAGE_FILE_TYPE.to_string()),
            data: Some(data),
            file_size: Some(size_label(encoded.bytes.len())),
            file_extension: Some(encoded.extension.clone()),
            mime_type: Some(encoded.mime_type.to_string()),
        }),
    }
}

/// Base name followed directly by the new extension.
///
/// No `.` is inserted between the two: `photo.png` becomes `photojpeg`.
/// Everything from the last `.` on is dropped, so a name without any `.`
/// leaves an empty base (`scan` becomes `tiff`).
pub fn derive_file_name(original_file_name: &str, extension: &str) -> String {
    let base = if original_file_name.is_empty() {
        DEFAULT_BASE_NAME
    } else {
        original_file_name
            .rsplit_once('.')
            .map_or("", |(base, _)| base)
    };
    format!("{}{}", base, extension)
}

/// Size in kB rounded to one decimal, e.g. `"12.3 kB"` or `"4 kB"`.
pub fn size_label(len: usize) -> String {
    let kilobytes = (len as f64 / 1024.0 * 10.0).round() / 10.0;
    format!("{} kB", kilobytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::TargetFormat;
    use pretty_assertions::assert_eq;

    fn encoded(format: TargetFormat, len: usize) -> EncodedResult {
        EncodedResult::new(vec![0xAB; len], format)
    }

    #[test]
    fn test_file_name_concatenates_without_separator() {
        assert_eq!(derive_file_name("photo.png", "jpeg"), "photojpeg");
        assert_eq!(derive_file_name("archive.tar.gz", "png"), "archive.tarpng");
    }

    #[test]
    fn test_file_name_defaults_to_image() {
        assert_eq!(derive_file_name("", "gif"), "imagegif");
    }

    #[test]
    fn test_file_name_without_dot_has_empty_base() {
        assert_eq!(derive_file_name("scan", "tiff"), "tiff");
        assert_eq!(derive_file_name(".hidden", "png"), "png");
        assert_eq!(derive_file_name("a.", "png"), "apng");
    }

    #[test]
    fn test_size_label_rounding() {
        assert_eq!(size_label(0), "0 kB");
        assert_eq!(size_label(1024), "1 kB");
        assert_eq!(size_label(1536), "1.5 kB");
        assert_eq!(size_label(12_595), "12.3 kB");
        assert_eq!(size_label(100), "0.1 kB");
    }

    #[test]
    fn test_base64_output_has_no_metadata() {
        let record = package(&encoded(TargetFormat::Png, 3), OutputMode::Base64, "photo.jpg");
        assert_eq!(
            record,
            OutputRecord::Inline {
                data: "q6ur".to_string()
            }
        );
    }

    #[test]
    fn test_file_output_metadata() {
        let record = package(
            &encoded(TargetFormat::MsBmp, 2048),
            OutputMode::File,
            "photo.png",
        );

        let OutputRecord::Attachment(binary) = record else {
            panic!("expected attachment record");
        };
        assert_eq!(binary.file_name.as_deref(), Some("photobmp"));
        assert_eq!(binary.file_type.as_deref(), Some("image"));
        assert_eq!(binary.file_size.as_deref(), Some("2 kB"));
        assert_eq!(binary.file_extension.as_deref(), Some("bmp"));
        assert_eq!(binary.mime_type.as_deref(), Some("image/x-ms-bmp"));
        assert!(binary.data.is_some());
    }

    #[test]
    fn test_package_is_idempotent() {
        let result = encoded(TargetFormat::Jpeg, 777);
        let first = package(&result, OutputMode::File, "a.png");
        let second = package(&result, OutputMode::File, "a.png");
        assert_eq!(first, second);
    }
}
