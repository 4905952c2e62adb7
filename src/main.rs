use anyhow::Result;
use clap::Parser;
use image_format_converter::app::App;
use image_format_converter::image::TargetFormat;
use image_format_converter::models::{InputMode, OutputMode};
use image_format_converter::settings::ParameterOverrides;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "image-format-converter")]
#[command(about = "Convert a batch of images between JPEG, PNG, BMP, TIFF and GIF")]
struct CliArgs {
    /// Batch document (JSON), or `-` to read stdin.
    #[arg(value_name = "INPUT")]
    input: String,

    /// Where to write the result items; stdout when omitted.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Record failed items as `{"error": ...}` instead of aborting.
    #[arg(long)]
    continue_on_fail: bool,

    #[arg(long, value_name = "base64|file", value_parser = parse_input_type_arg)]
    input_type: Option<InputMode>,

    /// JSON field holding the image when the input type is base64.
    #[arg(long, value_name = "FIELD")]
    base64_field: Option<String>,

    /// Target MIME type, e.g. image/png.
    #[arg(long, value_name = "MIME", value_parser = parse_format_arg)]
    output_format: Option<TargetFormat>,

    #[arg(long, value_name = "base64|file", value_parser = parse_output_type_arg)]
    output_type: Option<OutputMode>,

    /// JPEG quality (0-100).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: Option<u8>,

    /// Number of items converted in parallel.
    #[arg(long, default_value_t = 1)]
    concurrency: usize,
}

impl CliArgs {
    fn overrides(&self) -> ParameterOverrides {
        ParameterOverrides {
            input_type: self.input_type.map(|mode| mode.to_string()),
            base64_field: self.base64_field.clone(),
            output_file_format: self.output_format.map(|f| f.mime_type().to_string()),
            output_type: self.output_type.map(|mode| mode.to_string()),
            quality: self.quality.map(f64::from),
            continue_on_fail: self.continue_on_fail.then_some(true),
        }
    }

    fn input_path(&self) -> Option<PathBuf> {
        (self.input != "-").then(|| PathBuf::from(&self.input))
    }
}

fn parse_format_arg(input: &str) -> std::result::Result<TargetFormat, String> {
    input.parse().map_err(|e| format!("{}", e))
}

fn parse_input_type_arg(input: &str) -> std::result::Result<InputMode, String> {
    input.parse().map_err(|e| format!("{}", e))
}

fn parse_output_type_arg(input: &str) -> std::result::Result<OutputMode, String> {
    input.parse().map_err(|e| format!("{}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_format_converter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    info!("Starting image-format-converter");

    let app = match App::new(args.input_path(), args.output.clone()) {
        Ok(app) => app
            .with_overrides(args.overrides())
            .with_max_concurrency(args.concurrency),
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    match app.run().await {
        Ok(results) => {
            info!("Conversion completed ({} result item(s))", results.len());
            Ok(())
        }
        Err(e) => {
            error!("Conversion failed: {}", e);
            std::process::exit(1);
        }
    }
}
