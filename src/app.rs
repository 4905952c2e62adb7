//! Application orchestration: fetch a batch from the host, convert it, and
//! hand the results back.

use crate::batch::BatchDriver;
use crate::host::{FileHost, HostService};
use crate::image::{CodecService, ImageCodec};
use crate::models::Item;
use crate::settings::{ConverterParameters, ParameterOverrides};
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Coordinates the host collaborator and the batch driver.
pub struct App {
    host: Box<dyn HostService>,
    codec: Arc<dyn CodecService>,
    base_parameters: ConverterParameters,
    overrides: ParameterOverrides,
    max_concurrency: usize,
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// `base_parameters` sit below the batch document's own parameters;
    /// `overrides` (typically command-line flags) sit above them.
    pub fn with_services(
        host: Box<dyn HostService>,
        codec: Arc<dyn CodecService>,
        base_parameters: ConverterParameters,
    ) -> Self {
        Self {
            host,
            codec,
            base_parameters,
            overrides: ParameterOverrides::default(),
            max_concurrency: 1,
        }
    }

    /// File-backed app using built-in defaults plus `CONVERTER_*` environment.
    pub fn new(input: Option<PathBuf>, output: Option<PathBuf>) -> Result<Self> {
        let base_parameters =
            ConverterParameters::default().with_overrides(&ParameterOverrides::from_env()?)?;

        Ok(Self::with_services(
            Box::new(FileHost::new(input, output)),
            Arc::new(ImageCodec::new()),
            base_parameters,
        ))
    }

    pub fn with_overrides(mut self, overrides: ParameterOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Convert the host's batch and emit the results.
    ///
    /// Under strict mode a failing item aborts the run before anything is
    /// emitted.
    pub async fn run(&self) -> Result<Vec<Item>> {
        let batch = self.host.fetch_batch().await?;

        let parameters = self
            .base_parameters
            .clone()
            .with_overrides(&batch.parameters)?
            .with_overrides(&self.overrides)?;
        info!(
            "Batch parameters: {} input, {} output as {}",
            parameters.input_type, parameters.output_type, parameters.output_file_format
        );

        let driver = BatchDriver::new(Arc::clone(&self.codec), parameters)
            .with_max_concurrency(self.max_concurrency);
        let results = driver.run(batch.items).await?;

        self.host.emit_results(&results).await?;
        Ok(results)
    }
}
