//! Chart Writer Module
//! Validates chart options, renders them and writes the image files.

use crate::charts::{Figure, RenderError, StaticChartRenderer};
use crate::config::{ChartKind, ChartOptions, ConfigError, ImageFormat, LoadedChart};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum WriteError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("output directory {0} does not exist")]
    MissingDirectory(PathBuf),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of one written chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteReport {
    pub chart: ChartKind,
    pub format: ImageFormat,
    pub path: PathBuf,
    pub bytes: usize,
}

/// Writes chart images to disk.
#[derive(Debug, Clone, Default)]
pub struct ChartWriter {
    create_dirs: bool,
}

impl ChartWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create missing output directories instead of failing.
    pub fn create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }

    /// Render one chart and write it to `<path>/<filename>.<format>`.
    pub fn write(&self, options: &ChartOptions) -> Result<WriteReport, WriteError> {
        let figure = Figure::from_options(options)?;
        let path = options.output_path();

        if !options.path.as_os_str().is_empty() && !options.path.is_dir() {
            if !self.create_dirs {
                return Err(WriteError::MissingDirectory(options.path.clone()));
            }
            fs::create_dir_all(&options.path).map_err(|source| WriteError::Io {
                path: options.path.clone(),
                source,
            })?;
            debug!("Created output directory {}", options.path.display());
        }

        let bytes = StaticChartRenderer::render(&figure, options.format)?;
        fs::write(&path, &bytes).map_err(|source| WriteError::Io {
            path: path.clone(),
            source,
        })?;
        info!("Wrote {} chart: {}", options.kind, path.display());

        Ok(WriteReport {
            chart: options.kind,
            format: options.format,
            path,
            bytes: bytes.len(),
        })
    }

    /// Write a batch in parallel. Results keep the input order.
    pub fn write_all(&self, charts: &[LoadedChart]) -> Vec<Result<WriteReport, WriteError>> {
        charts
            .par_iter()
            .map(|chart| self.write(&chart.options))
            .collect()
    }
}
