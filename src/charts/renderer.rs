//! Static Chart Renderer
//! Turns a figure into the bytes of an image file.
//!
//! - SVG: plotters SVG backend into a string
//! - PNG / JPEG / WebP: plotters bitmap backend into an RGB buffer, encoded
//!   with the `image` crate
//! - PDF / EPS: the JPEG raster wrapped by the document module

use crate::charts::figure::Figure;
use crate::charts::plotter::draw_figure;
use crate::charts::text_safe::TextSafeBackend;
use crate::config::ImageFormat;
use crate::document::{eps_from_jpeg, pdf_from_jpeg};
use image::{DynamicImage, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("drawing failed: {0}")]
    Drawing(String),
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("rendered buffer does not match {width}x{height}")]
    Buffer { width: u32, height: u32 },
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the figure in the requested file format.
    pub fn render(figure: &Figure, format: ImageFormat) -> Result<Vec<u8>, RenderError> {
        let (width, height) = (figure.layout.width, figure.layout.height);
        debug!("Rendering {} chart as {} ({}x{})", figure.kind, format, width, height);

        match format {
            ImageFormat::Svg => Self::render_svg(figure).map(String::into_bytes),
            ImageFormat::Png => Self::encode_raster(figure, image::ImageFormat::Png),
            ImageFormat::Jpeg => Self::encode_raster(figure, image::ImageFormat::Jpeg),
            ImageFormat::Webp => Self::encode_raster(figure, image::ImageFormat::WebP),
            ImageFormat::Pdf => {
                let jpeg = Self::encode_raster(figure, image::ImageFormat::Jpeg)?;
                Ok(pdf_from_jpeg(&jpeg, width, height))
            }
            ImageFormat::Eps => {
                let jpeg = Self::encode_raster(figure, image::ImageFormat::Jpeg)?;
                Ok(eps_from_jpeg(&jpeg, width, height))
            }
        }
    }

    /// Render the figure as an SVG document.
    pub fn render_svg(figure: &Figure) -> Result<String, RenderError> {
        let size = (figure.layout.width, figure.layout.height);
        let mut svg = String::new();
        {
            let root = TextSafeBackend::new(SVGBackend::with_string(&mut svg, size))
                .into_drawing_area();
            draw_figure(&root, figure)?;
        }
        Ok(svg)
    }

    /// Render the figure into an RGB pixel buffer.
    pub fn render_rgb(figure: &Figure) -> Result<RgbImage, RenderError> {
        let (width, height) = (figure.layout.width, figure.layout.height);
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = TextSafeBackend::new(BitMapBackend::with_buffer(&mut buffer, (width, height)))
                .into_drawing_area();
            draw_figure(&root, figure)?;
        }
        RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Buffer { width, height })
    }

    fn encode_raster(figure: &Figure, format: image::ImageFormat) -> Result<Vec<u8>, RenderError> {
        let pixels = Self::render_rgb(figure)?;
        let mut encoded = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(pixels).write_to(&mut encoded, format)?;
        Ok(encoded.into_inner())
    }
}
