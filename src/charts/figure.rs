//! Figure Module
//! Render-ready traces and layout built from chart options.

use crate::charts::palette::{color_or_default, parse_color};
use crate::config::{ChartKind, ChartOptions, ConfigError, LineShape, DEFAULT_FONT_FAMILY};
use plotters::style::RGBColor;
use tracing::warn;

/// Text font shared by every label of a figure
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: u32,
    pub color: RGBColor,
}

/// Figure-wide layout options
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub legend_title: Option<String>,
    pub font: FontSpec,
}

/// One named trace of a line or bar chart
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
    pub color: RGBColor,
}

impl Series {
    /// Split the trace into runs of consecutive present points, as
    /// `(category index, value)` pairs.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (i, value) in self.values.iter().enumerate() {
            match value {
                Some(v) => current.push((i as f64, *v)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    pub fn point_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// One slice of a pie or donut chart
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub value: f64,
    pub color: RGBColor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Plot {
    Line {
        categories: Vec<String>,
        series: Vec<Series>,
        shape: LineShape,
    },
    Bar {
        categories: Vec<String>,
        series: Vec<Series>,
    },
    Pie {
        slices: Vec<Slice>,
        /// Hole radius as a fraction of the pie radius; 0 for a full pie.
        hole: f64,
    },
}

/// Legend marker shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swatch {
    Line,
    Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub name: String,
    pub color: RGBColor,
    pub swatch: Swatch,
}

/// A chart ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub kind: ChartKind,
    pub layout: Layout,
    pub plot: Plot,
}

impl Figure {
    /// Validate the options and build traces and layout from them.
    pub fn from_options(opts: &ChartOptions) -> Result<Self, ConfigError> {
        opts.validate()?;

        let font = FontSpec {
            family: primary_family(&opts.font_family),
            size: opts.font_size,
            color: parse_color(&opts.font_color)
                .map_err(|source| ConfigError::Color {
                    option: "fontcolor",
                    source,
                })?
                .unwrap_or(RGBColor(0, 0, 0)),
        };

        let mut layout = Layout {
            width: opts.width,
            height: opts.height,
            title: non_empty(opts.title.as_deref()),
            x_title: None,
            y_title: None,
            legend_title: None,
            font,
        };

        let plot = match opts.kind {
            ChartKind::Line | ChartKind::Bar => {
                let (categories, series) = build_series(opts)?;

                layout.x_title = non_empty(opts.x_axis_name.as_deref());
                layout.legend_title = non_empty(opts.legend_title.as_deref());
                // A lone trace is identified by the axis title instead of a legend
                if opts.y_axis_names.len() <= 1 {
                    let joined = opts
                        .y_axis_names
                        .iter()
                        .map(|n| n.0.as_str())
                        .collect::<Vec<_>>()
                        .join(" ");
                    layout.y_title = non_empty(Some(&joined));
                }

                if opts.kind == ChartKind::Line {
                    Plot::Line {
                        categories,
                        series,
                        shape: opts.line_shape.unwrap_or_default(),
                    }
                } else {
                    if opts.line_shape.is_some() {
                        warn!("shape_line has no effect on bar charts; ignoring it");
                    }
                    Plot::Bar { categories, series }
                }
            }
            ChartKind::Pie | ChartKind::Donut => Plot::Pie {
                slices: build_slices(opts)?,
                hole: if opts.kind == ChartKind::Donut {
                    opts.hole_size
                } else {
                    0.0
                },
            },
        };

        Ok(Figure {
            kind: opts.kind,
            layout,
            plot,
        })
    }

    /// Get legend rows, or `None` when the chart has no legend.
    ///
    /// Line and bar charts show one only for several traces; pie charts
    /// always list their slices.
    pub fn legend(&self) -> Option<Vec<LegendEntry>> {
        let entries: Vec<LegendEntry> = match &self.plot {
            Plot::Line { series, .. } if series.len() > 1 => {
                legend_rows(series, Swatch::Line)
            }
            Plot::Bar { series, .. } if series.len() > 1 => legend_rows(series, Swatch::Block),
            Plot::Pie { slices, .. } => slices
                .iter()
                .map(|s| LegendEntry {
                    name: s.label.clone(),
                    color: s.color,
                    swatch: Swatch::Block,
                })
                .collect(),
            _ => return None,
        };
        Some(entries)
    }
}

fn legend_rows(series: &[Series], swatch: Swatch) -> Vec<LegendEntry> {
    series
        .iter()
        .map(|s| LegendEntry {
            name: s.name.clone(),
            color: s.color,
            swatch,
        })
        .collect()
}

fn build_series(opts: &ChartOptions) -> Result<(Vec<String>, Vec<Series>), ConfigError> {
    let raw = opts.y_axis.series();
    let longest = raw.iter().map(Vec::len).max().unwrap_or(0);

    let categories: Vec<String> = if opts.x_axis.is_empty() {
        (0..longest).map(|i| i.to_string()).collect()
    } else {
        opts.x_axis.iter().map(|l| l.0.clone()).collect()
    };

    if opts.y_axis_names.len() > raw.len() {
        warn!(
            "{} yaxisname entries for {} yaxis series; extra names ignored",
            opts.y_axis_names.len(),
            raw.len()
        );
    }
    if opts.y_axis_colors.len() > raw.len() {
        warn!(
            "{} yaxiscolor entries for {} yaxis series; extra colors ignored",
            opts.y_axis_colors.len(),
            raw.len()
        );
    }

    let series = raw
        .into_iter()
        .enumerate()
        .map(|(i, mut values)| {
            if values.len() > categories.len() {
                warn!(
                    "yaxis series {} has {} values for {} xaxis categories; truncating",
                    i,
                    values.len(),
                    categories.len()
                );
                values.truncate(categories.len());
            }
            let name = opts
                .y_axis_names
                .get(i)
                .map(|n| n.0.trim())
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("trace {}", i));
            let color = color_or_default(opts.y_axis_colors.get(i), i).map_err(|source| {
                ConfigError::Color {
                    option: "yaxiscolor",
                    source,
                }
            })?;
            Ok(Series {
                name,
                values,
                color,
            })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok((categories, series))
}

fn build_slices(opts: &ChartOptions) -> Result<Vec<Slice>, ConfigError> {
    if opts.slice_labels.len() > opts.slice_data.len() {
        warn!(
            "{} slicelabel entries for {} slices; extra labels ignored",
            opts.slice_labels.len(),
            opts.slice_data.len()
        );
    }

    opts.slice_data
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let label = opts
                .slice_labels
                .get(i)
                .map(|l| l.0.trim())
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| i.to_string());
            let color = color_or_default(opts.slice_colors.get(i), i).map_err(|source| {
                ConfigError::Color {
                    option: "slicecolor",
                    source,
                }
            })?;
            Ok(Slice {
                label,
                value: point.0.unwrap_or(0.0),
                color,
            })
        })
        .collect()
}

/// First entry of a CSS-style family list, e.g. `"Courier New", monospace`.
fn primary_family(list: &str) -> String {
    list.split(',')
        .map(|f| f.trim().trim_matches(|c: char| c == '"' || c == '\'').to_string())
        .find(|f| !f.is_empty())
        .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
