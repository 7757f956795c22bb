//! Chart Options Module
//! Typed chart definitions, option defaults and validation.

use crate::charts::palette::{parse_color, ColorError};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;
pub const DEFAULT_FONT_SIZE: u32 = 18;
pub const DEFAULT_FONT_COLOR: &str = "#000000";
pub const DEFAULT_FONT_FAMILY: &str = "monospace";
pub const DEFAULT_HOLE_SIZE: f64 = 0.5;

const MIN_DIMENSION: u32 = 10;
const MAX_DIMENSION: u32 = 10_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{option} must be between 10 and 10000 pixels, got {value}")]
    Dimension { option: &'static str, value: u32 },
    #[error("fontsize must be at least 1")]
    FontSize,
    #[error("invalid filename '{0}': must be non-empty and contain no path separators")]
    Filename(String),
    #[error("{option}: {source}")]
    Color {
        option: &'static str,
        #[source]
        source: ColorError,
    },
    #[error("{0} chart requires at least one non-empty yaxis series")]
    MissingSeries(ChartKind),
    #[error("{0} chart requires slicedata")]
    MissingSlices(ChartKind),
    #[error("slicedata[{index}] is {reason}")]
    InvalidSlice { index: usize, reason: &'static str },
    #[error("yaxis values span {lo} to {hi}, too wide to draw")]
    ValueSpan { lo: f64, hi: f64 },
    #[error("slicedata must sum to a positive value")]
    ZeroTotal,
    #[error("slicedata sum overflows")]
    TotalOverflow,
    #[error("sizehole must be in [0, 1), got {0}")]
    HoleSize(f64),
}

/// Chart type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Donut,
}

impl ChartKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Donut => "donut",
        }
    }

    /// Line and bar charts share a category axis; pie and donut do not.
    pub fn is_cartesian(&self) -> bool {
        matches!(self, ChartKind::Line | ChartKind::Bar)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Line interpolation between points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineShape {
    #[default]
    Linear,
    Spline,
}

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
    Webp,
    Svg,
    Pdf,
    Eps,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
            ImageFormat::Svg => "svg",
            ImageFormat::Pdf => "pdf",
            ImageFormat::Eps => "eps",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A single data value. Numbers, numeric strings and `null` are accepted;
/// `null`, empty strings and non-finite values are missing points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DataPoint(pub Option<f64>);

impl<'de> Deserialize<'de> for DataPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        let value = match Option::<Raw>::deserialize(deserializer)? {
            None => None,
            Some(Raw::Number(v)) => Some(v),
            Some(Raw::Text(text)) if text.trim().is_empty() => None,
            Some(Raw::Text(text)) => Some(text.trim().parse::<f64>().map_err(|_| {
                serde::de::Error::custom(format!("'{}' is not a number", text))
            })?),
        };

        Ok(DataPoint(value.filter(|v| v.is_finite())))
    }
}

/// A text label; scalar values are stringified.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Label(pub String);

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Integer(i64),
            Float(f64),
            Bool(bool),
        }

        let text = match Option::<Raw>::deserialize(deserializer)? {
            None => String::new(),
            Some(Raw::Text(text)) => text,
            Some(Raw::Integer(v)) => v.to_string(),
            Some(Raw::Float(v)) => format!("{:?}", v),
            Some(Raw::Bool(v)) => v.to_string(),
        };
        Ok(Label(text))
    }
}

/// Y axis data: one list per trace, or a single flat list for one trace.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SeriesData {
    Nested(Vec<Vec<DataPoint>>),
    Flat(Vec<DataPoint>),
}

impl Default for SeriesData {
    fn default() -> Self {
        SeriesData::Nested(Vec::new())
    }
}

impl SeriesData {
    /// Get the values of every trace.
    pub fn series(&self) -> Vec<Vec<Option<f64>>> {
        let unwrap = |points: &Vec<DataPoint>| points.iter().map(|p| p.0).collect();
        match self {
            SeriesData::Nested(series) => series.iter().map(unwrap).collect(),
            SeriesData::Flat(points) if points.is_empty() => Vec::new(),
            SeriesData::Flat(points) => vec![unwrap(points)],
        }
    }
}

/// One chart definition, keyed by the established option names.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartOptions {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    #[serde(rename = "titlechart", default)]
    pub title: Option<String>,
    #[serde(rename = "imgwidth", default = "default_width")]
    pub width: u32,
    #[serde(rename = "imgheight", default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub format: ImageFormat,
    pub path: PathBuf,
    pub filename: String,

    #[serde(rename = "xaxis", default)]
    pub x_axis: Vec<Label>,
    #[serde(rename = "xaxisname", default)]
    pub x_axis_name: Option<String>,
    #[serde(rename = "yaxis", default)]
    pub y_axis: SeriesData,
    #[serde(rename = "yaxisname", default)]
    pub y_axis_names: Vec<Label>,
    #[serde(rename = "yaxiscolor", default)]
    pub y_axis_colors: Vec<String>,
    #[serde(rename = "shape_line", default)]
    pub line_shape: Option<LineShape>,

    #[serde(rename = "fontsize", default = "default_font_size")]
    pub font_size: u32,
    #[serde(rename = "fontcolor", default = "default_font_color")]
    pub font_color: String,
    #[serde(rename = "fontfamily", default = "default_font_family")]
    pub font_family: String,
    #[serde(rename = "titlelegend", default)]
    pub legend_title: Option<String>,

    #[serde(rename = "slicedata", default)]
    pub slice_data: Vec<DataPoint>,
    #[serde(rename = "slicelabel", default)]
    pub slice_labels: Vec<Label>,
    #[serde(rename = "slicecolor", default)]
    pub slice_colors: Vec<String>,
    #[serde(rename = "sizehole", default = "default_hole_size")]
    pub hole_size: f64,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

fn default_font_color() -> String {
    DEFAULT_FONT_COLOR.to_string()
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

fn default_hole_size() -> f64 {
    DEFAULT_HOLE_SIZE
}

impl ChartOptions {
    /// Check every option that would otherwise fail during rendering.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_dimension("imgwidth", self.width)?;
        check_dimension("imgheight", self.height)?;

        if self.font_size == 0 {
            return Err(ConfigError::FontSize);
        }
        if self.filename.trim().is_empty() || self.filename.contains(['/', '\\']) {
            return Err(ConfigError::Filename(self.filename.clone()));
        }

        check_color("fontcolor", &self.font_color)?;

        if self.kind.is_cartesian() {
            for color in &self.y_axis_colors {
                check_color("yaxiscolor", color)?;
            }
            let series = self.y_axis.series();
            if series.iter().all(|s| s.is_empty()) {
                return Err(ConfigError::MissingSeries(self.kind));
            }
            return check_value_span(&series, self.kind == ChartKind::Bar);
        }

        for color in &self.slice_colors {
            check_color("slicecolor", color)?;
        }
        if self.slice_data.is_empty() {
            return Err(ConfigError::MissingSlices(self.kind));
        }
        let mut total = 0.0;
        for (index, point) in self.slice_data.iter().enumerate() {
            match point.0 {
                None => {
                    return Err(ConfigError::InvalidSlice {
                        index,
                        reason: "missing",
                    })
                }
                Some(v) if v < 0.0 => {
                    return Err(ConfigError::InvalidSlice {
                        index,
                        reason: "negative",
                    })
                }
                Some(v) => total += v,
            }
        }
        if !total.is_finite() {
            return Err(ConfigError::TotalOverflow);
        }
        if total <= 0.0 {
            return Err(ConfigError::ZeroTotal);
        }
        if self.kind == ChartKind::Donut && !(0.0..1.0).contains(&self.hole_size) {
            return Err(ConfigError::HoleSize(self.hole_size));
        }

        Ok(())
    }

    /// Get the file the chart is written to: `<path>/<filename>.<format>`.
    pub fn output_path(&self) -> PathBuf {
        self.path
            .join(format!("{}.{}", self.filename, self.format.extension()))
    }
}

/// The axis range, bars anchored at zero, must have a finite width.
fn check_value_span(series: &[Vec<Option<f64>>], include_zero: bool) -> Result<(), ConfigError> {
    let (mut lo, mut hi) = series
        .iter()
        .flatten()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return Ok(());
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if (hi - lo).is_finite() {
        Ok(())
    } else {
        Err(ConfigError::ValueSpan { lo, hi })
    }
}

fn check_dimension(option: &'static str, value: u32) -> Result<(), ConfigError> {
    if (MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Dimension { option, value })
    }
}

fn check_color(option: &'static str, value: &str) -> Result<(), ConfigError> {
    parse_color(value)
        .map(|_| ())
        .map_err(|source| ConfigError::Color { option, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE_CHART: &str = r##"
titlechart: "Day Performance"
type: line
xaxis: ['00:00', '02:00', '04:00', '06:00']
xaxisname: "Date time"
yaxis:
  - [20, 20, 30, 40]
  - [05, 15, 25, 20]
yaxisname: ["%cpu", "%memory"]
yaxiscolor: ["#1500ff", "#ff00b7"]
titlelegend: "Line Legend"
shape_line: spline
path: /tmp/chart_collection
filename: day_performance_linechart
"##;

    fn parse(yaml: &str) -> ChartOptions {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn parses_line_chart_with_defaults() {
        let opts = parse(LINE_CHART);

        assert_eq!(opts.kind, ChartKind::Line);
        assert_eq!(opts.width, DEFAULT_WIDTH);
        assert_eq!(opts.height, DEFAULT_HEIGHT);
        assert_eq!(opts.format, ImageFormat::Png);
        assert_eq!(opts.font_size, 18);
        assert_eq!(opts.font_color, "#000000");
        assert_eq!(opts.line_shape, Some(LineShape::Spline));
        assert_eq!(opts.x_axis.len(), 4);
        assert_eq!(
            opts.y_axis.series()[1],
            vec![Some(5.0), Some(15.0), Some(25.0), Some(20.0)]
        );
        assert!(opts.validate().is_ok());
        assert_eq!(
            opts.output_path(),
            PathBuf::from("/tmp/chart_collection/day_performance_linechart.png")
        );
    }

    #[test]
    fn accepts_flat_series_strings_and_nulls() {
        let opts = parse(
            "type: bar\npath: out\nfilename: b\nformat: jpg\nxaxis: [2020, 2021, true]\nyaxis: ['1.5', null, 3, '']\n",
        );

        assert_eq!(opts.format, ImageFormat::Jpeg);
        assert_eq!(opts.output_path(), PathBuf::from("out/b.jpeg"));
        assert_eq!(
            opts.x_axis,
            vec![
                Label("2020".into()),
                Label("2021".into()),
                Label("true".into())
            ]
        );
        assert_eq!(opts.y_axis.series(), vec![vec![Some(1.5), None, Some(3.0), None]]);
    }

    #[test]
    fn float_labels_keep_their_decimal_point() {
        let opts = parse("type: line
path: out
filename: l
xaxis: [1.0, 2.5, 3]
yaxis: [1, 2, 3]
");

        assert_eq!(
            opts.x_axis,
            vec![Label("1.0".into()), Label("2.5".into()), Label("3".into())]
        );
    }

    #[test]
    fn rejects_unknown_options_and_bad_numbers() {
        assert!(serde_yaml::from_str::<ChartOptions>(
            "type: pie\npath: p\nfilename: f\nslicedat: [1]\n"
        )
        .is_err());
        assert!(serde_yaml::from_str::<ChartOptions>(
            "type: pie\npath: p\nfilename: f\nslicedata: ['ten']\n"
        )
        .is_err());
        assert!(serde_yaml::from_str::<ChartOptions>("type: radar\npath: p\nfilename: f\n").is_err());
    }

    #[test]
    fn validates_cartesian_options() {
        let mut opts = parse(LINE_CHART);
        opts.y_axis = SeriesData::Nested(vec![vec![]]);
        assert!(matches!(
            opts.validate(),
            Err(ConfigError::MissingSeries(ChartKind::Line))
        ));

        let mut opts = parse(LINE_CHART);
        opts.y_axis_colors.push("#zzz".into());
        assert!(matches!(
            opts.validate(),
            Err(ConfigError::Color {
                option: "yaxiscolor",
                ..
            })
        ));

        let mut opts = parse(LINE_CHART);
        opts.width = 5;
        assert!(matches!(
            opts.validate(),
            Err(ConfigError::Dimension {
                option: "imgwidth",
                value: 5
            })
        ));

        let mut opts = parse(LINE_CHART);
        opts.filename = "../escape".into();
        assert!(matches!(opts.validate(), Err(ConfigError::Filename(_))));
    }

    #[test]
    fn rejects_value_span_that_overflows() {
        let base = "path: p\nfilename: f\n";

        let line = parse(&format!("{base}type: line\nyaxis: [1e308, -1e308]\n"));
        assert!(matches!(line.validate(), Err(ConfigError::ValueSpan { .. })));

        let huge = parse(&format!("{base}type: line\nyaxis: [1.7e308, 1.6e308]\n"));
        assert!(huge.validate().is_ok());

        // bars are anchored at zero, so a single sign is enough
        let bar = parse(&format!("{base}type: bar\nyaxis: [1.7e308]\n"));
        assert!(bar.validate().is_ok());
        let bar = parse(&format!("{base}type: bar\nyaxis: [[1.7e308], [-1.7e308]]\n"));
        assert!(matches!(bar.validate(), Err(ConfigError::ValueSpan { .. })));

        let gaps = parse(&format!("{base}type: line\nyaxis: [null, null]\n"));
        assert!(gaps.validate().is_ok());
    }

    #[test]
    fn validates_pie_options() {
        let base = "path: p\nfilename: f\n";

        let pie = parse(&format!("{base}type: pie\nslicedata: [10, 50, 20, 20]\n"));
        assert!(pie.validate().is_ok());

        let empty = parse(&format!("{base}type: pie\n"));
        assert!(matches!(
            empty.validate(),
            Err(ConfigError::MissingSlices(ChartKind::Pie))
        ));

        let negative = parse(&format!("{base}type: pie\nslicedata: [1, -2]\n"));
        assert!(matches!(
            negative.validate(),
            Err(ConfigError::InvalidSlice {
                index: 1,
                reason: "negative"
            })
        ));

        let zero = parse(&format!("{base}type: donut\nslicedata: [0, 0]\n"));
        assert!(matches!(zero.validate(), Err(ConfigError::ZeroTotal)));

        let overflow = parse(&format!("{base}type: pie\nslicedata: [1e308, 1e308]\n"));
        assert!(matches!(overflow.validate(), Err(ConfigError::TotalOverflow)));

        let hole = parse(&format!("{base}type: donut\nslicedata: [1]\nsizehole: 1.0\n"));
        assert!(matches!(hole.validate(), Err(ConfigError::HoleSize(_))));

        let pie_hole = parse(&format!("{base}type: pie\nslicedata: [1]\nsizehole: 1.0\n"));
        assert!(pie_hole.validate().is_ok());
    }
}
