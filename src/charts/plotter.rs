//! Chart Plotter Module
//! Draws a figure onto any plotters drawing area.
//!
//! Layout:
//! 1. Title: centered above everything
//! 2. Legend: right-hand strip, optional title then one row per trace/slice
//! 3. Plot: category axis chart (line/bar) or pie/donut

use crate::charts::figure::{Figure, FontSpec, LegendEntry, Plot, Series, Slice, Swatch};
use crate::charts::palette::GRID_COLOR;
use crate::charts::renderer::RenderError;
use crate::charts::spline::{catmull_rom, SPLINE_STEPS};
use crate::config::LineShape;
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};
use std::f64::consts::TAU;

const TITLE_SCALE: f64 = 1.4;
const CHART_MARGIN: u32 = 20;
const LINE_WIDTH: u32 = 2;
const MARKER_RADIUS: u32 = 4;
/// Traces with fewer points than this also get point markers
const MARKER_THRESHOLD: usize = 20;
/// Share of a category taken by a group of bars
const BAR_GROUP_WIDTH: f64 = 0.8;
const RANGE_PADDING: f64 = 0.05;
const MAX_CATEGORY_LABELS: usize = 40;
const Y_LABELS: usize = 10;
/// Tick values outside this magnitude band use scientific notation
const SCIENTIFIC_ABOVE: f64 = 1e9;
const SCIENTIFIC_BELOW: f64 = 1e-3;
const PIE_RADIUS_RATIO: f64 = 0.85;
/// Degrees; -90 starts the first slice at 12 o'clock
const PIE_START_ANGLE: f64 = -90.0;
/// Slices below this share get no percentage label
const MIN_LABELED_SHARE: f64 = 0.02;
const GLYPH_WIDTH: f64 = 0.6;
const SWATCH_WIDTH: i32 = 30;
const LEGEND_PADDING: i32 = 12;
/// Upper bound of the legend strip, in percent of the available width
const MAX_LEGEND_SHARE: u32 = 35;

#[derive(Debug, Clone, Copy)]
enum CartesianStyle {
    Lines(LineShape),
    Bars,
}

fn drawing_error<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError::Drawing(err.to_string())
}

fn font_family(name: &str) -> FontFamily<'_> {
    match name.to_ascii_lowercase().as_str() {
        "monospace" | "mono" => FontFamily::Monospace,
        "serif" => FontFamily::Serif,
        "sans-serif" | "sans" => FontFamily::SansSerif,
        _ => FontFamily::Name(name),
    }
}

fn text_style(font: &FontSpec, scale: f64) -> TextStyle<'_> {
    FontDesc::new(
        font_family(&font.family),
        font.size as f64 * scale,
        FontStyle::Normal,
    )
    .color(&font.color)
}

/// Draw the complete figure and present the backend.
pub fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
) -> Result<(), RenderError> {
    let layout = &figure.layout;
    let font = &layout.font;

    root.fill(&WHITE).map_err(drawing_error)?;

    let area = match &layout.title {
        Some(title) => root
            .titled(title, text_style(font, TITLE_SCALE))
            .map_err(drawing_error)?,
        None => root.clone(),
    };

    let plot_area = match figure.legend() {
        Some(entries) => {
            let (width, _) = area.dim_in_pixel();
            let title = layout.legend_title.as_deref();
            let legend_width = legend_width(&entries, title, font, width);
            let (plot, legend) = area.split_horizontally((width - legend_width) as i32);
            draw_legend(&legend, &entries, title, font)?;
            plot
        }
        None => area,
    };

    match &figure.plot {
        Plot::Line {
            categories,
            series,
            shape,
        } => draw_cartesian(
            &plot_area,
            figure,
            categories,
            series,
            CartesianStyle::Lines(*shape),
        )?,
        Plot::Bar { categories, series } => {
            draw_cartesian(&plot_area, figure, categories, series, CartesianStyle::Bars)?
        }
        Plot::Pie { slices, hole } => draw_pie(&plot_area, font, slices, *hole)?,
    }

    root.present().map_err(drawing_error)
}

fn draw_cartesian<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    figure: &Figure,
    categories: &[String],
    series: &[Series],
    style: CartesianStyle,
) -> Result<(), RenderError> {
    let layout = &figure.layout;
    let font = &layout.font;
    let count = categories.len().max(1);
    let (y_min, y_max) = value_range(series, matches!(style, CartesianStyle::Bars));

    let font_px = font.size as f64;
    let x_area = font_px * if layout.x_title.is_some() { 3.4 } else { 2.0 };
    let tick_chars = format_value(y_min).len().max(format_value(y_max).len()) + 1;
    let y_area = tick_chars as f64 * font_px * GLYPH_WIDTH
        + if layout.y_title.is_some() { font_px * 2.0 } else { 0.0 }
        + 10.0;

    let mut chart = ChartBuilder::on(area)
        .margin(CHART_MARGIN)
        .x_label_area_size(x_area.ceil() as u32)
        .y_label_area_size(y_area.ceil() as u32)
        .build_cartesian_2d(-0.5..(count as f64 - 0.5), y_min..y_max)
        .map_err(drawing_error)?;

    let category_label = |v: &f64| category_at(categories, *v);
    let value_label = |v: &f64| format_value(*v);
    let labels = text_style(font, 1.0);

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .bold_line_style(&GRID_COLOR)
        .light_line_style(&TRANSPARENT)
        .x_labels(count.min(MAX_CATEGORY_LABELS))
        .y_labels(Y_LABELS)
        .x_label_formatter(&category_label)
        .y_label_formatter(&value_label)
        .label_style(labels.clone())
        .axis_desc_style(labels);
    if let Some(title) = &layout.x_title {
        mesh.x_desc(title.as_str());
    }
    if let Some(title) = &layout.y_title {
        mesh.y_desc(title.as_str());
    }
    mesh.draw().map_err(drawing_error)?;

    match style {
        CartesianStyle::Lines(shape) => {
            for trace in series {
                let color = trace.color;
                let line_style = ShapeStyle {
                    color: color.to_rgba(),
                    filled: false,
                    stroke_width: LINE_WIDTH,
                };
                let markers = trace.point_count() < MARKER_THRESHOLD;

                for segment in trace.segments() {
                    let path = match shape {
                        LineShape::Spline => catmull_rom(&segment, SPLINE_STEPS),
                        LineShape::Linear => segment.clone(),
                    };
                    chart
                        .draw_series(LineSeries::new(path, line_style))
                        .map_err(drawing_error)?;
                    if markers {
                        chart
                            .draw_series(
                                segment
                                    .iter()
                                    .map(|&point| Circle::new(point, MARKER_RADIUS, color.filled())),
                            )
                            .map_err(drawing_error)?;
                    }
                }
            }
        }
        CartesianStyle::Bars => {
            let bar_width = BAR_GROUP_WIDTH / series.len().max(1) as f64;
            for (index, trace) in series.iter().enumerate() {
                let fill = trace.color.filled();
                let offset = -BAR_GROUP_WIDTH / 2.0 + index as f64 * bar_width;
                chart
                    .draw_series(trace.values.iter().enumerate().filter_map(|(i, value)| {
                        value.map(|v| {
                            let left = i as f64 + offset;
                            Rectangle::new([(left, v.max(0.0)), (left + bar_width, v.min(0.0))], fill)
                        })
                    }))
                    .map_err(drawing_error)?;
            }
        }
    }

    Ok(())
}

fn draw_pie<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    font: &FontSpec,
    slices: &[Slice],
    hole: f64,
) -> Result<(), RenderError> {
    let (center, radius) = pie_geometry(area.dim_in_pixel());

    let sizes: Vec<f64> = slices.iter().map(|s| s.value).collect();
    let colors: Vec<RGBColor> = slices.iter().map(|s| s.color).collect();
    // Slice names go to the legend; the pie itself only carries percentages
    let labels: Vec<String> = vec![String::new(); slices.len()];

    // Pie ignores the area offset and draws in backend coordinates
    let (x_range, y_range) = area.get_pixel_range();
    let backend_center = (x_range.start + center.0, y_range.start + center.1);

    let mut pie = Pie::new(&backend_center, &radius, &sizes, &colors, &labels);
    pie.start_angle(PIE_START_ANGLE);
    pie.label_style(text_style(font, 1.0));
    area.draw(&pie).map_err(drawing_error)?;

    if hole > 0.0 {
        area.draw(&Circle::new(center, hole_radius(radius, hole), WHITE.filled()))
            .map_err(drawing_error)?;
    }

    let total: f64 = sizes.iter().sum();
    let text_radius = if hole > 0.0 {
        radius * (1.0 + hole) / 2.0
    } else {
        radius * 0.65
    };
    let percent_style = text_style(font, 1.0).pos(Pos::new(HPos::Center, VPos::Center));

    let mut start = PIE_START_ANGLE.to_radians();
    for slice in slices {
        let share = slice.value / total;
        let sweep = share * TAU;
        if share >= MIN_LABELED_SHARE {
            let mid = start + sweep / 2.0;
            let pos = (
                center.0 + (text_radius * mid.cos()).round() as i32,
                center.1 + (text_radius * mid.sin()).round() as i32,
            );
            area.draw(&Text::new(
                format!("{:.1}%", share * 100.0),
                pos,
                percent_style.clone(),
            ))
            .map_err(drawing_error)?;
        }
        start += sweep;
    }

    Ok(())
}

/// Center and radius of a pie filling an area of the given size.
fn pie_geometry((width, height): (u32, u32)) -> ((i32, i32), f64) {
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = width.min(height) as f64 / 2.0 * PIE_RADIUS_RATIO;
    (center, radius)
}

fn hole_radius(radius: f64, hole: f64) -> u32 {
    (radius * hole).round() as u32
}

fn legend_width(entries: &[LegendEntry], title: Option<&str>, font: &FontSpec, available: u32) -> u32 {
    let longest = entries
        .iter()
        .map(|e| e.name.chars().count())
        .chain(title.map(|t| t.chars().count()))
        .max()
        .unwrap_or(0);
    let text = longest as f64 * font.size as f64 * GLYPH_WIDTH;
    let width = (SWATCH_WIDTH + 3 * LEGEND_PADDING) as f64 + text;
    (width.ceil() as u32).min(available * MAX_LEGEND_SHARE / 100)
}

fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    entries: &[LegendEntry],
    title: Option<&str>,
    font: &FontSpec,
) -> Result<(), RenderError> {
    let row = (font.size as f64 * 1.6).ceil() as i32;
    let left_aligned = text_style(font, 1.0).pos(Pos::new(HPos::Left, VPos::Center));
    let x = LEGEND_PADDING;
    let mut y = CHART_MARGIN as i32 + row / 2;

    if let Some(title) = title {
        area.draw(&Text::new(title.to_string(), (x, y), left_aligned.clone()))
            .map_err(drawing_error)?;
        y += row;
    }

    for entry in entries {
        let swatch = match entry.swatch {
            Swatch::Line => area.draw(&PathElement::new(
                vec![(x, y), (x + SWATCH_WIDTH, y)],
                ShapeStyle {
                    color: entry.color.to_rgba(),
                    filled: false,
                    stroke_width: LINE_WIDTH + 1,
                },
            )),
            Swatch::Block => {
                let half = (font.size as i32 / 2).max(3);
                let mid = x + SWATCH_WIDTH / 2;
                area.draw(&Rectangle::new(
                    [(mid - half, y - half), (mid + half, y + half)],
                    entry.color.filled(),
                ))
            }
        };
        swatch.map_err(drawing_error)?;

        area.draw(&Text::new(
            entry.name.clone(),
            (x + SWATCH_WIDTH + LEGEND_PADDING, y),
            left_aligned.clone(),
        ))
        .map_err(drawing_error)?;
        y += row;
    }

    Ok(())
}

/// Y range over every present value, padded; bars always include zero.
fn value_range(series: &[Series], include_zero: bool) -> (f64, f64) {
    let (mut lo, mut hi) = series
        .iter()
        .flat_map(|s| s.values.iter().flatten().copied())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if !(hi - lo).is_finite() {
        // Key point search never terminates on an infinite span
        lo = lo.max(f64::MIN / 2.0);
        hi = hi.min(f64::MAX / 2.0);
    }
    if hi - lo < f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }

    let pad = (hi - lo) * RANGE_PADDING;
    let padded_lo = if include_zero && lo == 0.0 { 0.0 } else { lo - pad };
    let padded_hi = if include_zero && hi == 0.0 { 0.0 } else { hi + pad };
    if padded_lo.is_finite() && padded_hi.is_finite() {
        (padded_lo, padded_hi)
    } else {
        (lo, hi)
    }
}

/// Category name for an axis position; only integer positions are labeled.
fn category_at(categories: &[String], position: f64) -> String {
    let index = position.round();
    if (position - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    categories.get(index as usize).cloned().unwrap_or_default()
}

fn format_value(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    let magnitude = value.abs();
    if magnitude >= SCIENTIFIC_ABOVE || (magnitude > 0.0 && magnitude < SCIENTIFIC_BELOW) {
        format!("{:e}", value)
    } else if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        let text = format!("{:.3}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
