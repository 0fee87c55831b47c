//! Off-screen rendering of the dashboard charts
//!
//! The report embeds raster copies of the type-distribution bars and the
//! flowrate/pressure trend. Plots are drawn into an RGB buffer with plotters;
//! axis captions are written by the report itself, so nothing here draws text.

use crate::model::dashboard::TrendSeries;
use plotters::prelude::*;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{chart} capture failed: {reason}")]
pub struct CaptureError {
    pub chart: &'static str,
    pub reason: String,
}

impl CaptureError {
    fn new(chart: &'static str, reason: impl ToString) -> Self {
        Self {
            chart,
            reason: reason.to_string(),
        }
    }
}

/// Packed 8-bit RGB pixels, row-major
#[derive(Debug, Clone)]
pub struct Pixmap {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

const BACKGROUND: RGBColor = RGBColor(30, 41, 59);
const GRID: RGBColor = RGBColor(71, 85, 105);
const FLOW_COLOR: RGBColor = RGBColor(6, 182, 212);
const PRESSURE_COLOR: RGBColor = RGBColor(139, 92, 246);
const BAR_COLORS: [RGBColor; 5] = [
    RGBColor(59, 130, 246),
    RGBColor(6, 182, 212),
    RGBColor(139, 92, 246),
    RGBColor(16, 185, 129),
    RGBColor(245, 158, 11),
];

pub const DISTRIBUTION_CHART: &str = "Equipment type distribution";
pub const TREND_CHART: &str = "Flowrate & pressure trend";

/// Color used for the n-th bar, shared with the report legend
pub fn bar_color(index: usize) -> (u8, u8, u8) {
    let c = BAR_COLORS[index % BAR_COLORS.len()];
    (c.0, c.1, c.2)
}

pub fn flow_color() -> (u8, u8, u8) {
    (FLOW_COLOR.0, FLOW_COLOR.1, FLOW_COLOR.2)
}

pub fn pressure_color() -> (u8, u8, u8) {
    (PRESSURE_COLOR.0, PRESSURE_COLOR.1, PRESSURE_COLOR.2)
}

fn blank(width: u32, height: u32, chart: &'static str) -> Result<Vec<u8>, CaptureError> {
    if width == 0 || height == 0 {
        return Err(CaptureError::new(chart, "empty canvas"));
    }
    Ok(vec![0; width as usize * height as usize * 3])
}

/// Vertical bars, one per equipment type
pub fn render_distribution(
    bars: &[(String, u64)],
    width: u32,
    height: u32,
) -> Result<Pixmap, CaptureError> {
    let chart_name = DISTRIBUTION_CHART;
    if bars.is_empty() {
        return Err(CaptureError::new(chart_name, "no equipment types"));
    }
    let mut buffer = blank(width, height, chart_name)?;
    let max = bars.iter().map(|(_, count)| *count).max().unwrap_or(0).max(1) as f64;

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&BACKGROUND)
            .map_err(|e| CaptureError::new(chart_name, e))?;

        let mut chart = ChartBuilder::on(&root)
            .margin(16)
            .build_cartesian_2d(0f64..bars.len() as f64, 0f64..max * 1.1)
            .map_err(|e| CaptureError::new(chart_name, e))?;

        for step in 1..=4 {
            let y = max * 1.1 * step as f64 / 4.0;
            chart
                .draw_series(LineSeries::new(
                    [(0.0, y), (bars.len() as f64, y)],
                    GRID.stroke_width(1),
                ))
                .map_err(|e| CaptureError::new(chart_name, e))?;
        }

        chart
            .draw_series(bars.iter().enumerate().map(|(i, (_, count))| {
                let x = i as f64;
                Rectangle::new(
                    [(x + 0.15, 0.0), (x + 0.85, *count as f64)],
                    BAR_COLORS[i % BAR_COLORS.len()].filled(),
                )
            }))
            .map_err(|e| CaptureError::new(chart_name, e))?;

        root.present()
            .map_err(|e| CaptureError::new(chart_name, e))?;
    }

    Ok(Pixmap {
        width,
        height,
        rgb: buffer,
    })
}

/// Flowrate and pressure lines over the sampled rows
pub fn render_trend(series: &TrendSeries, width: u32, height: u32) -> Result<Pixmap, CaptureError> {
    let chart_name = TREND_CHART;
    if series.is_empty() {
        return Err(CaptureError::new(chart_name, "no readings"));
    }
    let mut buffer = blank(width, height, chart_name)?;
    let [x0, x1] = series.x_bounds();
    let [y0, y1] = series.y_bounds();

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&BACKGROUND)
            .map_err(|e| CaptureError::new(chart_name, e))?;

        let mut chart = ChartBuilder::on(&root)
            .margin(16)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(|e| CaptureError::new(chart_name, e))?;

        for step in 1..=4 {
            let y = y0 + (y1 - y0) * step as f64 / 4.0;
            chart
                .draw_series(LineSeries::new([(x0, y), (x1, y)], GRID.stroke_width(1)))
                .map_err(|e| CaptureError::new(chart_name, e))?;
        }

        chart
            .draw_series(LineSeries::new(
                series.flowrate.iter().copied(),
                FLOW_COLOR.stroke_width(3),
            ))
            .map_err(|e| CaptureError::new(chart_name, e))?;
        chart
            .draw_series(LineSeries::new(
                series.pressure.iter().copied(),
                PRESSURE_COLOR.stroke_width(3),
            ))
            .map_err(|e| CaptureError::new(chart_name, e))?;

        root.present()
            .map_err(|e| CaptureError::new(chart_name, e))?;
    }

    Ok(Pixmap {
        width,
        height,
        rgb: buffer,
    })
}
