//! PDF report export
//!
//! A report is built in fixed steps on an A4 page: header and metadata, the
//! summary grid, the two chart captures, then the raw data table (which
//! continues onto further pages as needed). Coordinates below are measured
//! from the top-left corner in millimetres and flipped when drawn, since PDF
//! space starts bottom-left.
//!
//! A failed chart capture is logged and left out; anything else aborts the
//! export with a `ReportError`.

use crate::model::dashboard::{stat_cards, type_bars, StatCard, TrendSeries};
use crate::model::dataset::{format_reading, DatasetDetail, EquipmentRow};
use crate::services::chart_render::{self, CaptureError, Pixmap};
use chrono::Local;
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject,
    IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Px,
    Rect, Rgb,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const REPORT_TITLE: &str = "Chem.Vis Analytics Report";
pub const EXPORT_FAILED: &str = "Failed to generate PDF.";

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 14.0;
const BOTTOM_LIMIT: f32 = PAGE_HEIGHT - MARGIN;
const ROW_HEIGHT: f32 = 6.0;
const IMAGE_DPI: f32 = 300.0;
/// Capture resolution per millimetre of placed chart
const CAPTURE_PX_PER_MM: f32 = 8.0;

const TABLE_HEADERS: [&str; 6] = ["ID", "Equipment", "Type", "Flow", "Pressure", "Temp"];
const COLUMN_WIDTHS: [f32; 6] = [14.0, 50.0, 36.0, 27.0, 27.0, 28.0];

type Rgb8 = (u8, u8, u8);
const INK: Rgb8 = (15, 23, 42);
const MUTED: Rgb8 = (100, 116, 139);
const HEADING: Rgb8 = (51, 65, 85);
const ACCENT: Rgb8 = (6, 182, 212);
const CARD_FILL: Rgb8 = (241, 245, 249);
const CARD_STROKE: Rgb8 = (203, 213, 225);
const WHITE: Rgb8 = (255, 255, 255);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("could not load font: {0}")]
    Font(String),
    #[error("could not create {path}: {reason}")]
    OutputDir { path: String, reason: String },
    #[error("could not encode PDF: {0}")]
    Encode(String),
    #[error("could not write {path}: {reason}")]
    Write { path: String, reason: String },
}

/// Everything needed to produce one report, detached from UI state
#[derive(Debug, Clone)]
pub struct ReportJob {
    pub detail: DatasetDetail,
    /// Display number of the dataset, or "-" when it is not in the history
    pub dataset_label: String,
    pub output_dir: PathBuf,
    pub table_rows: usize,
    pub trend_rows: usize,
}

#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub path: PathBuf,
    pub pages: usize,
    pub skipped_captures: Vec<CaptureError>,
}

pub fn report_file_name(dataset_label: &str) -> String {
    format!("Report_Dataset_{}.pdf", dataset_label)
}

/// Build and save the report for `job`
pub fn generate(job: &ReportJob) -> Result<ReportOutcome, ReportError> {
    let generated = Local::now().format("%Y-%m-%d").to_string();

    let mut writer = ReportWriter::new()?;
    writer.header(&job.dataset_label, &job.detail.imported_date(), &generated);
    writer.stat_grid(&stat_cards(&job.detail.summary));
    let skipped_captures = writer.charts(&job.detail, job.trend_rows);
    writer.table(&job.detail.data, job.table_rows);

    let pages = writer.pages;
    let path = job.output_dir.join(report_file_name(&job.dataset_label));
    writer.save(&path)?;

    tracing::info!(
        "report written to {} ({} capture(s) skipped)",
        path.display(),
        skipped_captures.len()
    );
    Ok(ReportOutcome {
        path,
        pages,
        skipped_captures,
    })
}

fn rgb(c: Rgb8) -> Color {
    Color::Rgb(Rgb::new(
        c.0 as f32 / 255.0,
        c.1 as f32 / 255.0,
        c.2 as f32 / 255.0,
        None,
    ))
}

/// Rough Helvetica advance: half an em per character
fn text_width_mm(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5 * 0.3528
}

/// Cut `text` so it fits into `width` millimetres at `size`
fn fit_text(text: &str, width: f32, size: f32) -> String {
    if text_width_mm(text, size) <= width {
        return text.to_string();
    }
    let max_chars = (width / (size * 0.5 * 0.3528)) as usize;
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

struct ReportWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Next free position on the current page, from the top
    cursor: f32,
    pages: usize,
}

impl ReportWriter {
    fn new() -> Result<Self, ReportError> {
        let (doc, page, layer) =
            PdfDocument::new(REPORT_TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Report");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::Font(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportError::Font(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            cursor: MARGIN,
            pages: 1,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Report");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = MARGIN + 6.0;
        self.pages += 1;
    }

    fn text(&self, text: &str, size: f32, x: f32, top: f32, color: Rgb8, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.set_fill_color(rgb(color));
        self.layer
            .use_text(text, size, Mm(x), Mm(PAGE_HEIGHT - top), font);
    }

    fn centered_text(&self, text: &str, size: f32, center_x: f32, top: f32, color: Rgb8, bold: bool) {
        let x = center_x - text_width_mm(text, size) / 2.0;
        self.text(text, size, x, top, color, bold);
    }

    fn rect(&self, x: f32, top: f32, w: f32, h: f32, fill: Rgb8, stroke: Option<Rgb8>) {
        self.layer.set_fill_color(rgb(fill));
        let mode = match stroke {
            Some(color) => {
                self.layer.set_outline_color(rgb(color));
                self.layer.set_outline_thickness(0.5);
                PaintMode::FillStroke
            }
            None => PaintMode::Fill,
        };
        let bottom = PAGE_HEIGHT - top - h;
        self.layer.add_rect(
            Rect::new(Mm(x), Mm(bottom), Mm(x + w), Mm(PAGE_HEIGHT - top)).with_mode(mode),
        );
    }

    fn rule(&self, x0: f32, x1: f32, top: f32, color: Rgb8, thickness_pt: f32) {
        self.layer.set_outline_color(rgb(color));
        self.layer.set_outline_thickness(thickness_pt);
        let y = Mm(PAGE_HEIGHT - top);
        self.layer.add_line(Line {
            points: vec![(Point::new(Mm(x0), y), false), (Point::new(Mm(x1), y), false)],
            is_closed: false,
        });
    }

    fn header(&mut self, dataset_label: &str, imported: &str, generated: &str) {
        self.text(REPORT_TITLE, 22.0, MARGIN, 20.0, INK, false);
        self.rule(MARGIN, PAGE_WIDTH - MARGIN, 25.0, ACCENT, 2.8);

        self.text(&format!("Dataset ID: {}", dataset_label), 10.0, MARGIN, 32.0, MUTED, false);
        self.text(&format!("Imported: {}", imported), 10.0, MARGIN, 37.0, MUTED, false);
        self.text(&format!("Generated: {}", generated), 10.0, MARGIN, 42.0, MUTED, false);
        self.cursor = 55.0;
    }

    fn stat_grid(&mut self, cards: &[StatCard]) {
        self.text("Summary Statistics", 14.0, MARGIN, self.cursor, HEADING, false);
        let top = self.cursor + 10.0;

        for (i, card) in cards.iter().enumerate() {
            let x = MARGIN + i as f32 * 45.0;
            self.rect(x, top, 40.0, 20.0, CARD_FILL, Some(CARD_STROKE));
            self.centered_text(card.label, 8.0, x + 20.0, top + 6.0, MUTED, false);
            self.centered_text(&card.value, 12.0, x + 20.0, top + 15.0, INK, true);
        }
        self.cursor = top + 30.0;
    }

    /// Place both chart captures; returns the captures that failed
    fn charts(&mut self, detail: &DatasetDetail, trend_rows: usize) -> Vec<CaptureError> {
        self.text("Visualizations", 14.0, MARGIN, self.cursor, HEADING, false);
        let top = self.cursor + 10.0;
        let mut skipped = Vec::new();

        let bars = type_bars(&detail.summary);
        let (w, h) = (85.0, 60.0);
        match chart_render::render_distribution(&bars, px(w), px(h)) {
            Ok(pixmap) => {
                self.image(pixmap, MARGIN, top, w, h);
                let legend: Vec<String> = bars
                    .iter()
                    .map(|(name, count)| format!("{} ({})", name, count))
                    .collect();
                self.caption(chart_render::DISTRIBUTION_CHART, &legend.join(", "), MARGIN, top + h, w);
            }
            Err(e) => {
                tracing::warn!("{}", e);
                skipped.push(e);
            }
        }

        let series = TrendSeries::from_rows(&detail.data, trend_rows);
        let (w, h) = (90.0, 60.0);
        match chart_render::render_trend(&series, px(w), px(h)) {
            Ok(pixmap) => {
                self.image(pixmap, 105.0, top, w, h);
                self.caption(
                    chart_render::TREND_CHART,
                    &format!("Flowrate (cyan), Pressure (violet), first {} rows", series.labels.len()),
                    105.0,
                    top + h,
                    w,
                );
            }
            Err(e) => {
                tracing::warn!("{}", e);
                skipped.push(e);
            }
        }

        self.cursor = top + 70.0;
        skipped
    }

    fn caption(&self, title: &str, detail: &str, x: f32, top: f32, width: f32) {
        self.text(title, 8.0, x, top + 4.0, HEADING, true);
        self.text(&fit_text(detail, width, 7.0), 7.0, x, top + 7.5, MUTED, false);
    }

    fn image(&self, pixmap: Pixmap, x: f32, top: f32, w: f32, h: f32) {
        let natural_w = pixmap.width as f32 * 25.4 / IMAGE_DPI;
        let natural_h = pixmap.height as f32 * 25.4 / IMAGE_DPI;
        let xobject = ImageXObject {
            width: Px(pixmap.width as usize),
            height: Px(pixmap.height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: pixmap.rgb,
            image_filter: None,
            smask: None,
            clipping_bbox: None,
        };
        Image::from(xobject).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x)),
                translate_y: Some(Mm(PAGE_HEIGHT - top - h)),
                scale_x: Some(w / natural_w),
                scale_y: Some(h / natural_h),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
    }

    fn table(&mut self, rows: &[EquipmentRow], limit: usize) {
        self.text("Raw Data Preview", 14.0, MARGIN, self.cursor, HEADING, false);
        self.cursor += 5.0;
        self.table_header();

        for (i, row) in rows.iter().take(limit).enumerate() {
            if self.cursor + ROW_HEIGHT > BOTTOM_LIMIT {
                self.new_page();
                self.table_header();
            }
            let cells = [
                (i + 1).to_string(),
                row.equipment_name.clone(),
                row.equipment_type.clone(),
                format_reading(row.flowrate),
                format_reading(row.pressure),
                format_reading(row.temperature),
            ];
            self.table_row(&cells, false);
        }
    }

    fn table_header(&mut self) {
        let cells = TABLE_HEADERS.map(str::to_string);
        self.table_row(&cells, true);
    }

    fn table_row(&mut self, cells: &[String], header: bool) {
        let mut x = MARGIN;
        for (cell, width) in cells.iter().zip(COLUMN_WIDTHS) {
            let (fill, color) = if header { (INK, WHITE) } else { (WHITE, INK) };
            self.rect(x, self.cursor, width, ROW_HEIGHT, fill, Some(CARD_STROKE));
            self.text(
                &fit_text(cell, width - 3.0, 8.0),
                8.0,
                x + 1.5,
                self.cursor + 4.2,
                color,
                header,
            );
            x += width;
        }
        self.cursor += ROW_HEIGHT;
    }

    fn save(self, path: &Path) -> Result<(), ReportError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|e| ReportError::OutputDir {
                    path: dir.display().to_string(),
                    reason: e.to_string(),
                })?;
            }
        }
        let bytes = self
            .doc
            .save_to_bytes()
            .map_err(|e| ReportError::Encode(e.to_string()))?;
        fs::write(path, bytes).map_err(|e| ReportError::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

fn px(mm: f32) -> u32 {
    (mm * CAPTURE_PX_PER_MM) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fake_api::detail;

    fn job(dir: &Path, rows: usize) -> ReportJob {
        ReportJob {
            detail: detail(rows),
            dataset_label: "3".to_string(),
            output_dir: dir.to_path_buf(),
            table_rows: 50,
            trend_rows: 30,
        }
    }

    #[test]
    fn test_report_written_under_display_number() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = generate(&job(dir.path(), 8)).unwrap();

        assert_eq!(outcome.path, dir.path().join("Report_Dataset_3.pdf"));
        assert!(outcome.skipped_captures.is_empty());
        assert_eq!(outcome.pages, 1);
        let bytes = fs::read(&outcome.path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_missing_charts_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = job(dir.path(), 0);
        job.detail.summary.type_distribution.clear();

        let outcome = generate(&job).unwrap();
        assert_eq!(outcome.skipped_captures.len(), 2);
        assert!(outcome.path.exists());
    }

    #[test]
    fn test_long_table_spills_onto_more_pages() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = job(dir.path(), 80);
        job.dataset_label = "-".to_string();

        let outcome = generate(&job).unwrap();
        assert_eq!(outcome.path.file_name().unwrap(), "Report_Dataset_-.pdf");
        assert_eq!(outcome.pages, 2);
    }

    #[test]
    fn test_unwritable_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let err = generate(&job(&blocker.join("reports"), 2)).unwrap_err();
        assert!(matches!(err, ReportError::OutputDir { .. }));
    }

    #[test]
    fn test_fit_text() {
        assert_eq!(fit_text("Pump", 20.0, 8.0), "Pump");
        let cut = fit_text(&"x".repeat(100), 20.0, 8.0);
        assert!(cut.ends_with("..."));
        assert!(cut.len() < 100);
    }
}
