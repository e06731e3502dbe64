//! Export assembler
//!
//! A request naming exactly one metric and one region takes the
//! single-series path: one sheet with the product metadata on top, plus the
//! series' latest actual and first forecast years. Anything
//! else becomes a workbook with an info sheet, the flat "Data" sheet and,
//! when the result has any year, a "Time Series" pivot sheet.
//!
//! The binary format belongs to a [`WorkbookWriter`]; [`CsvBundleWriter`]
//! is bundled so the CLI can produce a file on its own.

mod csv_bundle;

pub use csv_bundle::CsvBundleWriter;

use crate::config::{EngineConfig, Lifecycle};
use crate::error::WriterError;
use crate::matrix::Matrix;
use crate::request::ResolvedRequest;
use crate::rows::CanonicalRow;
use chrono::NaiveDate;
use riq_catalog::DataType;
use serde::Serialize;

/// Release metadata printed with every export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductMetadata {
    /// Dataset name
    pub dataset: String,
    /// Release vintage
    pub vintage: String,
    /// Release status
    pub status: String,
    /// Producing system
    pub source: String,
    /// Citation line
    pub citation: String,
    /// Access timestamp
    pub accessed_at: String,
}

impl ProductMetadata {
    /// Metadata for a lifecycle at an access time
    #[must_use]
    pub fn new(dataset: impl Into<String>, lifecycle: &Lifecycle, accessed_at: impl Into<String>) -> Self {
        let accessed_at = accessed_at.into();
        Self {
            dataset: dataset.into(),
            vintage: lifecycle.vintage.clone(),
            status: lifecycle.status.clone(),
            source: lifecycle.source.clone(),
            citation: lifecycle.citation(&accessed_at),
            accessed_at,
        }
    }
}

/// Single-sheet layout for one metric in one region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleSeries {
    /// Release metadata
    pub metadata: ProductMetadata,
    /// Metric label
    pub metric: String,
    /// Region label
    pub region: String,
    /// Public region code
    pub region_code: String,
    /// Unit label
    pub units: String,
    /// Last year with published outturn
    pub latest_actual: Option<i32>,
    /// First projected year
    pub first_forecast: Option<i32>,
    /// Observations, one per (year, scenario)
    pub rows: Vec<CanonicalRow>,
}

/// Info sheet contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoSheet {
    /// Release metadata
    pub metadata: ProductMetadata,
    /// Requested metric ids
    pub metrics: Vec<String>,
    /// Requested region codes
    pub regions: Vec<String>,
    /// Scenario labels
    pub scenarios: Vec<String>,
    /// First and last year present
    pub years: Option<(i32, i32)>,
    /// Number of data rows
    pub row_count: usize,
}

/// Multi-sheet layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workbook {
    /// Info sheet
    pub info: InfoSheet,
    /// Flat "Data" sheet
    pub data: Vec<CanonicalRow>,
    /// "Time Series" sheet, absent when no year is present
    pub time_series: Option<Matrix>,
}

/// Layout handed to a writer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExportLayout {
    /// Fast path
    SingleSeries(SingleSeries),
    /// General path
    Workbook(Workbook),
}

/// Binary workbook writer
#[cfg_attr(test, mockall::automock)]
pub trait WorkbookWriter: Send + Sync {
    /// Render the single-series layout
    fn write_single_series(&self, series: &SingleSeries) -> Result<Vec<u8>, WriterError>;

    /// Render the multi-sheet layout
    fn write_workbook(&self, workbook: &Workbook) -> Result<Vec<u8>, WriterError>;

    /// File extension without dot
    fn file_extension(&self) -> &'static str;

    /// MIME type
    fn content_type(&self) -> &'static str;
}

/// Rendered export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// Download filename
    pub filename: String,
    /// MIME type
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
    /// Whether the single-series path was taken
    pub single_series: bool,
}

impl ExportFile {
    /// `content-disposition` header value
    #[must_use]
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Choose the layout for a result
#[must_use]
pub fn assemble(
    request: &ResolvedRequest,
    rows: Vec<CanonicalRow>,
    metadata: ProductMetadata,
) -> ExportLayout {
    if request.is_single_series() {
        let region_code = request.region_codes[0].clone();
        let (metric, region, units) = rows.first().map_or_else(
            || (request.metric_ids[0].clone(), region_code.clone(), String::new()),
            |r| (r.metric.clone(), r.region.clone(), r.units.clone()),
        );
        let latest_actual = years_of(&rows, DataType::Historical).max();
        let first_forecast = years_of(&rows, DataType::Forecast).min();
        let series = SingleSeries {
            metadata,
            metric,
            region,
            region_code,
            units,
            latest_actual,
            first_forecast,
            rows,
        };
        return ExportLayout::SingleSeries(series);
    }

    let matrix = Matrix::build(&rows);
    let years = matrix.years.first().zip(matrix.years.last()).map(|(a, b)| (*a, *b));
    let info = InfoSheet {
        metadata,
        metrics: request.metric_ids.clone(),
        regions: request.region_codes.clone(),
        scenarios: request.scenarios.iter().map(|s| s.label().to_string()).collect(),
        years,
        row_count: rows.len(),
    };
    ExportLayout::Workbook(Workbook {
        info,
        time_series: (!matrix.is_empty()).then_some(matrix),
        data: rows,
    })
}

fn years_of(rows: &[CanonicalRow], kind: DataType) -> impl Iterator<Item = i32> + '_ {
    rows.iter()
        .filter(move |r| DataType::parse(&r.data_type) == Some(kind))
        .map(|r| r.year)
}

/// Render a layout with a writer
///
/// # Errors
/// Propagates writer failures
pub fn render(
    writer: &dyn WorkbookWriter,
    layout: &ExportLayout,
    request: &ResolvedRequest,
    date: NaiveDate,
) -> Result<ExportFile, WriterError> {
    let (bytes, single_series) = match layout {
        ExportLayout::SingleSeries(series) => (writer.write_single_series(series)?, true),
        ExportLayout::Workbook(workbook) => (writer.write_workbook(workbook)?, false),
    };
    let stem = if single_series {
        format!("{}_{}", request.metric_ids[0], request.region_codes[0])
    } else {
        "export".to_string()
    };
    Ok(ExportFile {
        filename: export_filename(&stem, date, writer.file_extension()),
        content_type: writer.content_type().to_string(),
        bytes,
        single_series,
    })
}

/// Date-stamped download filename
#[must_use]
pub fn export_filename(stem: &str, date: NaiveDate, extension: &str) -> String {
    let stem: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("regioniq_{stem}_{}.{extension}", date.format("%Y-%m-%d"))
}

/// Product metadata for the current configuration
#[must_use]
pub fn product_metadata(config: &EngineConfig, accessed_at: &str) -> ProductMetadata {
    ProductMetadata::new(config.dataset.clone(), &config.lifecycle, accessed_at)
}
