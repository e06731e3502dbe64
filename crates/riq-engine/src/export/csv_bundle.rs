//! CSV rendering of export layouts
//!
//! Each sheet becomes a titled section (`[Data]`, `[Time Series]`, ...) in a
//! single CSV file. Records are flexible-width so sections can differ.

use super::{ExportLayout, ProductMetadata, SingleSeries, WorkbookWriter, Workbook};
use crate::error::WriterError;
use crate::matrix::Matrix;
use crate::rows::CanonicalRow;
use csv::{Writer, WriterBuilder};

/// Writes every sheet as a titled CSV section
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvBundleWriter;

impl CsvBundleWriter {
    /// Create writer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Render any layout
    ///
    /// # Errors
    /// Propagates CSV encoding failures
    pub fn write_layout(&self, layout: &ExportLayout) -> Result<Vec<u8>, WriterError> {
        match layout {
            ExportLayout::SingleSeries(series) => self.write_single_series(series),
            ExportLayout::Workbook(workbook) => self.write_workbook(workbook),
        }
    }
}

impl WorkbookWriter for CsvBundleWriter {
    fn write_single_series(&self, series: &SingleSeries) -> Result<Vec<u8>, WriterError> {
        let mut wtr = writer();
        wtr.write_record([format!("{} - {}", series.metric, series.region)])?;
        wtr.write_record(["Region Code", series.region_code.as_str()])?;
        wtr.write_record(["Units", series.units.as_str()])?;
        write_metadata(&mut wtr, &series.metadata)?;
        if let Some(year) = series.latest_actual {
            wtr.write_record(["Latest Actual".to_string(), year.to_string()])?;
        }
        if let Some(year) = series.first_forecast {
            wtr.write_record(["First Forecast".to_string(), year.to_string()])?;
        }

        wtr.write_record(["[Data]"])?;
        wtr.write_record(["Year", "Scenario", "Value", "Data Type", "Source"])?;
        for row in &series.rows {
            wtr.write_record([
                row.year.to_string(),
                row.scenario.clone(),
                format_value(row.value),
                row.data_type.clone(),
                row.source.clone(),
            ])?;
        }
        finish(wtr)
    }

    fn write_workbook(&self, workbook: &Workbook) -> Result<Vec<u8>, WriterError> {
        let mut wtr = writer();
        let info = &workbook.info;

        wtr.write_record(["[Info]"])?;
        write_metadata(&mut wtr, &info.metadata)?;
        wtr.write_record(["Metrics", info.metrics.join(", ").as_str()])?;
        wtr.write_record(["Regions", info.regions.join(", ").as_str()])?;
        wtr.write_record(["Scenarios", info.scenarios.join(", ").as_str()])?;
        if let Some((first, last)) = info.years {
            wtr.write_record(["Years".to_string(), format!("{first}-{last}")])?;
        }
        wtr.write_record(["Rows".to_string(), info.row_count.to_string()])?;

        wtr.write_record(["[Data]"])?;
        wtr.write_record(CanonicalRow::COLUMNS)?;
        for row in &workbook.data {
            write_canonical(&mut wtr, row)?;
        }

        if let Some(matrix) = &workbook.time_series {
            wtr.write_record(["[Time Series]"])?;
            write_matrix(&mut wtr, matrix)?;
        }
        finish(wtr)
    }

    fn file_extension(&self) -> &'static str {
        "csv"
    }

    fn content_type(&self) -> &'static str {
        "text/csv"
    }
}

fn writer() -> Writer<Vec<u8>> {
    WriterBuilder::new().flexible(true).from_writer(Vec::new())
}

fn finish(wtr: Writer<Vec<u8>>) -> Result<Vec<u8>, WriterError> {
    wtr.into_inner()
        .map_err(|e| WriterError::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))
}

fn write_metadata(wtr: &mut Writer<Vec<u8>>, metadata: &ProductMetadata) -> Result<(), WriterError> {
    for (key, value) in [
        ("Dataset", &metadata.dataset),
        ("Vintage", &metadata.vintage),
        ("Status", &metadata.status),
        ("Source", &metadata.source),
        ("Accessed", &metadata.accessed_at),
        ("Citation", &metadata.citation),
    ] {
        wtr.write_record([key, value.as_str()])?;
    }
    Ok(())
}

fn write_canonical(wtr: &mut Writer<Vec<u8>>, row: &CanonicalRow) -> Result<(), WriterError> {
    wtr.write_record([
        row.metric.clone(),
        row.region.clone(),
        row.region_code.clone(),
        row.year.to_string(),
        row.scenario.clone(),
        format_value(row.value),
        row.units.clone(),
        row.data_type.clone(),
        row.source.clone(),
    ])?;
    Ok(())
}

fn write_matrix(wtr: &mut Writer<Vec<u8>>, matrix: &Matrix) -> Result<(), WriterError> {
    wtr.write_record(&matrix.header)?;
    for row in &matrix.rows {
        let mut record = vec![
            row.metric.clone(),
            row.region.clone(),
            row.scenario.clone(),
            row.units.clone(),
        ];
        record.extend(row.values.iter().map(|v| format_value(*v)));
        wtr.write_record(&record)?;
    }
    Ok(())
}

fn format_value(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{v:.0}"),
        Some(v) => v.to_string(),
    }
}
