//! Schema formatter and exports
//!
//! Records are laid out in five canonical columns, in this order:
//! `No`, `Date`, `Event Particulars`, `Citation`, `Document Reference`.
//! Timing and cost columns may be appended after them on request.

use crate::error::PipelineError;
use docket_domain::EventRecord;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Canonical column headers, in order
pub const CANONICAL_COLUMNS: [&str; 5] = [
    "No",
    "Date",
    "Event Particulars",
    "Citation",
    "Document Reference",
];

/// Name of the worksheet written to spreadsheets
pub const WORKSHEET_NAME: &str = "Events";

/// Optional columns appended after the canonical ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraColumn {
    /// Seconds spent reading the document
    DocumentExtraction,
    /// Seconds spent in the event provider
    EventExtraction,
    /// Seconds for the whole document
    Total,
    /// Estimated provider cost
    Cost,
}

impl ExtraColumn {
    /// Column header
    pub fn header(&self) -> &'static str {
        match self {
            ExtraColumn::DocumentExtraction => "Document Extraction (s)",
            ExtraColumn::EventExtraction => "Event Extraction (s)",
            ExtraColumn::Total => "Total (s)",
            ExtraColumn::Cost => "Cost (USD)",
        }
    }

    fn cell(&self, record: &EventRecord) -> Cell {
        let timing = record.attributes.timing;
        Cell::Number(match self {
            ExtraColumn::DocumentExtraction => timing.map(|t| t.doc_extraction_seconds),
            ExtraColumn::EventExtraction => timing.map(|t| t.event_extraction_seconds),
            ExtraColumn::Total => timing.map(|t| t.total_seconds),
            ExtraColumn::Cost => record.attributes.usage.and_then(|u| u.cost_usd),
        })
    }
}

/// One table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Sequence number
    Integer(u32),
    /// Text, possibly empty
    Text(String),
    /// Measurement, blank when not recorded
    Number(Option<f64>),
}

impl Cell {
    fn to_json(&self) -> Value {
        match self {
            Cell::Integer(n) => Value::from(*n),
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Number(Some(n)) => Value::from(*n),
            Cell::Number(None) => Value::Null,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Integer(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(Some(n)) => write!(f, "{}", n),
            Cell::Number(None) => Ok(()),
        }
    }
}

/// Export target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values
    Csv,
    /// JSON array of objects keyed by column header
    Json,
    /// Excel workbook
    Xlsx,
}

impl ExportFormat {
    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            other => Err(format!("unknown export format '{}'", other)),
        }
    }
}

/// Summary statistics over a set of records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    /// Number of records
    pub total_events: usize,
    /// Number of distinct document references
    pub unique_documents: usize,
    /// Records with a non-empty citation
    pub events_with_citations: usize,
    /// Mean particulars length in characters
    pub avg_particulars_length: f64,
}

impl TableSummary {
    /// Summarize `records`
    pub fn from_records(records: &[EventRecord]) -> Self {
        let documents: BTreeSet<&str> = records
            .iter()
            .map(|r| r.document_reference.as_str())
            .collect();
        let total_chars: usize = records.iter().map(|r| r.particulars.chars().count()).sum();
        let avg_particulars_length = if records.is_empty() {
            0.0
        } else {
            total_chars as f64 / records.len() as f64
        };

        Self {
            total_events: records.len(),
            unique_documents: documents.len(),
            events_with_citations: records.iter().filter(|r| r.has_citation()).count(),
            avg_particulars_length,
        }
    }
}

/// Check that records fit the output schema
///
/// Every record needs a document reference and a sequence number, and each
/// document's records must be numbered 1, 2, 3... without gaps.
pub fn validate_records(records: &[EventRecord]) -> Result<(), PipelineError> {
    let mut previous: Option<&EventRecord> = None;

    for (index, record) in records.iter().enumerate() {
        if record.document_reference.trim().is_empty() {
            return Err(PipelineError::Schema(format!(
                "record {} has no document reference",
                index + 1
            )));
        }

        let continues = previous.is_some_and(|prev| {
            record.sequence_number == prev.sequence_number + 1
                && record.document_reference == prev.document_reference
        });
        if record.sequence_number != 1 && !continues {
            return Err(PipelineError::Schema(format!(
                "record {} of {} is numbered {} out of sequence",
                index + 1,
                record.document_reference,
                record.sequence_number
            )));
        }
        previous = Some(record);
    }
    Ok(())
}

/// Records laid out as rows under canonical and optional headers
#[derive(Debug, Clone, PartialEq)]
pub struct EventTable {
    extras: Vec<ExtraColumn>,
    rows: Vec<Vec<Cell>>,
    summary: TableSummary,
}

impl EventTable {
    /// Validate `records` and lay them out with the given extra columns
    pub fn build(records: &[EventRecord], extras: &[ExtraColumn]) -> Result<Self, PipelineError> {
        validate_records(records)?;

        let rows = records
            .iter()
            .map(|record| {
                let mut row = vec![
                    Cell::Integer(record.sequence_number),
                    Cell::Text(record.date.clone()),
                    Cell::Text(record.particulars.clone()),
                    Cell::Text(record.citation.clone()),
                    Cell::Text(record.document_reference.clone()),
                ];
                row.extend(extras.iter().map(|extra| extra.cell(record)));
                row
            })
            .collect();

        Ok(Self {
            extras: extras.to_vec(),
            rows,
            summary: TableSummary::from_records(records),
        })
    }

    /// Column headers: the canonical five, then any extras
    pub fn headers(&self) -> Vec<&'static str> {
        CANONICAL_COLUMNS
            .iter()
            .copied()
            .chain(self.extras.iter().map(|e| e.header()))
            .collect()
    }

    /// Table rows
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Summary statistics
    pub fn summary(&self) -> &TableSummary {
        &self.summary
    }

    /// Write the table as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), PipelineError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(self.headers())?;
        for row in &self.rows {
            csv.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        csv.flush()?;
        Ok(())
    }

    /// The table as a CSV string
    pub fn to_csv_string(&self) -> Result<String, PipelineError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| PipelineError::Export(e.to_string()))
    }

    /// The table as a JSON array of objects keyed by header, in column order
    pub fn to_json(&self) -> Value {
        let headers = self.headers();
        Value::Array(
            self.rows
                .iter()
                .map(|row| {
                    let object: Map<String, Value> = headers
                        .iter()
                        .zip(row)
                        .map(|(header, cell)| (header.to_string(), cell.to_json()))
                        .collect();
                    Value::Object(object)
                })
                .collect(),
        )
    }

    /// The table as an in-memory xlsx workbook
    pub fn to_xlsx_buffer(&self) -> Result<Vec<u8>, PipelineError> {
        Ok(self.workbook()?.save_to_buffer()?)
    }

    fn workbook(&self) -> Result<Workbook, PipelineError> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(WORKSHEET_NAME)?;

        for (col, header) in self.headers().iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
        }
        for (row_idx, row) in self.rows.iter().enumerate() {
            let xl_row = row_idx as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Integer(n) => {
                        worksheet.write_number(xl_row, col, f64::from(*n))?;
                    }
                    Cell::Text(s) => {
                        worksheet.write_string(xl_row, col, s)?;
                    }
                    Cell::Number(Some(n)) => {
                        worksheet.write_number(xl_row, col, *n)?;
                    }
                    Cell::Number(None) => {}
                }
            }
        }
        worksheet.set_column_width(2, 80)?;
        Ok(workbook)
    }

    /// Write the table to `path` in `format`
    pub fn export(&self, format: ExportFormat, path: &Path) -> Result<(), PipelineError> {
        match format {
            ExportFormat::Csv => self.write_csv(std::fs::File::create(path)?)?,
            ExportFormat::Json => {
                let file = std::fs::File::create(path)?;
                serde_json::to_writer_pretty(file, &self.to_json())?;
            }
            ExportFormat::Xlsx => self.workbook()?.save(path)?,
        }
        info!(
            "Exported {} row(s) as {} to {}",
            self.rows.len(),
            format.extension(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_domain::{FailureReason, TimingMetrics, TokenUsage};
    use std::time::Duration;

    fn numbered(doc: &str, items: &[(&str, &str, &str)]) -> Vec<EventRecord> {
        items
            .iter()
            .enumerate()
            .map(|(i, (particulars, citation, date))| {
                let mut r = EventRecord::new(*particulars, *citation, *date);
                r.sequence_number = i as u32 + 1;
                r.document_reference = doc.to_string();
                r
            })
            .collect()
    }

    #[test]
    fn test_canonical_headers_only_by_default() {
        let table = EventTable::build(&numbered("a.pdf", &[("Filed.", "", "")]), &[]).unwrap();
        assert_eq!(table.headers(), CANONICAL_COLUMNS.to_vec());
    }

    #[test]
    fn test_extra_columns_appended_after_canonical() {
        let extras = [ExtraColumn::Total, ExtraColumn::Cost];
        let table = EventTable::build(&numbered("a.pdf", &[("Filed.", "", "")]), &extras).unwrap();
        let headers = table.headers();
        assert_eq!(&headers[..5], &CANONICAL_COLUMNS);
        assert_eq!(&headers[5..], &["Total (s)", "Cost (USD)"]);
    }

    #[test]
    fn test_rejects_missing_document_reference() {
        let mut records = numbered("a.pdf", &[("Filed.", "", "")]);
        records[0].document_reference = "  ".to_string();
        assert!(matches!(
            EventTable::build(&records, &[]),
            Err(PipelineError::Schema(_))
        ));
    }

    #[test]
    fn test_rejects_gaps_in_sequence() {
        let mut records = numbered("a.pdf", &[("One.", "", ""), ("Two.", "", "")]);
        records[1].sequence_number = 3;
        assert!(validate_records(&records).is_err());

        records[1].sequence_number = 0;
        assert!(validate_records(&records).is_err());
    }

    #[test]
    fn test_accepts_per_document_numbering() {
        let mut records = numbered("a.pdf", &[("One.", "", ""), ("Two.", "", "")]);
        records.extend(numbered("b.pdf", &[("Three.", "", "")]));
        assert!(validate_records(&records).is_ok());
    }

    #[test]
    fn test_csv_quotes_and_blanks() {
        let records = numbered(
            "brief.pdf",
            &[("The court held, in part, that \"notice\" was due.", "Fed. R. Civ. P. 12(b)", "2020-01-02")],
        );
        let csv = EventTable::build(&records, &[ExtraColumn::Cost])
            .unwrap()
            .to_csv_string()
            .unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "No,Date,Event Particulars,Citation,Document Reference,Cost (USD)"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1,2020-01-02,\"The court held, in part, that \"\"notice\"\" was due.\",Fed. R. Civ. P. 12(b),brief.pdf,"
        );
    }

    #[test]
    fn test_json_keys_in_column_order() {
        let mut records = numbered("a.pdf", &[("Filed.", "", "2021-05-01")]);
        records[0].attributes.timing = Some(TimingMetrics::from_durations(
            Duration::from_millis(1500),
            Duration::from_millis(500),
            Duration::from_millis(2000),
        ));
        let json = EventTable::build(&records, &[ExtraColumn::Total]).unwrap().to_json();

        let row = json[0].as_object().unwrap();
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["No", "Date", "Event Particulars", "Citation", "Document Reference", "Total (s)"]
        );
        assert_eq!(row["No"], 1);
        assert_eq!(row["Citation"], "");
        assert_eq!(row["Total (s)"], 2.0);
    }

    #[test]
    fn test_summary() {
        let mut records = numbered("a.pdf", &[("abcd", "Cite 1", ""), ("ab", "", "")]);
        records.push(EventRecord::fallback(FailureReason::NoEvents, "b.pdf"));
        let summary = TableSummary::from_records(&records);

        assert_eq!(summary.total_events, 3);
        assert_eq!(summary.unique_documents, 2);
        assert_eq!(summary.events_with_citations, 1);
        let fallback_len = records[2].particulars.chars().count() as f64;
        assert!((summary.avg_particulars_length - (6.0 + fallback_len) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_of_nothing() {
        let summary = TableSummary::from_records(&[]);
        assert_eq!(summary.total_events, 0);
        assert_eq!(summary.avg_particulars_length, 0.0);
    }

    #[test]
    fn test_cost_cell_blank_without_usage() {
        let mut records = numbered("a.pdf", &[("One.", "", ""), ("Two.", "", "")]);
        records[1].attributes.usage = Some(TokenUsage {
            prompt_tokens: 1000,
            completion_tokens: 200,
            cost_usd: Some(0.0003),
        });
        let table = EventTable::build(&records, &[ExtraColumn::Cost]).unwrap();
        assert_eq!(table.rows()[0][5], Cell::Number(None));
        assert_eq!(table.rows()[1][5], Cell::Number(Some(0.0003)));
    }

    #[test]
    fn test_xlsx_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.xlsx");
        let table = EventTable::build(&numbered("a.pdf", &[("Filed.", "", "")]), &[]).unwrap();

        table.export(ExportFormat::Xlsx, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
        assert_eq!(&table.to_xlsx_buffer().unwrap()[..2], b"PK");
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("excel".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }
}
