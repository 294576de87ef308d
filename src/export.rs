//! Result export: the JSON report and the two-column spreadsheet.
//!
//! Filenames embed the run's capture timestamp so repeated runs never
//! collide. The exporter owns no event channel; the dispatcher turns its
//! return value into status or error events.

use crate::config::OutputMode;
use crate::error::Result;
use crate::types::{CheckOutcome, ResultMap};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};

/// Filename stem shared by every export of one run.
const RESULTS_FILE_STEM: &str = "archived_or_not_results";

/// Timestamp format for capture timestamps in output filenames.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// A capture timestamp for the current moment, e.g. `2026-08-08_14-03-59`.
pub fn capture_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Which on-disk form one export file takes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    /// The JSON report
    Json,
    /// The spreadsheet
    Excel,
}

impl ExportFormat {
    /// Short label used in "saved to" status text.
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Excel => "Excel",
        }
    }
}

/// One export file written by a run.
#[derive(Clone, Debug)]
pub struct ExportedFile {
    /// The on-disk form
    pub format: ExportFormat,
    /// Where it was written
    pub path: PathBuf,
}

/// Serializes a completed run's [`ResultMap`] to disk.
#[derive(Clone, Debug)]
pub struct ResultExporter {
    output_dir: PathBuf,
}

impl ResultExporter {
    /// An exporter writing into `requested` when it is an existing
    /// directory, else into the current working directory.
    pub fn new(requested: Option<&Path>) -> Self {
        let output_dir = match requested {
            Some(dir) if dir.is_dir() => dir.to_path_buf(),
            _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };
        Self { output_dir }
    }

    /// The directory export files land in.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the files `mode` asks for, all stamped with `timestamp`.
    /// `OutputMode::None` writes nothing. The in-memory map is untouched
    /// whether or not any write succeeds.
    pub fn export(
        &self,
        results: &ResultMap,
        mode: OutputMode,
        timestamp: &str,
    ) -> Result<Vec<ExportedFile>> {
        let mut written = Vec::new();

        if mode.wants_json() {
            let path = self.export_json(results, timestamp)?;
            tracing::info!(path = %path.display(), "results JSON written");
            written.push(ExportedFile {
                format: ExportFormat::Json,
                path,
            });
        }

        if mode.wants_excel() {
            let path = self.export_excel(results, timestamp)?;
            tracing::info!(path = %path.display(), "results spreadsheet written");
            written.push(ExportedFile {
                format: ExportFormat::Excel,
                path,
            });
        }

        Ok(written)
    }

    fn export_json(&self, results: &ResultMap, timestamp: &str) -> Result<PathBuf> {
        let path = self
            .output_dir
            .join(format!("{}_{}.json", RESULTS_FILE_STEM, timestamp));
        let body = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, body)?;
        Ok(path)
    }

    fn export_excel(&self, results: &ResultMap, timestamp: &str) -> Result<PathBuf> {
        let path = self
            .output_dir
            .join(format!("{}_{}.xlsx", RESULTS_FILE_STEM, timestamp));

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "Source Path")?;
        worksheet.write_string(0, 1, "Found Location")?;

        for (row, (source, location)) in tabular_rows(results).into_iter().enumerate() {
            let row = row as u32 + 1;
            worksheet.write_string(row, 0, source)?;
            worksheet.write_string(row, 1, location)?;
        }

        workbook.save(&path)?;
        Ok(path)
    }
}

/// Flatten a result map into `(Source Path, Found Location)` rows.
///
/// A file with N found locations becomes N rows, one location per row, a
/// deliberate denormalization for spreadsheet consumption. Any other
/// outcome becomes exactly one row carrying its description.
pub fn tabular_rows(results: &ResultMap) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    for (source, outcome) in results.iter() {
        match outcome {
            CheckOutcome::Found(locations) => {
                for location in locations {
                    rows.push((source.to_string(), location.clone()));
                }
            }
            other => rows.push((source.to_string(), other.description())),
        }
    }
    rows
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_results() -> ResultMap {
        let mut results = ResultMap::new();
        results.insert(
            "\\x\\a.txt".into(),
            CheckOutcome::Found(vec!["loc1".into(), "loc2".into()]),
        );
        results.insert("\\x\\b.txt".into(), CheckOutcome::NotFound);
        results
    }

    #[test]
    fn tabular_rows_denormalizes_found_locations() {
        let rows = tabular_rows(&sample_results());
        assert_eq!(
            rows,
            vec![
                ("\\x\\a.txt".to_string(), "loc1".to_string()),
                ("\\x\\a.txt".to_string(), "loc2".to_string()),
                ("\\x\\b.txt".to_string(), "None".to_string()),
            ]
        );
    }

    #[test]
    fn tabular_rows_gives_one_row_to_failed_and_skipped() {
        let mut results = ResultMap::new();
        results.insert("\\x\\c.txt".into(), CheckOutcome::Failed("timeout".into()));
        results.insert(
            "\\x\\d.txt".into(),
            CheckOutcome::Skipped {
                reason: "Skipped: file is 1200 MB, over the 1000 MB limit".into(),
                size: 1200 * 1024 * 1024,
            },
        );

        let rows = tabular_rows(&results);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1, "Error: timeout");
        assert!(rows[1].1.starts_with("Skipped"));
    }

    #[test]
    fn json_export_round_trips() {
        let dir = TempDir::new().unwrap();
        let exporter = ResultExporter::new(Some(dir.path()));
        let results = sample_results();

        let written = exporter
            .export(&results, OutputMode::Json, "2026-08-08_12-00-00")
            .unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].format, ExportFormat::Json);

        let body = std::fs::read_to_string(&written[0].path).unwrap();
        let restored: ResultMap = serde_json::from_str(&body).unwrap();
        assert_eq!(restored, results);
    }

    #[test]
    fn excel_export_writes_a_file() {
        let dir = TempDir::new().unwrap();
        let exporter = ResultExporter::new(Some(dir.path()));

        let written = exporter
            .export(&sample_results(), OutputMode::Excel, "2026-08-08_12-00-00")
            .unwrap();
        assert_eq!(written.len(), 1);
        let metadata = std::fs::metadata(&written[0].path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn both_mode_writes_json_then_excel() {
        let dir = TempDir::new().unwrap();
        let exporter = ResultExporter::new(Some(dir.path()));

        let written = exporter
            .export(&sample_results(), OutputMode::Both, "2026-08-08_12-00-00")
            .unwrap();
        let formats: Vec<ExportFormat> = written.iter().map(|f| f.format).collect();
        assert_eq!(formats, vec![ExportFormat::Json, ExportFormat::Excel]);
    }

    #[test]
    fn none_mode_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let exporter = ResultExporter::new(Some(dir.path()));

        let written = exporter
            .export(&sample_results(), OutputMode::None, "2026-08-08_12-00-00")
            .unwrap();
        assert!(written.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn filenames_embed_the_capture_timestamp() {
        let dir = TempDir::new().unwrap();
        let exporter = ResultExporter::new(Some(dir.path()));

        let written = exporter
            .export(&sample_results(), OutputMode::Json, "2026-01-02_03-04-05")
            .unwrap();
        let name = written[0].path.file_name().unwrap().to_string_lossy();
        assert_eq!(name.as_ref(), "archived_or_not_results_2026-01-02_03-04-05.json");
    }

    #[test]
    fn invalid_output_dir_falls_back_to_cwd() {
        let exporter = ResultExporter::new(Some(Path::new("/no/such/export/dir")));
        assert_eq!(
            exporter.output_dir(),
            std::env::current_dir().unwrap().as_path()
        );
    }

    #[test]
    fn capture_timestamp_matches_expected_shape() {
        let stamp = capture_timestamp();
        // YYYY-MM-DD_HH-MM-SS
        assert_eq!(stamp.len(), 19);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], "_");
        assert!(chrono::NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT).is_ok());
    }
}
