//! Flat-export extractor
//!
//! Reads the legacy CSV export: one file per entity, named by a fixed
//! convention (`<export_dir>/<entity>.csv`), header row required. Columns
//! beyond the fields an importer cares about are carried along and ignored
//! downstream.

use crate::models::{EntityStep, SourceOrigin, SourceRecord};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// CSV file extractor for one legacy export directory
#[derive(Debug, Clone)]
pub struct FlatExportExtractor {
    export_dir: PathBuf,
}

impl FlatExportExtractor {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    /// Path of the export file for one entity
    pub fn file_path(&self, step: EntityStep) -> PathBuf {
        self.export_dir.join(format!("{}.csv", step.source_name()))
    }

    /// Extract all records for one entity.
    ///
    /// A missing file yields an empty sequence. Individual rows that fail
    /// to parse are logged and skipped; they cannot fail the run.
    pub fn extract(&self, step: EntityStep) -> Vec<SourceRecord> {
        let path = self.file_path(step);
        if !path.exists() {
            debug!(entity = step.source_name(), path = %path.display(), "No flat export file");
            return Vec::new();
        }

        match self.read_file(step, &path) {
            Ok(records) => {
                debug!(
                    entity = step.source_name(),
                    count = records.len(),
                    "Flat export read"
                );
                records
            }
            Err(e) => {
                warn!(
                    entity = step.source_name(),
                    path = %path.display(),
                    error = %e,
                    "Flat export unreadable, treating as empty"
                );
                Vec::new()
            }
        }
    }

    fn read_file(&self, step: EntityStep, path: &Path) -> csv::Result<Vec<SourceRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;
        let headers = reader.headers()?.clone();

        let mut records = Vec::new();
        for (row_idx, row) in reader.records().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(
                        entity = step.source_name(),
                        row = row_idx + 1,
                        error = %e,
                        "Skipping unreadable export row"
                    );
                    continue;
                }
            };

            let mut record = SourceRecord::new(SourceOrigin::FlatExport);
            for (header, value) in headers.iter().zip(row.iter()) {
                record.push(header, Value::String(value.to_string()));
            }
            if !record.is_empty() {
                records.push(record);
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_export(dir: &Path, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.join(name)).expect("create export file");
        file.write_all(content.as_bytes()).expect("write export file");
    }

    #[test]
    fn missing_file_yields_empty_sequence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let extractor = FlatExportExtractor::new(dir.path());
        assert!(extractor.extract(EntityStep::Accounts).is_empty());
    }

    #[test]
    fn reads_headers_and_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_export(
            dir.path(),
            "accounts.csv",
            "email,first_name,last_name\na@b.com,Anna,Nowak\nc@d.com,Carl,\n",
        );

        let extractor = FlatExportExtractor::new(dir.path());
        let records = extractor.extract(EntityStep::Accounts);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get_str("email").as_deref(), Some("a@b.com"));
        assert_eq!(records[0].get_str("first_name").as_deref(), Some("Anna"));
        assert_eq!(records[1].get_str("last_name"), None);
        assert_eq!(records[0].origin(), SourceOrigin::FlatExport);
    }

    #[test]
    fn tolerates_extra_and_ragged_columns() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_export(
            dir.path(),
            "notes.csv",
            "id,patient_email,body,obsolete_column\n1,a@b.com,hello,x\n2,c@d.com,short row\n",
        );

        let extractor = FlatExportExtractor::new(dir.path());
        let records = extractor.extract(EntityStep::Notes);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get_str("obsolete_column").as_deref(), Some("x"));
        assert_eq!(records[1].get_str("body").as_deref(), Some("short row"));
    }

    #[test]
    fn quoted_fields_keep_delimiters() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_export(
            dir.path(),
            "messages.csv",
            "id,body\n1,\"hello, world\"\n",
        );

        let extractor = FlatExportExtractor::new(dir.path());
        let records = extractor.extract(EntityStep::Messages);
        assert_eq!(records[0].get_str("body").as_deref(), Some("hello, world"));
    }
}
