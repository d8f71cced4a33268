use crate::{
    config::Config,
    discovery::{ReportDiscovery, ReportFile},
    extractor::{ExtractionError, ExtractionResult, MovementReportExtractor},
    grid::{decode_workbook, read_workbook_bytes},
    store::{save_records, InventoryStore},
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

/// Drives a whole import: find report files, read them, extract inventory
/// and hand the records to a store.
pub struct Importer {
    discovery: ReportDiscovery,
    extractor: MovementReportExtractor,
}

impl Importer {
    pub fn new(config: Config) -> Self {
        let extractor = MovementReportExtractor::new(config.sites.clone());
        let discovery = ReportDiscovery::new(config);

        Self { discovery, extractor }
    }

    /// Decodes a workbook held in memory and extracts its inventory.
    pub fn extract_bytes(&self, source_name: &str, bytes: Vec<u8>) -> ExtractionResult {
        let sheet = decode_workbook(bytes)?;
        self.extractor.extract(&sheet.grid, source_name, &sheet.sheet_name)
    }

    pub async fn import_file<S>(&self, path: &Path, store: &mut S, dry_run: bool) -> Result<ImportSummary>
    where
        S: InventoryStore + ?Sized,
    {
        let size = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?
            .len();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        let report = ReportFile {
            path: path.to_path_buf(),
            size,
            extension,
        };
        self.import_reports(vec![report], store, dry_run).await
    }

    pub async fn import_directory<S>(&self, directory: &Path, store: &mut S, dry_run: bool) -> Result<ImportSummary>
    where
        S: InventoryStore + ?Sized,
    {
        eprintln!("🔍 Discovering reports in {}...", directory.display());
        let reports = self.discovery.discover(directory)?;
        eprintln!("  Found {} report file(s)", reports.len());

        self.import_reports(reports, store, dry_run).await
    }

    async fn import_reports<S>(&self, reports: Vec<ReportFile>, store: &mut S, dry_run: bool) -> Result<ImportSummary>
    where
        S: InventoryStore + ?Sized,
    {
        let started = Instant::now();
        let mut summary = ImportSummary::new(dry_run);

        let loaded = Self::read_reports(reports).await;

        eprintln!("\n📝 Extracting inventory...");
        let extracted = self.extract_parallel(loaded);

        for (report, result) in extracted {
            let source_name = report.source_name();
            let outcome = match result {
                Ok(extraction) => {
                    let saved = if dry_run {
                        0
                    } else {
                        save_records(store, &extraction.records, &source_name)
                            .with_context(|| format!("saving inventory from {}", report.path.display()))?
                    };
                    eprintln!(
                        "  ✓ {} ({} {}): {}",
                        source_name,
                        extraction.meta.period.month_name,
                        extraction.meta.period.year,
                        extraction.meta.sites_found.join(", ")
                    );
                    summary.records_saved += saved;
                    FileOutcome {
                        source_name,
                        path: report.path,
                        status: FileStatus::Imported {
                            period: extraction.meta.period.key(),
                            sheet_name: extraction.meta.sheet_name,
                            sites: extraction.meta.sites_found,
                            records: extraction.records.len(),
                        },
                    }
                }
                Err(error) => {
                    eprintln!("  ✗ {}: {}", source_name, error);
                    tracing::warn!(file = %report.path.display(), %error, "report not imported");
                    FileOutcome {
                        source_name,
                        path: report.path,
                        status: FileStatus::Failed {
                            error: error.to_string(),
                        },
                    }
                }
            };
            summary.files.push(outcome);
        }

        summary.elapsed_ms = started.elapsed().as_millis();
        Ok(summary)
    }

    async fn read_reports(reports: Vec<ReportFile>) -> Vec<(ReportFile, Result<Vec<u8>, ExtractionError>)> {
        let mut loaded = Vec::with_capacity(reports.len());
        for report in reports {
            let bytes = read_workbook_bytes(&report.path).await.map_err(ExtractionError::from);
            loaded.push((report, bytes));
        }
        loaded
    }

    fn extract_parallel(
        &self,
        loaded: Vec<(ReportFile, Result<Vec<u8>, ExtractionError>)>,
    ) -> Vec<(ReportFile, ExtractionResult)> {
        loaded
            .into_par_iter()
            .map(|(report, bytes)| {
                let result = bytes.and_then(|bytes| self.extract_bytes(&report.source_name(), bytes));
                (report, result)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Imported {
        period: String,
        sheet_name: String,
        sites: Vec<String>,
        records: usize,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub source_name: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,
    pub files: Vec<FileOutcome>,
    pub records_saved: usize,
    pub elapsed_ms: u128,
}

impl ImportSummary {
    fn new(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            dry_run,
            files: Vec::new(),
            records_saved: 0,
            elapsed_ms: 0,
        }
    }

    pub fn imported(&self) -> usize {
        self.files
            .iter()
            .filter(|file| matches!(file.status, FileStatus::Imported { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.imported()
    }

    pub fn print_summary(&self) {
        println!("\n📊 Import Summary");
        println!("=================");
        println!("  Run: {}", self.run_id);
        println!("  Files: {} ({} imported, {} failed)", self.files.len(), self.imported(), self.failed());
        if self.dry_run {
            println!("  Dry run: nothing was saved");
        } else {
            println!("  Records saved: {}", self.records_saved);
        }
        println!("  Duration: {}ms", self.elapsed_ms);
    }

    pub fn export_to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryInventoryStore;
    use crate::test_support::july_report;
    use crate::vocabulary::CategoryCode;
    use std::fs;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ranch-ledger-import-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn extracts_from_workbook_bytes() {
        let importer = Importer::new(Config::default());
        let extraction = importer.extract_bytes("julio.xlsx", july_report()).unwrap();

        assert_eq!(extraction.meta.sheet_name, "Movimientos");
        assert_eq!(extraction.meta.period.key(), "2024-07");
        assert_eq!(extraction.meta.sites_found, vec!["El Rosario".to_string(), "Santa Fe".to_string()]);

        let rosario = &extraction.records[0];
        assert_eq!(rosario.count(CategoryCode::Vp), 120);
        assert_eq!(rosario.count(CategoryCode::Buey), 4);
        assert_eq!(rosario.total, 154);

        let santa_fe = &extraction.records[1];
        assert_eq!(santa_fe.count(CategoryCode::Nas), 6);
        assert_eq!(santa_fe.total, 46);
    }

    #[test]
    fn undecodable_bytes_become_a_decode_error() {
        let importer = Importer::new(Config::default());
        let err = importer.extract_bytes("roto.xlsx", b"PK garbage".to_vec()).unwrap_err();
        assert!(matches!(err, ExtractionError::Decode(_)));
        assert!(err.to_string().starts_with("failed to read spreadsheet"));
    }

    #[tokio::test]
    async fn imports_a_directory_and_reports_failures() {
        let dir = scratch_dir();
        fs::write(dir.join("2024-07.xlsx"), july_report()).unwrap();
        fs::write(dir.join("roto.xlsx"), b"not a workbook").unwrap();

        let importer = Importer::new(Config::default());
        let mut store = MemoryInventoryStore::new();
        let summary = importer.import_directory(&dir, &mut store, false).await.unwrap();

        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.imported(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.records_saved, 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("Santa Fe", "2024-07").unwrap().source_name, "2024-07.xlsx");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn reimporting_replaces_records() {
        let dir = scratch_dir();
        let path = dir.join("julio.xlsx");
        fs::write(&path, july_report()).unwrap();

        let importer = Importer::new(Config::default());
        let mut store = MemoryInventoryStore::new();
        importer.import_file(&path, &mut store, false).await.unwrap();
        importer.import_file(&path, &mut store, false).await.unwrap();

        assert_eq!(store.len(), 2);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn dry_run_saves_nothing() {
        let dir = scratch_dir();
        let path = dir.join("julio.xlsx");
        fs::write(&path, july_report()).unwrap();

        let importer = Importer::new(Config::default());
        let mut store = MemoryInventoryStore::new();
        let summary = importer.import_file(&path, &mut store, true).await.unwrap();

        assert_eq!(summary.imported(), 1);
        assert_eq!(summary.records_saved, 0);
        assert!(store.is_empty());

        let json: serde_json::Value = serde_json::from_str(&summary.export_to_json().unwrap()).unwrap();
        assert_eq!(json["files"][0]["status"], "imported");
        assert_eq!(json["files"][0]["period"], "2024-07");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let importer = Importer::new(Config::default());
        let mut store = MemoryInventoryStore::new();
        let missing = std::env::temp_dir().join(format!("{}.xlsx", uuid::Uuid::new_v4()));
        assert!(importer.import_file(&missing, &mut store, false).await.is_err());
    }
}
