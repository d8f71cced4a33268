use crate::{store::StoredInventory, vocabulary::CategoryCode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Markdown,
    All,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InventoryReport {
    pub metadata: ReportMetadata,
    pub sites: Vec<SiteHistory>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub version: String,
    pub record_count: usize,
    pub first_period: Option<String>,
    pub last_period: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SiteHistory {
    pub site: String,
    pub periods: Vec<PeriodRow>,
    pub latest_total: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PeriodRow {
    pub period: String,
    pub category_counts: BTreeMap<CategoryCode, u64>,
    pub total: u64,
    /// Head count change against the site's previous stored period
    pub change: Option<i64>,
    pub source_name: String,
}

/// Signed difference `after - before`, saturating at the `i64` bounds.
fn period_change(before: u64, after: u64) -> i64 {
    let before = i64::try_from(before).unwrap_or(i64::MAX);
    let after = i64::try_from(after).unwrap_or(i64::MAX);
    after.saturating_sub(before)
}

pub struct Reporter;

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_report(&self, entries: &[StoredInventory]) -> InventoryReport {
        let mut by_site: BTreeMap<&str, Vec<&StoredInventory>> = BTreeMap::new();
        for entry in entries {
            by_site.entry(entry.record.site.as_str()).or_default().push(entry);
        }

        let sites = by_site
            .into_iter()
            .map(|(site, mut entries)| {
                entries.sort_by(|a, b| a.record.period.cmp(&b.record.period));
                self.create_site_history(site, &entries)
            })
            .collect();

        let mut periods: Vec<&str> = entries.iter().map(|entry| entry.record.period.as_str()).collect();
        periods.sort_unstable();

        InventoryReport {
            metadata: ReportMetadata {
                generated_at: chrono::Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                record_count: entries.len(),
                first_period: periods.first().map(|period| period.to_string()),
                last_period: periods.last().map(|period| period.to_string()),
            },
            sites,
        }
    }

    fn create_site_history(&self, site: &str, entries: &[&StoredInventory]) -> SiteHistory {
        let mut previous: Option<u64> = None;
        let periods: Vec<PeriodRow> = entries
            .iter()
            .map(|entry| {
                let total = entry.record.total;
                let change = previous.map(|before| period_change(before, total));
                previous = Some(total);
                PeriodRow {
                    period: entry.record.period.clone(),
                    category_counts: entry.record.category_counts.clone(),
                    total,
                    change,
                    source_name: entry.source_name.clone(),
                }
            })
            .collect();

        SiteHistory {
            site: site.to_string(),
            latest_total: periods.last().map(|row| row.total).unwrap_or(0),
            periods,
        }
    }

    pub fn export_report(&self, report: &InventoryReport, output_dir: &Path, format: ExportFormat) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("cannot create {}", output_dir.display()))?;

        let mut exported_files = Vec::new();

        if matches!(format, ExportFormat::Json | ExportFormat::All) {
            let json_path = output_dir.join("inventory-report.json");
            fs::write(&json_path, serde_json::to_string_pretty(report)?)?;
            exported_files.push(json_path);
        }

        if matches!(format, ExportFormat::Markdown | ExportFormat::All) {
            let md_path = output_dir.join("inventory-report.md");
            fs::write(&md_path, self.generate_markdown_summary(report)?)?;
            exported_files.push(md_path);
        }

        Ok(exported_files)
    }

    pub fn generate_markdown_summary(&self, report: &InventoryReport) -> Result<String> {
        let mut md = String::new();

        writeln!(md, "# Herd Inventory Report")?;
        writeln!(md)?;
        writeln!(md, "**Generated:** {}  ", report.metadata.generated_at)?;
        writeln!(md, "**Records:** {}  ", report.metadata.record_count)?;
        if let (Some(first), Some(last)) = (&report.metadata.first_period, &report.metadata.last_period) {
            writeln!(md, "**Periods:** {} to {}", first, last)?;
        }

        if report.sites.is_empty() {
            writeln!(md)?;
            writeln!(md, "_No inventory has been imported yet._")?;
            return Ok(md);
        }

        let header: Vec<String> = CategoryCode::ALL
            .iter()
            .map(|code| code.as_str().to_uppercase())
            .collect();

        for site in &report.sites {
            writeln!(md)?;
            writeln!(md, "## {}", site.site)?;
            writeln!(md)?;
            writeln!(md, "Latest head count: **{}**", site.latest_total)?;
            writeln!(md)?;
            writeln!(md, "| Period | {} | Total | Change |", header.join(" | "))?;
            writeln!(md, "|---|{}---:|---:|", "---:|".repeat(header.len()))?;

            for row in &site.periods {
                let counts: Vec<String> = CategoryCode::ALL
                    .iter()
                    .map(|code| row.category_counts.get(code).copied().unwrap_or(0).to_string())
                    .collect();
                let change = match row.change {
                    Some(change) if change > 0 => format!("+{}", change),
                    Some(change) => change.to_string(),
                    None => "-".to_string(),
                };
                writeln!(md, "| {} | {} | {} | {} |", row.period, counts.join(" | "), row.total, change)?;
            }
        }

        Ok(md)
    }
}
