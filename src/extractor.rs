//! Monthly movements report extraction.
//!
//! A movements report is a fixed-layout sheet. Near the top a title cell reads
//! something like `REPORTE DE MOVIMIENTOS MES DE JULIO DE 2024`. Further down,
//! each site has an `INVENTARIO DE GANADO` block: the row below the title names
//! the site, a `CATEGORIA` header follows a few rows later, then one row per
//! category code and finally a `TOTAL` row. Every number we need sits in the
//! ending-balance column.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

use crate::grid::{GridError, TabularGrid};
use crate::vocabulary::{parse_month, CategoryCode, Site, SiteNames};

/// Rows examined, from the top, for the period title.
pub const PERIOD_SCAN_ROWS: usize = 5;
/// First row after an inventory anchor that may hold the `CATEGORIA` header.
pub const HEADER_SEARCH_OFFSET: usize = 2;
/// How many rows are searched for the `CATEGORIA` header.
pub const HEADER_SEARCH_ROWS: usize = 6;
/// The header row is followed by a row of sub-column labels.
pub const CATEGORY_ROWS_OFFSET: usize = 2;
/// How many rows are scanned for category codes and the `TOTAL` row.
pub const CATEGORY_SCAN_ROWS: usize = 20;
/// Column 13 of the report, the ending balance.
pub const ENDING_BALANCE_COLUMN: usize = 12;

const LABEL_COLUMN: usize = 0;
const INVENTORY_ANCHOR: &str = "INVENTARIO DE GANADO";
const EXCLUDED_ANCHORS: [&str; 2] = ["EQUINO", "PARTICIPACION"];
const CATEGORY_HEADER: &str = "CATEGORIA";
const TOTAL_LABEL: &str = "TOTAL";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("period not detected: the report title should contain \"MES DE <MONTH> DE <YEAR>\" in one of the first 5 rows")]
    PeriodNotDetected,

    #[error("no inventory sections found: no \"INVENTARIO DE GANADO\" block names a known site")]
    NoInventorySections,

    #[error("failed to read spreadsheet: {0}")]
    Decode(String),
}

impl From<GridError> for ExtractionError {
    fn from(err: GridError) -> Self {
        Self::Decode(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub month: u32,
    pub year: i32,
    pub month_name: String,
}

impl ReportPeriod {
    /// `YYYY-MM`, the period half of the storage key.
    pub fn key(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteSection {
    pub site: Site,
    pub category_header_row: usize,
    pub inventory_section_row: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub site: String,
    pub period: String,
    pub year: i32,
    pub month: u32,
    pub category_counts: BTreeMap<CategoryCode, u64>,
    pub total: u64,
}

impl InventoryRecord {
    pub fn count(&self, code: CategoryCode) -> u64 {
        self.category_counts.get(&code).copied().unwrap_or(0)
    }

    /// Sum of all category counts, saturating at `u64::MAX`.
    pub fn category_sum(&self) -> u64 {
        self.category_counts.values().copied().fold(0u64, u64::saturating_add)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMeta {
    pub source_name: String,
    pub sheet_name: String,
    pub period: ReportPeriod,
    pub sites_found: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub records: Vec<InventoryRecord>,
    pub meta: ExtractionMeta,
}

pub type ExtractionResult = Result<Extraction, ExtractionError>;

fn period_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"MES DE (\w+) DE (\d{4})").expect("period pattern is a valid regex")
    })
}

/// Counts are head counts: rounded, never negative.
fn to_count(value: f64) -> u64 {
    if value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// Pure extractor over a decoded grid. Holds only the site vocabulary, so the
/// same instance can be shared across threads and calls.
#[derive(Debug, Clone, Default)]
pub struct MovementReportExtractor {
    sites: SiteNames,
}

impl MovementReportExtractor {
    pub fn new(sites: SiteNames) -> Self {
        Self { sites }
    }

    pub fn extract(&self, grid: &TabularGrid, source_name: &str, sheet_name: &str) -> ExtractionResult {
        let period = self.detect_period(grid)?;
        tracing::debug!(source = source_name, period = %period.key(), "detected report period");

        let sections = self.detect_sections(grid);
        if sections.is_empty() {
            return Err(ExtractionError::NoInventorySections);
        }

        let records: Vec<InventoryRecord> = sections
            .iter()
            .map(|section| self.extract_section(grid, section, &period))
            .collect();

        let sites_found = sections
            .iter()
            .map(|section| self.sites.display(section.site).to_string())
            .collect();

        Ok(Extraction {
            records,
            meta: ExtractionMeta {
                source_name: source_name.to_string(),
                sheet_name: sheet_name.to_string(),
                period,
                sites_found,
            },
        })
    }

    pub fn detect_period(&self, grid: &TabularGrid) -> Result<ReportPeriod, ExtractionError> {
        (0..PERIOD_SCAN_ROWS.min(grid.row_count()))
            .find_map(|row| {
                let text = grid.text(row, LABEL_COLUMN);
                let captures = period_pattern().captures(&text)?;
                let month_name = captures.get(1)?.as_str().to_string();
                let month = parse_month(&month_name)?;
                let year = captures.get(2)?.as_str().parse::<i32>().ok()?;
                Some(ReportPeriod { month, year, month_name })
            })
            .ok_or(ExtractionError::PeriodNotDetected)
    }

    pub fn detect_sections(&self, grid: &TabularGrid) -> Vec<SiteSection> {
        let mut sections = Vec::new();

        for row in 0..grid.row_count() {
            let label = grid.text(row, LABEL_COLUMN);
            if !label.contains(INVENTORY_ANCHOR)
                || EXCLUDED_ANCHORS.iter().any(|excluded| label.contains(excluded))
            {
                continue;
            }

            let Some(site) = self.sites.find_in(&grid.text(row + 1, LABEL_COLUMN)) else {
                continue;
            };

            let first = row + HEADER_SEARCH_OFFSET;
            match (first..first + HEADER_SEARCH_ROWS).find(|candidate| grid.text(*candidate, LABEL_COLUMN) == CATEGORY_HEADER) {
                Some(header_row) => {
                    tracing::debug!(?site, anchor = row, header = header_row, "found inventory section");
                    sections.push(SiteSection {
                        site,
                        category_header_row: header_row,
                        inventory_section_row: row,
                    });
                }
                None => {
                    tracing::warn!(?site, anchor = row, "inventory section has no CATEGORIA header, skipping");
                }
            }
        }

        sections
    }

    fn extract_section(&self, grid: &TabularGrid, section: &SiteSection, period: &ReportPeriod) -> InventoryRecord {
        let mut category_counts: BTreeMap<CategoryCode, u64> = BTreeMap::new();
        let mut reported_total: Option<u64> = None;

        let first_row = section.category_header_row + CATEGORY_ROWS_OFFSET;
        for row in first_row..first_row + CATEGORY_SCAN_ROWS {
            let label = grid.text(row, LABEL_COLUMN);

            if label == TOTAL_LABEL {
                if let Some(value) = grid.number(row, ENDING_BALANCE_COLUMN) {
                    reported_total = Some(to_count(value));
                    break;
                }
            } else if let Some(code) = CategoryCode::parse(&label) {
                let count = grid.number(row, ENDING_BALANCE_COLUMN).map(to_count).unwrap_or(0);
                category_counts.insert(code, count);
            }
        }

        for code in CategoryCode::ALL {
            category_counts.entry(code).or_insert(0);
        }

        let mut record = InventoryRecord {
            site: self.sites.display(section.site).to_string(),
            period: period.key(),
            year: period.year,
            month: period.month,
            category_counts,
            total: 0,
        };

        // A zero total cannot be told apart from an unread cell.
        record.total = match reported_total {
            Some(total) if total > 0 => total,
            _ => record.category_sum(),
        };
        record
    }
}
