pub mod config;
pub mod discovery;
pub mod extractor;
pub mod grid;
pub mod importer;
pub mod logging;
pub mod reporter;
pub mod store;
pub mod vocabulary;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use discovery::ReportDiscovery;
pub use extractor::{Extraction, ExtractionError, ExtractionResult, InventoryRecord, MovementReportExtractor};
pub use grid::TabularGrid;
pub use importer::Importer;
pub use reporter::Reporter;
pub use store::{InventoryStore, JsonFileInventoryStore, MemoryInventoryStore};

pub type Result<T> = anyhow::Result<T>;
