//! CSV import and export for the estimate book.
//!
//! - [`LineItemLoader`] replaces the line items of stored estimates from a
//!   CSV file.
//! - [`EstimateExporter`] writes one summary row per estimate.

mod exporter;
mod loader;

pub use exporter::{EstimateExporter, ExportError};
pub use loader::{LineItemLoader, LineItemLoaderError, LineItemRecord};
