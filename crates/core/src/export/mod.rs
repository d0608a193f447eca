//! Configuration-driven tabular export.
//!
//! A caller hands the [`ExportPipeline`] a [`DataSource`] and partial
//! [`ExportOptions`]. The pipeline resolves a complete [`ExportConfig`],
//! materializes the source into a [`RecordSet`], projects rows and headings,
//! renders them and names the file.

pub mod error;
pub mod filename;
pub mod options;
pub mod pipeline;
pub mod presets;
pub mod projection;
pub mod render;
pub mod resolver;
pub mod source;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::{ExportError, ExportResult};
pub use options::{ExportConfig, ExportDefaults, ExportOptions, RowMapper};
pub use pipeline::ExportPipeline;
pub use presets::PresetCatalog;
pub use projection::{Table, derive_heading};
pub use render::{RenderOptions, SpreadsheetRenderer, TabularRenderer};
pub use resolver::ConfigResolver;
pub use source::{
    DataSource, Filter, FilterValue, RecordQuery, RecordSourceRegistry, SourceResolver,
};
pub use types::{
    Cell, ExportArtifact, ExportFormat, OrderBy, Record, RecordSchema, RecordSet, SortDirection,
};
