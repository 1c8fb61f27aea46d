//! High-level operations.

pub mod export;

pub use export::{
    export_libraries, export_library, export_one, ExportOptions, ExportParams, LibExportInfo,
    ProjectExportInfo,
};
