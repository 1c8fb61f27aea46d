//! astool - project model and library export tooling for Automation
//! Studio projects.
//!
//! This crate provides the typed, write-back object layer over the IDE's
//! XML project files, the directory-synchronization algorithm, and the
//! dependency-aware library export engine.

pub mod core;
pub mod ops;
pub mod util;
pub mod xml;

/// Test fixtures for astool unit tests.
///
/// Only available when compiling tests; provides builders for synthetic
/// project trees.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    BuildConfig, Dependency, DeploymentTable, Error, Language, Library, ObjectKind, Package,
    Project, Result, TargetClass,
};
pub use crate::ops::{ExportOptions, LibExportInfo, ProjectExportInfo};
pub use crate::xml::{Document, Element};
