//! Library export: per-item collection, batch selection, and
//! dependency-closure traversal.
//!
//! Batch operations never abort on one bad library: expected filesystem
//! failures are captured per item into a [`ProjectExportInfo`] and the
//! caller decides what a nonzero failed-count means.

use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::core::build_config::BuildConfig;
use crate::core::error::{Error, Result};
use crate::core::library::Library;
use crate::core::project::{matches_any, Project};
use crate::util;

/// How a library is materialized at the destination.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Remove an existing destination tree first.
    pub overwrite: bool,
    /// Export compiled artifacts plus the reduced source subset instead
    /// of full source.
    pub binary: bool,
    /// Nest the export under a `V<version>` folder.
    pub include_version: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            overwrite: false,
            binary: true,
            include_version: false,
        }
    }
}

/// Outcome of exporting one library.
#[derive(Debug)]
pub struct LibExportInfo {
    pub name: String,
    /// Destination the export was attempted into.
    pub path: PathBuf,
    /// The captured failure, if the attempt did not complete.
    pub error: Option<Error>,
}

/// Aggregate outcome of an export batch, partitioned into successes and
/// failures.
#[derive(Debug, Default)]
pub struct ProjectExportInfo {
    success: Vec<LibExportInfo>,
    failed: Vec<LibExportInfo>,
}

impl ProjectExportInfo {
    pub fn new() -> ProjectExportInfo {
        ProjectExportInfo::default()
    }

    /// Record one attempt, routed by its error field.
    pub fn push(&mut self, info: LibExportInfo) {
        if info.error.is_none() {
            self.success.push(info);
        } else {
            self.failed.push(info);
        }
    }

    /// Fold another aggregate into this one (dependency closures).
    pub fn merge(&mut self, other: ProjectExportInfo) {
        self.success.extend(other.success);
        self.failed.extend(other.failed);
    }

    pub fn success(&self) -> &[LibExportInfo] {
        &self.success
    }

    pub fn failed(&self) -> &[LibExportInfo] {
        &self.failed
    }

    pub fn len(&self) -> usize {
        self.success.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Export one library into `dest`, capturing expected filesystem failures
/// into the returned info.
pub fn export_one(
    library: &Library,
    dest: &Path,
    build_folder: &Path,
    configs: &[BuildConfig],
    options: &ExportOptions,
) -> Result<LibExportInfo> {
    let path = library.export_dest(dest, options.include_version);

    let attempt = (|| -> Result<()> {
        if options.overwrite && path.exists() {
            tracing::debug!("export already exists, removing {}", path.display());
            util::fs::force_remove_dir_all(&path)?;
        }
        if options.binary {
            library.collect_binary(build_folder, &path, configs)
        } else {
            library.collect_source(&path)
        }
    })();

    let error = match attempt {
        Ok(()) => None,
        Err(err) if err.is_export_capturable() => {
            tracing::debug!("export of {} failed: {err}", library.name());
            Some(err)
        }
        Err(err) => return Err(err),
    };

    Ok(LibExportInfo {
        name: library.name().to_string(),
        path,
        error,
    })
}

/// Export a selection of the project's libraries. A whitelist
/// (case-insensitive exact names) takes precedence over a blacklist,
/// which takes precedence over exporting everything. No dependency
/// resolution happens at this level.
pub fn export_libraries(
    project: &Project,
    dest: &Path,
    configs: Option<&[BuildConfig]>,
    whitelist: &[String],
    blacklist: &[String],
    options: &ExportOptions,
) -> Result<ProjectExportInfo> {
    let discovered;
    let configs = match configs {
        Some(configs) => configs,
        None => {
            discovered = project.build_configs()?;
            &discovered
        }
    };

    let selected: Vec<&Library> = if !whitelist.is_empty() {
        project
            .libraries()
            .iter()
            .filter(|l| whitelist.iter().any(|w| w.eq_ignore_ascii_case(l.name())))
            .collect()
    } else if !blacklist.is_empty() {
        project
            .libraries()
            .iter()
            .filter(|l| !blacklist.iter().any(|b| b.eq_ignore_ascii_case(l.name())))
            .collect()
    } else {
        project.libraries().iter().collect()
    };

    let mut info = ProjectExportInfo::new();
    for library in selected {
        tracing::info!("exporting {}", library.name());
        info.push(export_one(
            library,
            dest,
            project.temp_path(),
            configs,
            options,
        )?);
    }
    Ok(info)
}

/// Export one library and, unless disabled, its transitive dependency
/// closure, dependencies first.
///
/// Declared dependency names are filtered through the caller's ignore
/// globs and the project's system-library ignore list, then resolved to
/// libraries the project knows; unresolved names are skipped. The
/// traversal keeps a visited set (a shared dependency exports once) and
/// an active-path stack: a dependency cycle fails fast with
/// [`Error::CycleDetected`].
pub fn export_library(
    project: &Project,
    library: &Library,
    dest: &Path,
    ignores: &[Pattern],
    options: &ExportOptions,
    with_dependencies: bool,
) -> Result<ProjectExportInfo> {
    let configs = project.build_configs()?;
    let mut info = ProjectExportInfo::new();
    let mut visited: Vec<String> = Vec::new();
    let mut stack: Vec<String> = Vec::new();

    export_closure(
        project,
        library,
        dest,
        ignores,
        options,
        with_dependencies,
        &configs,
        &mut info,
        &mut visited,
        &mut stack,
    )?;
    Ok(info)
}

#[allow(clippy::too_many_arguments)]
fn export_closure(
    project: &Project,
    library: &Library,
    dest: &Path,
    ignores: &[Pattern],
    options: &ExportOptions,
    with_dependencies: bool,
    configs: &[BuildConfig],
    info: &mut ProjectExportInfo,
    visited: &mut Vec<String>,
    stack: &mut Vec<String>,
) -> Result<()> {
    let name = library.name().to_string();
    if stack.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
        let mut chain = stack.clone();
        chain.push(name);
        return Err(Error::CycleDetected { chain });
    }
    if visited.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
        return Ok(());
    }

    if with_dependencies {
        stack.push(name.clone());
        let mut dep_names = library.dependency_names();
        dep_names.retain(|n| !matches_any(n, ignores) && !matches_any(n, project.ignores()));

        for dep in project.libraries_by_name(&dep_names) {
            export_closure(
                project, dep, dest, ignores, options, true, configs, info, visited, stack,
            )?;
        }
        stack.pop();
    }

    visited.push(name);
    info.push(export_one(
        library,
        dest,
        project.temp_path(),
        configs,
        options,
    )?);
    Ok(())
}

/// Parameters of a file-driven export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportParams {
    pub project_path: String,
    pub configs: Vec<String>,
    pub export_path: String,
    pub overwrite: bool,
    pub source: bool,
    pub version_sub_folders: bool,
    pub ignore_libraries: Vec<String>,
}

impl Default for ExportParams {
    fn default() -> Self {
        ExportParams {
            project_path: String::new(),
            configs: Vec::new(),
            export_path: String::new(),
            overwrite: true,
            source: false,
            version_sub_folders: false,
            ignore_libraries: Vec::new(),
        }
    }
}

impl ExportParams {
    /// Load a parameter file. A missing file is populated with defaults
    /// and `None` is returned so the caller can ask the user to fill it
    /// in.
    pub fn load(path: &Path) -> Result<Option<ExportParams>> {
        if !path.exists() {
            let defaults = ExportParams::default();
            let json = serde_json::to_string_pretty(&defaults)
                .map_err(|e| Error::structure(path, e.to_string()))?;
            std::fs::write(path, json).map_err(|e| Error::io(path, e))?;
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let params: ExportParams =
            serde_json::from_str(&content).map_err(|e| Error::structure(path, e.to_string()))?;
        Ok(Some(params))
    }
}
