//! Project aggregate.
//!
//! A project is rooted at its `.apj` file and owns the fixed subtrees the
//! IDE lays out around it: `Logical` (sources), `Physical`
//! (configurations), `Temp` (build output), `Binaries`. Libraries are
//! discovered by one recursive walk of the source tree at construction;
//! [`refresh`](Project::refresh) is the only staleness boundary.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use regex::Regex;
use walkdir::WalkDir;

use crate::core::build_config::{self, BuildConfig};
use crate::core::error::{Error, Result};
use crate::core::hardware::{HardwareConfig, HARDWARE_MANIFEST};
use crate::core::library::Library;
use crate::core::object::ObjectKind;
use crate::core::package::Package;

/// Vendor/system library name patterns skipped during discovery and
/// dependency export.
pub const SYSTEM_IGNORES: [&str; 8] = [
    "_AS", "Acp10*", "Arnc0*", "Mapp*", "Motion", "TRF_LIB", "Mp*", "As*",
];

/// An opened project and its discovered libraries.
#[derive(Debug)]
pub struct Project {
    path: PathBuf,
    name: String,
    source_path: PathBuf,
    physical_path: PathBuf,
    temp_path: PathBuf,
    binary_path: PathBuf,
    ignore: Vec<Pattern>,
    libraries: Vec<Library>,
}

impl Project {
    /// Open a project from its `.apj` file or its root directory (the
    /// first project file found wins).
    pub fn open(path: impl Into<PathBuf>) -> Result<Project> {
        let mut path = path.into();
        if path.is_dir() {
            path = find_project_file(&path)?;
        }
        if !path.is_file() {
            return Err(Error::NotFound { path });
        }

        let name = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let mut project = Project {
            name,
            source_path: dir.join("Logical"),
            physical_path: dir.join("Physical"),
            temp_path: dir.join("Temp"),
            binary_path: dir.join("Binaries"),
            path,
            ignore: compile_patterns(&SYSTEM_IGNORES),
            libraries: Vec::new(),
        };
        project.refresh()?;
        Ok(project)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Project root directory (the folder holding the `.apj`).
    pub fn dir_path(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn physical_path(&self) -> &Path {
        &self.physical_path
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// The system-library ignore patterns applied during discovery.
    pub fn ignores(&self) -> &[Pattern] {
        &self.ignore
    }

    /// The discovered libraries, as of the last [`refresh`](Self::refresh).
    pub fn libraries(&self) -> &[Library] {
        &self.libraries
    }

    /// Re-discover libraries with one walk of the source tree. Ignored
    /// names are pruned from the walk; libraries that fail to load are
    /// skipped. A `.pkg` entry of kind Library marked as a reference pulls
    /// in a library living outside the walked subtree, resolved against
    /// the project root.
    pub fn refresh(&mut self) -> Result<()> {
        let mut found: Vec<Library> = Vec::new();
        let ignore = &self.ignore;
        let root = self.path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let walker = WalkDir::new(&self.source_path)
            .into_iter()
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                !ignore.iter().any(|p| p.matches(&name))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!("walk error under {}: {err}", self.source_path.display());
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();

            if name.to_lowercase().ends_with(".lby") {
                match Library::open(entry.path()) {
                    Ok(lib) => found.push(lib),
                    Err(err) => tracing::debug!("skipping library at {name}: {err}"),
                }
            } else if name.to_lowercase().ends_with(".pkg") {
                let package = match Package::open(entry.path()) {
                    Ok(package) => package,
                    Err(err) => {
                        tracing::debug!("skipping package at {name}: {err}");
                        continue;
                    }
                };
                for object in package.objects() {
                    if object.kind != ObjectKind::Library || !object.is_reference {
                        continue;
                    }
                    let target = Path::new(&object.name.replace('\\', "/")).to_path_buf();
                    let target = if target.is_absolute() {
                        target
                    } else {
                        root.join(target)
                    };
                    match Library::open(&target) {
                        Ok(lib) => found.push(lib),
                        Err(err) => {
                            tracing::debug!("skipping referenced library {}: {err}", object.name)
                        }
                    }
                }
            }
        }

        self.libraries = found;
        Ok(())
    }

    /// Library with exactly this name.
    pub fn library_by_name(&self, name: &str) -> Option<&Library> {
        self.libraries.iter().find(|l| l.name() == name)
    }

    /// Libraries matching any of the given names, in discovery order.
    pub fn libraries_by_name(&self, names: &[String]) -> Vec<&Library> {
        self.libraries
            .iter()
            .filter(|l| names.iter().any(|n| n == l.name()))
            .collect()
    }

    /// Build configurations of the physical tree.
    pub fn build_configs(&self) -> Result<Vec<BuildConfig>> {
        build_config::configs(&self.physical_path)
    }

    /// Configuration with the given name, if declared.
    pub fn config_by_name(&self, name: &str) -> Result<Option<BuildConfig>> {
        Ok(self.build_configs()?.into_iter().find(|c| c.name == name))
    }

    /// Read one hardware parameter of a configuration.
    pub fn hardware_parameter(&self, config: &str, id: &str) -> Result<Option<String>> {
        let hw = HardwareConfig::open(self.physical_path.join(config).join(HARDWARE_MANIFEST))?;
        Ok(hw.parameter(id))
    }

    /// Write one hardware parameter of a configuration.
    pub fn set_hardware_parameter(&self, config: &str, id: &str, value: &str) -> Result<()> {
        let mut hw =
            HardwareConfig::open(self.physical_path.join(config).join(HARDWARE_MANIFEST))?;
        hw.set_parameter(id, value)
    }

    /// IDE version the project was last saved with, in short form
    /// (`AS46` for `4.6.x`).
    pub fn as_version(&self) -> Result<String> {
        let content = fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let re = Regex::new(r#"AutomationStudio Version="(\d+)\.(\d+)"#)
            .map_err(|e| Error::structure(&self.path, e.to_string()))?;
        let captures = re
            .captures(&content)
            .ok_or_else(|| Error::structure(&self.path, "no AutomationStudio version header"))?;
        Ok(format!("AS{}{}", &captures[1], &captures[2]))
    }
}

/// First `.apj` file in the directory, in name order.
fn find_project_file(dir: &Path) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.extension()
                .map(|e| e.eq_ignore_ascii_case("apj"))
                .unwrap_or(false)
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next().ok_or_else(|| Error::NotFound {
        path: dir.to_path_buf(),
    })
}

fn compile_patterns(patterns: &[&str]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                tracing::warn!("invalid ignore pattern `{p}`: {err}");
                None
            }
        })
        .collect()
}

/// Whether a name matches any of the given glob patterns.
pub fn matches_any(name: &str, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|p| p.matches(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::ProjectFixture;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_project() {
        let tmp = TempDir::new().unwrap();
        let err = Project::open(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_open_resolves_project_file_and_paths() {
        let tmp = TempDir::new().unwrap();
        let fixture = ProjectFixture::new(tmp.path(), "Machine");

        let project = Project::open(tmp.path()).unwrap();
        assert_eq!(project.name(), "Machine");
        assert_eq!(project.path(), fixture.project_file());
        assert_eq!(project.source_path(), tmp.path().join("Logical"));
        assert_eq!(project.temp_path(), tmp.path().join("Temp"));
    }

    #[test]
    fn test_discovery_finds_libraries_and_skips_system_names() {
        let tmp = TempDir::new().unwrap();
        let fixture = ProjectFixture::new(tmp.path(), "Machine");
        fixture.add_library("Libraries", "Motion1", &[]);
        fixture.add_library("Libraries", "Comms", &[]);
        // Vendor libraries are pruned by the ignore list.
        fixture.add_library("Libraries", "MpServo", &[]);
        fixture.add_library("Libraries", "AsBrStr", &[]);

        let project = Project::open(tmp.path()).unwrap();
        let mut names: Vec<&str> = project.libraries().iter().map(|l| l.name()).collect();
        names.sort();
        assert_eq!(names, vec!["Comms", "Motion1"]);
    }

    #[test]
    fn test_discovery_resolves_referenced_libraries() {
        let tmp = TempDir::new().unwrap();
        let fixture = ProjectFixture::new(tmp.path(), "Machine");
        // A library outside the Logical tree, pulled in by reference.
        fixture.add_external_library("Shared/RemoteLib");
        fixture.add_reference_package("Libraries", "Shared/RemoteLib");

        let project = Project::open(tmp.path()).unwrap();
        let names: Vec<&str> = project.libraries().iter().map(|l| l.name()).collect();
        assert!(names.contains(&"RemoteLib"));
    }

    #[test]
    fn test_refresh_picks_up_new_libraries() {
        let tmp = TempDir::new().unwrap();
        let fixture = ProjectFixture::new(tmp.path(), "Machine");
        fixture.add_library("Libraries", "First", &[]);

        let mut project = Project::open(tmp.path()).unwrap();
        assert_eq!(project.libraries().len(), 1);

        fixture.add_library("Libraries", "Second", &[]);
        // The cache is stale until an explicit refresh.
        assert_eq!(project.libraries().len(), 1);
        project.refresh().unwrap();
        assert_eq!(project.libraries().len(), 2);
    }

    #[test]
    fn test_as_version() {
        let tmp = TempDir::new().unwrap();
        ProjectFixture::new(tmp.path(), "Machine");

        let project = Project::open(tmp.path()).unwrap();
        assert_eq!(project.as_version().unwrap(), "AS46");
    }

    #[test]
    fn test_hardware_parameter_round_trip() {
        let tmp = TempDir::new().unwrap();
        let fixture = ProjectFixture::new(tmp.path(), "Machine");
        fixture.add_config("Intel", "X20CP1584");

        let project = Project::open(tmp.path()).unwrap();
        assert_eq!(project.hardware_parameter("Intel", "Simulation").unwrap(), None);

        project.set_hardware_parameter("Intel", "Simulation", "1").unwrap();
        assert_eq!(
            project.hardware_parameter("Intel", "Simulation").unwrap().as_deref(),
            Some("1")
        );
    }
}
