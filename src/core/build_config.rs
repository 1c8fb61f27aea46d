//! Build configurations of the physical project tree.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Error, Result};
use crate::core::object::ObjectKind;
use crate::core::package::Package;

/// Manifest listing the configuration folders of the physical tree.
pub const PHYSICAL_MANIFEST: &str = "Physical.pkg";

/// Build target class of a configuration, derived from its CPU hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetClass {
    Sg4,
    Sg4Arm,
}

/// CPU model prefixes and the target class they imply.
const CPU_PREFIXES: [(&str, TargetClass); 6] = [
    ("x20cp04", TargetClass::Sg4Arm),
    ("x20cp13", TargetClass::Sg4),
    ("x20cp14", TargetClass::Sg4),
    ("x20cp3", TargetClass::Sg4),
    ("apc", TargetClass::Sg4),
    ("5pc", TargetClass::Sg4),
];

impl TargetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetClass::Sg4 => "sg4",
            TargetClass::Sg4Arm => "sg4_arm",
        }
    }

    /// Classify a hardware folder name by case-insensitive CPU prefix,
    /// defaulting to sg4 when no prefix matches.
    pub fn from_hardware(hardware: &str) -> TargetClass {
        let hardware = hardware.to_lowercase();
        CPU_PREFIXES
            .into_iter()
            .find(|(prefix, _)| hardware.starts_with(prefix))
            .map(|(_, class)| class)
            .unwrap_or(TargetClass::Sg4)
    }
}

impl std::fmt::Display for TargetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One build configuration: its folder under the physical tree and the
/// hardware folder inside it.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub name: String,
    pub path: PathBuf,
    pub hardware: String,
    pub target: TargetClass,
}

/// Enumerate the build configurations declared by `Physical.pkg`.
///
/// Each configuration's hardware directory is taken to be the first
/// directory found under the configuration folder. That single-valued
/// assumption is not verified; configurations whose folder holds no
/// directory at all are rejected.
pub fn configs(physical_path: &Path) -> Result<Vec<BuildConfig>> {
    let physical = Package::open(physical_path.join(PHYSICAL_MANIFEST))?;

    let mut configurations = Vec::new();
    for object in physical.objects() {
        if object.kind != ObjectKind::Configuration {
            continue;
        }

        let path = physical_path.join(&object.name);
        let hardware = hardware_folder(&path)?;
        let target = TargetClass::from_hardware(&hardware);
        configurations.push(BuildConfig {
            name: object.name,
            path,
            hardware,
            target,
        });
    }
    Ok(configurations)
}

/// First directory found under a configuration folder.
fn hardware_folder(config_path: &Path) -> Result<String> {
    for entry in fs::read_dir(config_path).map_err(|e| Error::io(config_path, e))? {
        let entry = entry.map_err(|e| Error::io(config_path, e))?;
        if entry.path().is_dir() {
            return Ok(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Err(Error::structure(
        config_path,
        "configuration folder has no hardware directory",
    ))
}
