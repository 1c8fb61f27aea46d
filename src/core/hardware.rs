//! Hardware and CPU configuration files.

use std::path::{Path, PathBuf};

use crate::core::error::{Error, Result};
use crate::xml::{Document, Element};

/// Filename of a configuration's hardware description.
pub const HARDWARE_MANIFEST: &str = "Hardware.hw";

/// A configuration's `Hardware.hw`: `Module` elements holding `Parameter`
/// entries keyed by `ID`/`Value`.
#[derive(Debug, Clone)]
pub struct HardwareConfig {
    doc: Document,
}

impl HardwareConfig {
    pub fn open(path: impl Into<PathBuf>) -> Result<HardwareConfig> {
        Ok(HardwareConfig {
            doc: Document::load(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    /// Value of a parameter, searched across all modules.
    pub fn parameter(&self, id: &str) -> Option<String> {
        self.doc
            .root
            .children_named("Module")
            .find_map(|module| module.child_with_attr("Parameter", "ID", id))
            .and_then(|p| p.attr("Value"))
            .map(str::to_string)
    }

    /// Set a parameter value and write the file. A missing parameter is
    /// created in the module that carries `ConfigurationID` (the PLC
    /// module, assumed present).
    pub fn set_parameter(&mut self, id: &str, value: &str) -> Result<()> {
        let module_index = self
            .doc
            .root
            .children
            .iter()
            .position(|m| {
                m.name == "Module" && m.child_with_attr("Parameter", "ID", id).is_some()
            })
            .or_else(|| {
                self.doc.root.children.iter().position(|m| {
                    m.name == "Module"
                        && m.child_with_attr("Parameter", "ID", "ConfigurationID").is_some()
                })
            });

        let path = self.doc.path().to_path_buf();
        let module = module_index
            .and_then(|i| self.doc.root.children.get_mut(i))
            .ok_or_else(|| Error::structure(&path, "no module carries ConfigurationID"))?;

        let existing = module
            .children
            .iter()
            .position(|c| c.name == "Parameter" && c.attr("ID") == Some(id));
        match existing {
            Some(index) => module.children[index].set_attr("Value", value),
            None => module.push(
                Element::new("Parameter")
                    .with_attr("ID", id)
                    .with_attr("Value", value),
            ),
        }
        self.doc.write()
    }
}

/// A CPU description file: build settings and runtime version under
/// `Configuration/Build` and `Configuration/AutomationRuntime`.
#[derive(Debug, Clone)]
pub struct CpuConfig {
    doc: Document,
}

impl CpuConfig {
    pub fn open(path: impl Into<PathBuf>) -> Result<CpuConfig> {
        Ok(CpuConfig {
            doc: Document::load(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    pub fn gcc_version(&self) -> Option<&str> {
        self.build_attr("GccVersion")
    }

    pub fn set_gcc_version(&mut self, value: &str) -> Result<()> {
        self.set_build_attr("GccVersion", value)
    }

    pub fn pre_build_step(&self) -> Option<&str> {
        self.build_attr("PreBuildStep")
    }

    pub fn set_pre_build_step(&mut self, value: &str) -> Result<()> {
        self.set_build_attr("PreBuildStep", value)
    }

    pub fn ar_version(&self) -> Option<&str> {
        self.doc
            .find(&["Configuration", "AutomationRuntime"])
            .and_then(|e| e.attr("Version"))
    }

    pub fn set_ar_version(&mut self, value: &str) -> Result<()> {
        let path = self.doc.path().to_path_buf();
        self.doc
            .find_mut(&["Configuration", "AutomationRuntime"])
            .ok_or_else(|| Error::structure(&path, "no AutomationRuntime element"))?
            .set_attr("Version", value);
        self.doc.write()
    }

    fn build_attr(&self, key: &str) -> Option<&str> {
        self.doc.find(&["Configuration", "Build"]).and_then(|e| e.attr(key))
    }

    fn set_build_attr(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.doc.path().to_path_buf();
        self.doc
            .find_mut(&["Configuration", "Build"])
            .ok_or_else(|| Error::structure(&path, "no Build element"))?
            .set_attr(key, value);
        self.doc.write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn hardware_file(dir: &Path) -> PathBuf {
        let path = dir.join(HARDWARE_MANIFEST);
        fs::write(
            &path,
            r#"<?xml version="1.0" encoding="utf-8"?>
<Hardware xmlns="http://br-automation.co.at/AS/Hardware">
  <Module Name="X20CP1584" Type="X20CP1584">
    <Parameter ID="ConfigurationID" Value="MyConfig" />
    <Parameter ID="ConfigVersion" Value="1.0.0" />
  </Module>
  <Module Name="IF3" Type="X20IF1082" />
</Hardware>
"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_read_parameter() {
        let tmp = TempDir::new().unwrap();
        let hw = HardwareConfig::open(hardware_file(tmp.path())).unwrap();

        assert_eq!(hw.parameter("ConfigurationID").as_deref(), Some("MyConfig"));
        assert_eq!(hw.parameter("Simulation"), None);
    }

    #[test]
    fn test_set_existing_parameter() {
        let tmp = TempDir::new().unwrap();
        let mut hw = HardwareConfig::open(hardware_file(tmp.path())).unwrap();

        hw.set_parameter("ConfigVersion", "2.0.0").unwrap();

        let hw = HardwareConfig::open(hw.path()).unwrap();
        assert_eq!(hw.parameter("ConfigVersion").as_deref(), Some("2.0.0"));
    }

    #[test]
    fn test_set_missing_parameter_created_beside_configuration_id() {
        let tmp = TempDir::new().unwrap();
        let mut hw = HardwareConfig::open(hardware_file(tmp.path())).unwrap();

        hw.set_parameter("Simulation", "1").unwrap();

        let doc = Document::load(hw.path()).unwrap();
        let plc = doc.root.child_with_attr("Module", "Name", "X20CP1584").unwrap();
        let param = plc.child_with_attr("Parameter", "ID", "Simulation").unwrap();
        assert_eq!(param.attr("Value"), Some("1"));
    }

    #[test]
    fn test_cpu_config_accessors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Cpu.pkg");
        fs::write(
            &path,
            r#"<?xml version="1.0" encoding="utf-8"?>
<Cpu xmlns="http://br-automation.co.at/AS/Cpu">
  <Configuration ModuleId="X20CP1584">
    <AutomationRuntime Version="4.53" />
    <Build GccVersion="4.1.2" />
  </Configuration>
</Cpu>
"#,
        )
        .unwrap();

        let mut cpu = CpuConfig::open(&path).unwrap();
        assert_eq!(cpu.gcc_version(), Some("4.1.2"));
        assert_eq!(cpu.ar_version(), Some("4.53"));
        assert_eq!(cpu.pre_build_step(), None);

        cpu.set_gcc_version("6.3.0").unwrap();
        cpu.set_pre_build_step("generate.bat").unwrap();

        let cpu = CpuConfig::open(&path).unwrap();
        assert_eq!(cpu.gcc_version(), Some("6.3.0"));
        assert_eq!(cpu.pre_build_step(), Some("generate.bat"));
        assert_eq!(cpu.ar_version(), Some("4.53"));
    }
}
