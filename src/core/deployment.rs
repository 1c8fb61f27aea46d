//! Software deployment tables (`cpu.sw`).
//!
//! The table assigns libraries and tasks to the CPU: one `Libraries` node
//! and exactly eight cyclic scheduling classes. Insertion is idempotent so
//! repeated deployment runs never duplicate entries.

use std::path::{Path, PathBuf};

use crate::core::error::{Error, Result};
use crate::core::object::{library_language, program_language};
use crate::xml::{Document, Element};

/// Number of cyclic scheduling classes in a deployment table.
pub const TASK_CLASS_COUNT: usize = 8;

/// The IDE stores task names truncated to this many characters.
pub const TASK_NAME_LIMIT: usize = 10;

/// Default memory class for deployed libraries and tasks.
const DEFAULT_MEMORY: &str = "UserROM";

/// A deployment table document.
///
/// Opening repairs the fixed skeleton: any missing `Cyclic#N` class is
/// created at its index and a `Libraries` node is appended if absent.
#[derive(Debug, Clone)]
pub struct DeploymentTable {
    doc: Document,
}

impl DeploymentTable {
    /// Open a deployment table, repairing missing skeleton nodes.
    pub fn open(path: impl Into<PathBuf>) -> Result<DeploymentTable> {
        let mut doc = Document::load(path)?;

        let mut changed = false;
        for index in 0..TASK_CLASS_COUNT {
            let name = format!("Cyclic#{}", index + 1);
            if doc.root.child_with_attr("TaskClass", "Name", &name).is_none() {
                doc.root
                    .insert(index, Element::new("TaskClass").with_attr("Name", name));
                changed = true;
            }
        }
        if doc.root.child("Libraries").is_none() {
            doc.root.push(Element::new("Libraries"));
            changed = true;
        }

        if changed {
            doc.write()?;
        }
        Ok(DeploymentTable { doc })
    }

    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    /// Names of all deployed libraries.
    pub fn libraries(&self) -> Vec<String> {
        self.doc
            .find_all(&["Libraries", "LibraryObject"])
            .into_iter()
            .map(|e| e.attr("Name").unwrap_or("Unknown").to_string())
            .collect()
    }

    /// Deploy a library out of `library_folder`. A case-insensitive name
    /// match against the existing entries is a no-op.
    pub fn deploy_library(
        &mut self,
        library_folder: &Path,
        name: &str,
        overrides: &[(String, String)],
    ) -> Result<()> {
        if self.libraries().iter().any(|l| l.eq_ignore_ascii_case(name)) {
            tracing::debug!("library {name} already deployed, skipping");
            return Ok(());
        }

        let language = library_language(&library_folder.join(name))
            .map(|l| l.as_str())
            .unwrap_or("None");
        let parent = library_folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut elem = Element::new("LibraryObject")
            .with_attr("Name", name)
            .with_attr("Source", format!("Libraries.{parent}.{name}.lby"))
            .with_attr("Memory", DEFAULT_MEMORY)
            .with_attr("Language", language)
            .with_attr("Debugging", "true");
        for (key, value) in overrides {
            elem.set_attr(key, value);
        }

        let path = self.doc.path().to_path_buf();
        self.doc
            .root
            .child_mut("Libraries")
            .ok_or_else(|| Error::structure(&path, "deployment table has no Libraries node"))?
            .push(elem);
        self.doc.write()
    }

    /// Deploy a task into a scheduling class. `task_folder` is the
    /// source-tree-relative folder holding the task; the class is resolved
    /// by its numeric suffix. A task whose truncated name already exists
    /// under that class is a no-op.
    pub fn deploy_task(
        &mut self,
        logical_root: &Path,
        task_folder: &str,
        name: &str,
        scheduling_class: &str,
    ) -> Result<()> {
        let path = self.doc.path().to_path_buf();
        let digit = scheduling_class
            .chars()
            .find(|c| c.is_ascii_digit())
            .ok_or_else(|| {
                Error::structure(&path, format!("no class number in `{scheduling_class}`"))
            })?;
        let cyclic = format!("Cyclic#{digit}");

        // The IDE only ever stores the first characters of a task name.
        let truncated: String = name.chars().take(TASK_NAME_LIMIT).collect();

        let class = self
            .doc
            .root
            .child_with_attr("TaskClass", "Name", &cyclic)
            .ok_or_else(|| Error::structure(&path, format!("no task class {cyclic}")))?;
        if class.child_with_attr("Task", "Name", &truncated).is_some() {
            tracing::debug!("task {truncated} already deployed to {cyclic}, skipping");
            return Ok(());
        }

        let segments: Vec<&str> = task_folder
            .split(['/', '\\'])
            .filter(|s| !s.is_empty())
            .collect();
        let task_dir = segments
            .iter()
            .fold(logical_root.to_path_buf(), |p, s| p.join(s))
            .join(name);
        let language = program_language(&task_dir).map(|l| l.as_str()).unwrap_or("None");

        let mut source = segments.join(".");
        if !source.is_empty() {
            source.push('.');
        }
        source.push_str(name);
        source.push_str(".prg");

        let elem = Element::new("Task")
            .with_attr("Name", truncated)
            .with_attr("Source", source)
            .with_attr("Memory", DEFAULT_MEMORY)
            .with_attr("Language", language)
            .with_attr("Debugging", "true");

        self.doc
            .root
            .child_with_attr_mut("TaskClass", "Name", &cyclic)
            .ok_or_else(|| Error::structure(&path, format!("no task class {cyclic}")))?
            .push(elem);
        self.doc.write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn empty_table(dir: &Path) -> DeploymentTable {
        let path = dir.join("cpu.sw");
        fs::write(
            &path,
            r#"<?xml version="1.0" encoding="utf-8"?>
<SwConfiguration xmlns="http://br-automation.co.at/AS/SwConfiguration" CpuAddress="SL1">
  <TaskClass Name="Cyclic#1" />
</SwConfiguration>
"#,
        )
        .unwrap();
        DeploymentTable::open(path).unwrap()
    }

    fn library_folder(dir: &Path, name: &str) -> PathBuf {
        let folder = dir.join("Libraries");
        let lib = folder.join(name);
        fs::create_dir_all(&lib).unwrap();
        fs::write(
            lib.join("IEC.lby"),
            "<Library xmlns=\"http://br-automation.co.at/AS/Library\" />",
        )
        .unwrap();
        folder
    }

    #[test]
    fn test_open_repairs_skeleton() {
        let tmp = TempDir::new().unwrap();
        let table = empty_table(tmp.path());

        let doc = Document::load(table.path()).unwrap();
        let names: Vec<_> = doc
            .root
            .children
            .iter()
            .map(|c| (c.name.clone(), c.attr("Name").map(str::to_string)))
            .collect();

        assert_eq!(names.len(), TASK_CLASS_COUNT + 1);
        for (index, (tag, name)) in names.iter().take(TASK_CLASS_COUNT).enumerate() {
            assert_eq!(tag, "TaskClass");
            assert_eq!(name.as_deref(), Some(format!("Cyclic#{}", index + 1).as_str()));
        }
        assert_eq!(names[TASK_CLASS_COUNT].0, "Libraries");
    }

    #[test]
    fn test_deploy_library_is_case_insensitively_idempotent() {
        let tmp = TempDir::new().unwrap();
        let mut table = empty_table(tmp.path());
        let folder = library_folder(tmp.path(), "Comms");

        table.deploy_library(&folder, "Comms", &[]).unwrap();
        table.deploy_library(&folder, "COMMS", &[]).unwrap();

        assert_eq!(table.libraries(), vec!["Comms"]);

        let doc = Document::load(table.path()).unwrap();
        let entries = doc.find_all(&["Libraries", "LibraryObject"]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].attr("Source"), Some("Libraries.Libraries.Comms.lby"));
        assert_eq!(entries[0].attr("Language"), Some("IEC"));
        assert_eq!(entries[0].attr("Memory"), Some("UserROM"));
    }

    #[test]
    fn test_deploy_library_overrides() {
        let tmp = TempDir::new().unwrap();
        let mut table = empty_table(tmp.path());
        let folder = library_folder(tmp.path(), "Comms");

        table
            .deploy_library(&folder, "Comms", &[("Memory".into(), "UserRAM".into())])
            .unwrap();

        let doc = Document::load(table.path()).unwrap();
        let entries = doc.find_all(&["Libraries", "LibraryObject"]);
        assert_eq!(entries[0].attr("Memory"), Some("UserRAM"));
    }

    #[test]
    fn test_deploy_task_truncates_name() {
        let tmp = TempDir::new().unwrap();
        let mut table = empty_table(tmp.path());

        let logical = tmp.path().join("Logical");
        fs::create_dir_all(logical.join("Tasks/VeryLongTaskName123")).unwrap();
        fs::write(
            logical.join("Tasks/VeryLongTaskName123/ANSIC.prg"),
            "<Program />",
        )
        .unwrap();

        table
            .deploy_task(&logical, "Tasks", "VeryLongTaskName123", "Cyclic#3")
            .unwrap();

        let doc = Document::load(table.path()).unwrap();
        let class = doc.root.child_with_attr("TaskClass", "Name", "Cyclic#3").unwrap();
        let tasks: Vec<_> = class.children_named("Task").collect();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].attr("Name"), Some("VeryLongTa"));
        assert_eq!(tasks[0].attr("Source"), Some("Tasks.VeryLongTaskName123.prg"));
        assert_eq!(tasks[0].attr("Language"), Some("ANSIC"));

        // Other classes stay empty.
        let first = doc.root.child_with_attr("TaskClass", "Name", "Cyclic#1").unwrap();
        assert_eq!(first.children_named("Task").count(), 0);
    }

    #[test]
    fn test_deploy_task_idempotent_on_truncated_name() {
        let tmp = TempDir::new().unwrap();
        let mut table = empty_table(tmp.path());
        let logical = tmp.path().join("Logical");
        fs::create_dir_all(logical.join("Tasks/VeryLongTaskName123")).unwrap();

        table
            .deploy_task(&logical, "Tasks", "VeryLongTaskName123", "Cyclic#3")
            .unwrap();
        // A second task sharing the first ten characters collides.
        table
            .deploy_task(&logical, "Tasks", "VeryLongTaskName456", "Cyclic#3")
            .unwrap();

        let doc = Document::load(table.path()).unwrap();
        let class = doc.root.child_with_attr("TaskClass", "Name", "Cyclic#3").unwrap();
        assert_eq!(class.children_named("Task").count(), 1);
    }

    #[test]
    fn test_deploy_task_unknown_class() {
        let tmp = TempDir::new().unwrap();
        let mut table = empty_table(tmp.path());

        let err = table
            .deploy_task(tmp.path(), "Tasks", "T", "Background")
            .unwrap_err();
        assert!(matches!(err, Error::Structure { .. }));
    }
}
