//! Fixture builders for synthetic project trees.
//!
//! These lay down the minimal on-disk shape the IDE produces: a project
//! file, the fixed subtrees, library manifests, configuration folders,
//! and the build artifacts a finished build leaves under `Temp`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::xml::{Document, Element};

const PROJECT_FILE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<?AutomationStudio Version="4.6.3.55 SP"?>
<Project xmlns="http://br-automation.co.at/AS/Project" />
"#;

/// A synthetic project rooted in a caller-owned directory.
pub struct ProjectFixture {
    root: PathBuf,
    name: String,
}

impl ProjectFixture {
    /// Create the project skeleton: `.apj` file plus the four fixed
    /// subtrees.
    pub fn new(root: &Path, name: &str) -> ProjectFixture {
        fs::write(root.join(format!("{name}.apj")), PROJECT_FILE).unwrap();
        for dir in ["Logical", "Physical", "Temp", "Binaries"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        ProjectFixture {
            root: root.to_path_buf(),
            name: name.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_file(&self) -> PathBuf {
        self.root.join(format!("{}.apj", self.name))
    }

    /// Add an IEC library under `Logical/<folder>/<name>` with one source
    /// file and the given dependencies.
    pub fn add_library(&self, folder: &str, name: &str, deps: &[&str]) -> PathBuf {
        let dir = self.root.join("Logical").join(folder).join(name);
        self.write_library(&dir, deps);
        dir
    }

    /// Add a library outside the `Logical` tree (for reference entries).
    pub fn add_external_library(&self, relative: &str) -> PathBuf {
        let dir = self.root.join(relative);
        self.write_library(&dir, &[]);
        dir
    }

    fn write_library(&self, dir: &Path, deps: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("main.st"), "(* source *)\n").unwrap();

        let mut root = Element::new("Library")
            .with_attr("Version", "1.0.0")
            .with_attr("Description", "Test library");
        let mut files = Element::new("Files");
        files.push(Element::new("File").with_text("main.st"));
        root.push(files);
        if !deps.is_empty() {
            let mut dependencies = Element::new("Dependencies");
            for dep in deps {
                dependencies.push(Element::new("Dependency").with_attr("ObjectName", *dep));
            }
            root.push(dependencies);
        }

        Document::new(
            dir.join("IEC.lby"),
            "http://br-automation.co.at/AS/Library",
            root,
        )
        .write()
        .unwrap();
    }

    /// Add a package manifest under `Logical/<folder>` whose only entry
    /// references a library outside the walked subtree.
    pub fn add_reference_package(&self, folder: &str, target_relative: &str) {
        let dir = self.root.join("Logical").join(folder);
        fs::create_dir_all(&dir).unwrap();

        let mut objects = Element::new("Objects");
        objects.push(
            Element::new("Object")
                .with_attr("Type", "Library")
                .with_attr("Language", "IEC")
                .with_attr("Reference", "true")
                .with_text(target_relative),
        );
        let mut root = Element::new("Package");
        root.push(objects);

        Document::new(
            dir.join("Package.pkg"),
            "http://br-automation.co.at/AS/Package",
            root,
        )
        .write()
        .unwrap();
    }

    /// Declare a build configuration: its `Physical.pkg` entry, its
    /// hardware folder, and a minimal `Hardware.hw`.
    pub fn add_config(&self, name: &str, hardware: &str) {
        let physical = self.root.join("Physical");
        let manifest = physical.join("Physical.pkg");

        let mut doc = if manifest.exists() {
            Document::load(&manifest).unwrap()
        } else {
            let mut root = Element::new("Physical");
            root.push(Element::new("Objects"));
            Document::new(&manifest, "http://br-automation.co.at/AS/Physical", root)
        };
        doc.find_mut(&["Objects"])
            .unwrap()
            .push(Element::new("Object").with_attr("Type", "Configuration").with_text(name));
        doc.write().unwrap();

        let config_dir = physical.join(name);
        fs::create_dir_all(config_dir.join(hardware)).unwrap();

        let mut module = Element::new("Module")
            .with_attr("Name", hardware)
            .with_attr("Type", hardware);
        module.push(
            Element::new("Parameter")
                .with_attr("ID", "ConfigurationID")
                .with_attr("Value", name),
        );
        let mut hw_root = Element::new("Hardware");
        hw_root.push(module);
        Document::new(
            config_dir.join("Hardware.hw"),
            "http://br-automation.co.at/AS/Hardware",
            hw_root,
        )
        .write()
        .unwrap();
    }

    /// Lay down the artifacts a build leaves under `Temp` for one library
    /// in one configuration.
    pub fn add_build_artifacts(&self, config: &str, hardware: &str, lib: &str) {
        let temp = self.root.join("Temp");
        let objects = temp.join("Objects").join(config).join(hardware);
        let archives = temp.join("Archives").join(config).join(hardware);
        let includes = temp.join("Includes");
        fs::create_dir_all(&objects).unwrap();
        fs::create_dir_all(&archives).unwrap();
        fs::create_dir_all(&includes).unwrap();

        fs::write(objects.join(format!("{lib}.br")), "object").unwrap();
        fs::write(includes.join(format!("{lib}.h")), "header").unwrap();
        fs::write(archives.join(format!("lib{lib}.a")), "archive").unwrap();
    }
}
