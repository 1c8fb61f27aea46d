//! Library manifests.
//!
//! A library is a package whose directory carries a language manifest
//! (`ANSIC.lby`, `IEC.lby`, or `Binary.lby`). Its object list is tagged
//! either `Files` (legacy) or `Objects` (current IDE convention); the IDE
//! rewrites a mismatched form on every touch, so the list is migrated
//! atomically the moment a sub-package forces the `Objects` form.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::build_config::{BuildConfig, TargetClass};
use crate::core::dependency::Dependency;
use crate::core::error::{Error, Result};
use crate::core::object::{self, library_language, Language, ObjectKind, ObjectRef};
use crate::util;
use crate::xml::{Document, Element};

/// Default namespace of library manifests.
pub const LIBRARY_NAMESPACE: &str = "http://br-automation.co.at/AS/Library";

/// Reserved source-group folder names never recorded in the object list.
pub const SOURCE_GROUP_FOLDERS: [&str; 3] = ["SG4", "SG3", "SGC"];

/// Entries stripped from every export (IDE-external tooling).
pub const SOURCE_EXPORT_EXCLUDES: &[&str] =
    &[".git", ".vscode", ".gitignore", "jenkinsfile", "CMakeLists.txt"];

/// Entries stripped from a binary export: tooling plus the compiled-language
/// sources that the shipped artifacts replace.
pub const BINARY_EXPORT_EXCLUDES: &[&str] = &[
    ".c",
    ".st",
    ".cpp",
    ".git",
    ".vscode",
    ".gitignore",
    "jenkinsfile",
    "CMakeLists.txt",
];

/// Which child tag the object list currently uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListTag {
    Files,
    Objects,
}

impl ListTag {
    fn as_str(self) -> &'static str {
        match self {
            ListTag::Files => "Files",
            ListTag::Objects => "Objects",
        }
    }

    fn child_str(self) -> &'static str {
        match self {
            ListTag::Files => "File",
            ListTag::Objects => "Object",
        }
    }
}

/// A library manifest, bound to the directory it describes.
///
/// The list tag is detected once at load and cached; reopening is the
/// staleness boundary for external edits.
#[derive(Debug, Clone)]
pub struct Library {
    doc: Document,
    name: String,
    language: Language,
    list_tag: ListTag,
}

impl Library {
    /// Open a library from its directory or its manifest file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Library> {
        let mut path = path.into();
        if !path.exists() {
            return Err(Error::NotFound { path });
        }
        if path.is_dir() {
            let lang = library_language(&path).ok_or_else(|| Error::NotFound {
                path: path.clone(),
            })?;
            path = path.join(lang.library_manifest());
        }

        let language = match path.file_stem().and_then(|s| s.to_str()) {
            Some("ANSIC") => Language::AnsiC,
            Some("IEC") => Language::Iec,
            Some("Binary") => Language::Binary,
            _ => return Err(Error::structure(&path, "unrecognized library manifest name")),
        };

        let doc = Document::load(path)?;
        // Library name is the folder name.
        let name = doc
            .dir_path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let list_tag = detect_list_tag(&doc);

        Ok(Library {
            doc,
            name,
            language,
            list_tag,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source language, `Binary` for a compiled-artifact library.
    pub fn language(&self) -> Language {
        self.language
    }

    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    pub fn dir_path(&self) -> &Path {
        self.doc.dir_path()
    }

    /// Library version, `"0"` when the manifest carries none.
    pub fn version(&self) -> &str {
        self.doc.root.attr("Version").unwrap_or("0")
    }

    pub fn description(&self) -> &str {
        self.doc.root.attr("Description").unwrap_or("")
    }

    /// Mark the manifest (used after collecting a binary export).
    pub fn set_sub_type(&mut self, sub_type: &str) {
        self.doc.root.set_attr("SubType", sub_type);
    }

    /// Parsed file/object entries, in manifest order.
    pub fn file_entries(&self) -> Vec<ObjectRef> {
        self.doc
            .find_all(&[self.list_tag.as_str(), self.list_tag.child_str()])
            .into_iter()
            .map(ObjectRef::from_element)
            .collect()
    }

    /// Declared dependencies, in manifest order.
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.doc
            .find_all(&["Dependencies", "Dependency"])
            .into_iter()
            .map(Dependency::from_element)
            .collect()
    }

    /// Names of all declared dependencies.
    pub fn dependency_names(&self) -> Vec<String> {
        self.dependencies().into_iter().map(|d| d.name).collect()
    }

    /// Add or update a dependency declaration and write the manifest.
    pub fn add_dependency(&mut self, dep: Dependency) -> Result<()> {
        if self.doc.find(&["Dependencies"]).is_none() {
            self.doc.root.push(Element::new("Dependencies"));
        }
        let path = self.doc.path().to_path_buf();
        let deps = self
            .doc
            .find_mut(&["Dependencies"])
            .ok_or_else(|| Error::structure(&path, "manifest has no dependency list"))?;

        let existing = deps
            .children
            .iter()
            .position(|c| c.name == "Dependency" && c.attr("ObjectName") == Some(dep.name.as_str()));
        match existing {
            Some(index) => deps.children[index] = dep.to_element(),
            None => deps.push(dep.to_element()),
        }
        self.doc.write()
    }

    /// Copy a file or folder into the library directory and record it in
    /// the object list, migrating a legacy `Files` list to `Objects` when
    /// a sub-package arrives.
    pub fn add_object(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }

        let name = path.file_name().ok_or_else(|| Error::NotFound {
            path: path.to_path_buf(),
        })?;
        let target = self.dir_path().join(name);

        if path.parent() != Some(self.dir_path()) {
            if path.is_file() {
                fs::copy(path, &target).map_err(|e| Error::io(path, e))?;
            } else {
                util::fs::copy_dir_all(path, &target)?;
            }
        }

        self.append_entry(&target)?;
        self.doc.write()
    }

    /// Reconcile the object list against the directory. Stale entries are
    /// dropped; unrepresented items are appended in enumeration order,
    /// except manifest files (`.lby`) and the reserved source-group
    /// folders.
    pub fn synchronize(&mut self) -> Result<()> {
        let dir = self.dir_path().to_path_buf();
        let items = list_dir(&dir)?;

        let list = self.list_mut()?;
        let mut used: Vec<String> = Vec::new();
        list.retain_children(|entry| {
            let name = entry.text_trimmed().to_string();
            let keep = items.contains(&name);
            if keep {
                used.push(name);
            }
            keep
        });

        for item in &items {
            if used.contains(item)
                || item.to_lowercase().ends_with(".lby")
                || SOURCE_GROUP_FOLDERS.contains(&item.as_str())
            {
                continue;
            }
            match self.append_entry(&dir.join(item)) {
                Ok(()) => {}
                Err(err) => tracing::debug!("skipping {item} during synchronize: {err}"),
            }
        }

        self.doc.write()
    }

    /// Destination directory for an export of this library.
    pub fn export_dest(&self, dest: &Path, include_version: bool) -> PathBuf {
        let mut path = dest.join(&self.name);
        if include_version {
            path = path.join(format!("V{}", self.version()));
        }
        path
    }

    /// Copy the library as source into `dest`, excluding external tooling.
    pub fn collect_source(&self, dest: &Path) -> Result<()> {
        util::fs::copy_dir_filtered(self.dir_path(), dest, SOURCE_EXPORT_EXCLUDES, false)
    }

    /// Collect the library as a binary export into `dest`: the reduced
    /// source subset, then the compiled artifacts for each present build
    /// target class (first configuration of a class wins), then the
    /// manifest renamed to `Binary.lby`, marked and re-synchronized.
    pub fn collect_binary(
        &self,
        build_folder: &Path,
        dest: &Path,
        configs: &[BuildConfig],
    ) -> Result<()> {
        util::fs::copy_dir_filtered(self.dir_path(), dest, BINARY_EXPORT_EXCLUDES, true)?;

        let mut seen: Vec<TargetClass> = Vec::new();
        for config in configs {
            if seen.contains(&config.target) {
                continue;
            }
            seen.push(config.target);

            let artifact_dir = match config.target {
                TargetClass::Sg4 => dest.join("SG4"),
                TargetClass::Sg4Arm => dest.join("SG4").join("Arm"),
            };
            self.collect_config_binary(build_folder, config, &artifact_dir)?;
        }

        let manifest = dest.join(self.language.library_manifest());
        let binary_manifest = dest.join(Language::Binary.library_manifest());
        fs::rename(&manifest, &binary_manifest).map_err(|e| Error::io(&manifest, e))?;

        let mut exported = Library::open(binary_manifest)?;
        exported.set_sub_type("Binary");
        exported.synchronize()
    }

    /// Copy the three artifacts the build leaves behind for one
    /// configuration: the object, the header, and the archive.
    fn collect_config_binary(
        &self,
        build_folder: &Path,
        config: &BuildConfig,
        dest: &Path,
    ) -> Result<()> {
        let objects = build_folder
            .join("Objects")
            .join(&config.name)
            .join(&config.hardware);
        let archives = build_folder
            .join("Archives")
            .join(&config.name)
            .join(&config.hardware);

        util::fs::copy_file_into(&objects.join(format!("{}.br", self.name)), dest)?;
        util::fs::copy_file_into(&build_folder.join("Includes").join(format!("{}.h", self.name)), dest)?;
        util::fs::copy_file_into(&archives.join(format!("lib{}.a", self.name)), dest)?;
        Ok(())
    }

    /// Append an inferred entry for an on-disk path, migrating the list
    /// form if the entry is a sub-package.
    fn append_entry(&mut self, path: &Path) -> Result<()> {
        let elem = object::element_for_path(path, self.list_tag.child_str(), false)?;
        let is_package = elem.attr("Type") == Some(ObjectKind::Package.as_str());

        self.list_mut()?.push(elem);
        if is_package && self.list_tag != ListTag::Objects {
            self.convert_list_to_objects();
        }
        Ok(())
    }

    /// Retag the whole list from `Files` to `Objects`: the list element,
    /// every child, and a synthesized `Type="File"` on children that carry
    /// no kind. The tag names move together; no child is left as a bare
    /// `File`.
    fn convert_list_to_objects(&mut self) {
        while let Some(list) = self.doc.find_mut(&["Files"]) {
            list.name = "Objects".to_string();
            for child in &mut list.children {
                child.name = "Object".to_string();
                if child.attr("Type").is_none() {
                    child.set_attr("Type", "File");
                }
            }
        }
        self.list_tag = ListTag::Objects;
    }

    fn list_mut(&mut self) -> Result<&mut Element> {
        let path = self.doc.path().to_path_buf();
        let tag = self.list_tag.as_str();
        self.doc
            .find_mut(&[tag])
            .ok_or_else(|| Error::structure(&path, "manifest has no object list"))
    }
}

fn detect_list_tag(doc: &Document) -> ListTag {
    for child in &doc.root.children {
        match child.name.as_str() {
            "Objects" => return ListTag::Objects,
            "Files" => return ListTag::Files,
            _ => {}
        }
    }
    // No list at all; legacy form is the default assumption.
    ListTag::Files
}

fn list_dir(dir: &Path) -> Result<Vec<String>> {
    let mut items = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        items.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(items)
}
