//! Package manifests.
//!
//! A package manifest (`Package.pkg`) lists a folder's contents as ordered
//! object references. The invariant is that every non-reference entry names
//! an existing filesystem entry in the package directory;
//! [`synchronize`](Package::synchronize) restores it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Error, Result};
use crate::core::object::{self, ObjectRef};
use crate::util;
use crate::xml::{Document, Element};

/// Default namespace of package manifests.
pub const PACKAGE_NAMESPACE: &str = "http://br-automation.co.at/AS/Package";

/// Manifest filename of a plain package folder.
pub const PACKAGE_MANIFEST: &str = "Package.pkg";

/// A package manifest, bound to the directory it describes.
#[derive(Debug, Clone)]
pub struct Package {
    doc: Document,
}

impl Package {
    /// Open an existing manifest. A directory path implies its
    /// `Package.pkg`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Package> {
        let mut path = path.into();
        if path.is_dir() {
            path = path.join(PACKAGE_MANIFEST);
        }
        Ok(Package {
            doc: Document::load(path)?,
        })
    }

    /// Create a fresh, empty manifest for `dir` and write it out.
    pub fn create(dir: &Path) -> Result<Package> {
        let mut root = Element::new("Package");
        root.push(Element::new("Objects"));

        let doc = Document::new(dir.join(PACKAGE_MANIFEST), PACKAGE_NAMESPACE, root);
        doc.write()?;
        Ok(Package { doc })
    }

    /// Path of the manifest file.
    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    /// Directory this manifest describes.
    pub fn dir_path(&self) -> &Path {
        self.doc.dir_path()
    }

    /// Parsed object references, in manifest order. An absent object list
    /// reads as empty.
    pub fn objects(&self) -> Vec<ObjectRef> {
        self.doc
            .find_all(&["Objects", "Object"])
            .into_iter()
            .map(ObjectRef::from_element)
            .collect()
    }

    /// Copy a file or folder into the package (unless it is already inside,
    /// or added by reference) and record it in the manifest.
    pub fn add_object(&mut self, path: &Path, reference: bool) -> Result<()> {
        if !path.exists() {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }

        let name = path.file_name().ok_or_else(|| Error::NotFound {
            path: path.to_path_buf(),
        })?;
        let target = self.dir_path().join(name);

        if path.parent() != Some(self.dir_path()) && !reference {
            if path.is_file() {
                fs::copy(path, &target).map_err(|e| Error::io(path, e))?;
            } else {
                util::fs::copy_dir_all(path, &target)?;
            }
        }

        let elem = if reference {
            object::element_for_path(path, "Object", true)?
        } else {
            object::element_for_path(&target, "Object", false)?
        };
        self.objects_mut()?.push(elem);
        self.doc.write()
    }

    /// Create an empty sub-package: the directory, its entry in this
    /// manifest, and a fresh child manifest.
    pub fn add_empty_package(&mut self, name: &str) -> Result<Package> {
        let dir = self.dir_path().join(name);
        fs::create_dir(&dir).map_err(|e| Error::io(&dir, e))?;

        let elem = object::element_for_path(&dir, "Object", false)?;
        self.objects_mut()?.push(elem);
        self.doc.write()?;

        Package::create(&dir)
    }

    /// Remove a file or folder from the package directory and drop its
    /// manifest entry (exact name match).
    pub fn remove_object(&mut self, name: &str) -> Result<()> {
        let path = self.dir_path().join(name);
        if path.is_dir() {
            util::fs::force_remove_dir_all(&path)?;
        } else if path.is_file() {
            fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
        }

        self.objects_mut()?
            .retain_children(|c| c.text_trimmed() != name);
        self.doc.write()
    }

    /// Reconcile the manifest against the directory: drop entries whose
    /// target no longer exists, then append an inferred entry for every
    /// unrepresented directory item (the manifest file itself excluded),
    /// in filesystem enumeration order. Best-effort per item; one write at
    /// the end.
    pub fn synchronize(&mut self) -> Result<()> {
        let manifest_name = self
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let items = list_dir(self.dir_path())?;

        let objects = self.objects_mut()?;
        let mut used: Vec<String> = Vec::new();
        objects.retain_children(|obj| {
            let entry = ObjectRef::from_element(obj);
            // Reference entries point outside this directory and are not
            // reconciled against it.
            let keep = entry.is_reference || items.contains(&entry.name);
            if keep {
                used.push(entry.name);
            }
            keep
        });

        let dir = self.dir_path().to_path_buf();
        for item in &items {
            if *item == manifest_name || used.contains(item) {
                continue;
            }
            match object::element_for_path(&dir.join(item), "Object", false) {
                Ok(elem) => self.objects_mut()?.push(elem),
                Err(err) => tracing::debug!("skipping {item} during synchronize: {err}"),
            }
        }

        self.doc.write()
    }

    fn objects_mut(&mut self) -> Result<&mut Element> {
        let path = self.doc.path().to_path_buf();
        self.doc
            .find_mut(&["Objects"])
            .ok_or_else(|| Error::structure(&path, "manifest has no object list"))
    }
}

/// Directory entries in enumeration order.
fn list_dir(dir: &Path) -> Result<Vec<String>> {
    let mut items = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        items.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(items)
}
