//! Object-reference kinds and manifest classification.
//!
//! Every entry in a package or library manifest names a child file/folder
//! and its kind. The kind of an on-disk entry is decided by one
//! classification function that sniffs the directory for the IDE's known
//! manifest filenames.

use std::path::Path;

use crate::core::error::{Error, Result};
use crate::xml::Element;

/// Kind of an object reference in a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A folder with its own `Package.pkg` manifest.
    Package,
    /// A folder containing a program manifest (`*.prg`).
    Program,
    /// A folder containing a library manifest (`*.lby`).
    Library,
    /// A plain file.
    File,
    /// A build configuration folder (physical tree only).
    Configuration,
}

impl ObjectKind {
    /// Manifest attribute spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Package => "Package",
            ObjectKind::Program => "Program",
            ObjectKind::Library => "Library",
            ObjectKind::File => "File",
            ObjectKind::Configuration => "Configuration",
        }
    }

    /// Parse a `Type` attribute value, case-insensitively.
    pub fn from_attr(value: &str) -> Option<ObjectKind> {
        match value.to_ascii_lowercase().as_str() {
            "package" => Some(ObjectKind::Package),
            "program" => Some(ObjectKind::Program),
            "library" => Some(ObjectKind::Library),
            "file" => Some(ObjectKind::File),
            "configuration" => Some(ObjectKind::Configuration),
            _ => None,
        }
    }
}

/// Source language of a library or program, as encoded in its manifest
/// filename (`ANSIC.lby`, `IEC.prg`, ...). `Binary` marks a unit shipped
/// as compiled artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    AnsiC,
    Iec,
    Binary,
}

impl Language {
    const ALL: [Language; 3] = [Language::AnsiC, Language::Iec, Language::Binary];

    /// Manifest spelling of the language.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::AnsiC => "ANSIC",
            Language::Iec => "IEC",
            Language::Binary => "Binary",
        }
    }

    /// Library manifest filename for this language.
    pub fn library_manifest(&self) -> String {
        format!("{}.lby", self.as_str())
    }

    /// Program manifest filename for this language.
    pub fn program_manifest(&self) -> String {
        format!("{}.prg", self.as_str())
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language of the library manifest in `dir`, if any.
pub fn library_language(dir: &Path) -> Option<Language> {
    Language::ALL
        .into_iter()
        .find(|lang| dir.join(lang.library_manifest()).is_file())
}

/// Language of the program manifest in `dir`, if any.
pub fn program_language(dir: &Path) -> Option<Language> {
    Language::ALL
        .into_iter()
        .find(|lang| dir.join(lang.program_manifest()).is_file())
}

/// Classify an on-disk entry into its manifest kind.
///
/// A directory containing a library manifest is a Library, one containing
/// a program manifest is a Program, any other directory is a Package, and
/// a plain file is a File.
pub fn object_kind(path: &Path) -> Result<ObjectKind> {
    if !path.exists() {
        return Err(Error::NotFound {
            path: path.to_path_buf(),
        });
    }

    if path.is_dir() {
        if library_language(path).is_some() {
            Ok(ObjectKind::Library)
        } else if program_language(path).is_some() {
            Ok(ObjectKind::Program)
        } else {
            Ok(ObjectKind::Package)
        }
    } else {
        Ok(ObjectKind::File)
    }
}

/// A parsed object-reference entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    /// Entry name; for reference objects this is a path to the target.
    pub name: String,
    pub kind: ObjectKind,
    pub language: Option<Language>,
    /// Whether the entry points outside its manifest's directory.
    pub is_reference: bool,
}

impl ObjectRef {
    /// Parse a manifest element. Entries without a recognizable `Type`
    /// attribute read as plain files (the legacy `Files` list carries no
    /// kind at all).
    pub fn from_element(elem: &Element) -> ObjectRef {
        let kind = elem
            .attr("Type")
            .and_then(ObjectKind::from_attr)
            .unwrap_or(ObjectKind::File);
        let language = elem.attr("Language").and_then(|lang| {
            Language::ALL.into_iter().find(|l| l.as_str().eq_ignore_ascii_case(lang))
        });
        let is_reference = elem
            .attr("Reference")
            .map(|r| r.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        ObjectRef {
            name: elem.text_trimmed().to_string(),
            kind,
            language,
            is_reference,
        }
    }
}

/// Build a manifest element for an on-disk entry, inferring kind and
/// language. `tag` is the child tag of the surrounding list (`Object` or
/// the legacy `File`).
pub fn element_for_path(path: &Path, tag: &str, reference: bool) -> Result<Element> {
    let kind = object_kind(path)?;
    let mut elem = Element::new(tag);

    if reference {
        elem.set_attr("Reference", "true");
    }
    elem.set_attr("Type", kind.as_str());
    match kind {
        ObjectKind::Library => {
            if let Some(lang) = library_language(path) {
                elem.set_attr("Language", lang.as_str());
            }
        }
        ObjectKind::Program => {
            if let Some(lang) = program_language(path) {
                elem.set_attr("Language", lang.as_str());
            }
        }
        _ => {}
    }

    elem.text = Some(if reference {
        path.to_string_lossy().into_owned()
    } else {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    Ok(elem)
}
