//! Library dependency records.

use crate::xml::Element;

/// A declared dependency of a library on another library.
///
/// Version bounds are free-form strings as the IDE writes them; they are
/// carried verbatim and never semantically parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub min_version: String,
    pub max_version: String,
}

impl Dependency {
    /// Create a dependency with no version bounds.
    pub fn new(name: impl Into<String>) -> Self {
        Dependency {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style minimum version.
    pub fn with_min_version(mut self, version: impl Into<String>) -> Self {
        self.min_version = version.into();
        self
    }

    /// Builder-style maximum version.
    pub fn with_max_version(mut self, version: impl Into<String>) -> Self {
        self.max_version = version.into();
        self
    }

    /// Parse a `Dependency` manifest element.
    pub fn from_element(elem: &Element) -> Dependency {
        Dependency {
            name: elem.attr("ObjectName").unwrap_or("Unknown").to_string(),
            min_version: elem.attr("FromVersion").unwrap_or("").to_string(),
            max_version: elem.attr("ToVersion").unwrap_or("").to_string(),
        }
    }

    /// Build the manifest element for this dependency. Empty bounds are
    /// omitted, as the IDE does.
    pub fn to_element(&self) -> Element {
        let mut elem = Element::new("Dependency").with_attr("ObjectName", &self.name);
        if !self.min_version.is_empty() {
            elem.set_attr("FromVersion", &self.min_version);
        }
        if !self.max_version.is_empty() {
            elem.set_attr("ToVersion", &self.max_version);
        }
        elem
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.min_version.is_empty() || !self.max_version.is_empty() {
            write!(f, " [{} .. {}]", self.min_version, self.max_version)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_round_trip() {
        let dep = Dependency::new("AsBrStr").with_min_version("1.0.0");
        let elem = dep.to_element();

        assert_eq!(elem.attr("ObjectName"), Some("AsBrStr"));
        assert_eq!(elem.attr("FromVersion"), Some("1.0.0"));
        assert_eq!(elem.attr("ToVersion"), None);

        assert_eq!(Dependency::from_element(&elem), dep);
    }

    #[test]
    fn test_missing_attributes_default() {
        let dep = Dependency::from_element(&Element::new("Dependency"));
        assert_eq!(dep.name, "Unknown");
        assert_eq!(dep.min_version, "");
    }
}
