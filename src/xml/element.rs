//! Mutable element tree for the IDE's XML dialect.
//!
//! Elements carry local (unqualified) tag names; the document's default
//! namespace lives on [`Document`](crate::xml::Document) and is reapplied
//! at serialization time.

/// A single XML element: local name, ordered attributes, optional text,
/// ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Local tag name, without any namespace qualification.
    pub name: String,

    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,

    /// Text content, if any. Whitespace-only text is dropped at parse time;
    /// indentation is regenerated on write.
    pub text: Option<String>,

    /// Child elements in document order.
    pub children: Vec<Element>,
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style text setter.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Get an attribute value.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any existing value and otherwise
    /// appending to the end of the attribute list.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Text content with surrounding whitespace trimmed, or `""`.
    pub fn text_trimmed(&self) -> &str {
        self.text.as_deref().map(str::trim).unwrap_or("")
    }

    /// First child with the given tag name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First child with the given tag name, mutable.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// All children with the given tag name, in document order.
    pub fn children_named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a Element> + 'n
    where
        'a: 'n,
    {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First child with the given tag name and attribute value.
    pub fn child_with_attr(&self, name: &str, key: &str, value: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|c| c.name == name && c.attr(key) == Some(value))
    }

    /// Mutable variant of [`child_with_attr`](Self::child_with_attr).
    pub fn child_with_attr_mut(&mut self, name: &str, key: &str, value: &str) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .find(|c| c.name == name && c.attr(key) == Some(value))
    }

    /// Append a child element.
    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Insert a child element at a fixed position, clamped to the end.
    pub fn insert(&mut self, index: usize, child: Element) {
        let index = index.min(self.children.len());
        self.children.insert(index, child);
    }

    /// Drop children for which the predicate returns `false`.
    pub fn retain_children<F>(&mut self, f: F)
    where
        F: FnMut(&Element) -> bool,
    {
        self.children.retain(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_set_and_replace() {
        let mut elem = Element::new("Object").with_attr("Type", "File");
        assert_eq!(elem.attr("Type"), Some("File"));

        elem.set_attr("Type", "Package");
        assert_eq!(elem.attr("Type"), Some("Package"));
        assert_eq!(elem.attributes.len(), 1);
    }

    #[test]
    fn test_child_lookup_by_attr() {
        let mut root = Element::new("Root");
        root.push(Element::new("TaskClass").with_attr("Name", "Cyclic#1"));
        root.push(Element::new("TaskClass").with_attr("Name", "Cyclic#2"));

        let tc = root.child_with_attr("TaskClass", "Name", "Cyclic#2").unwrap();
        assert_eq!(tc.attr("Name"), Some("Cyclic#2"));
        assert!(root.child_with_attr("TaskClass", "Name", "Cyclic#9").is_none());
    }

    #[test]
    fn test_insert_clamps_to_end() {
        let mut root = Element::new("Root");
        root.push(Element::new("A"));
        root.insert(10, Element::new("B"));
        assert_eq!(root.children[1].name, "B");
    }
}
