//! Read/write object layer over the IDE's namespaced XML dialect.

pub mod document;
pub mod element;

pub use document::Document;
pub use element::Element;
