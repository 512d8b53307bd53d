//! The generic document tree handed over by the file reader.
//!
//! Reading and decompressing `.dia` files is not this crate's job: the
//! reader walks the XML, decodes attribute values into an `AttributeMap`,
//! and produces one `DocNode` per element of interest. `build` turns that
//! tree into a `Diagram`.

use crate::attributes::AttributeMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The element kinds the builder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocTag {
    Diagram,
    DiagramData,
    Layer,
    Group,
    Object,
}

impl DocTag {
    /// Classify a raw tag. A `dia:` namespace prefix is ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let local = name.strip_prefix("dia:").unwrap_or(name);
        match local {
            "diagram" => Some(Self::Diagram),
            "diagramdata" => Some(Self::DiagramData),
            "layer" => Some(Self::Layer),
            "group" => Some(Self::Group),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Diagram => "diagram",
            Self::DiagramData => "diagramdata",
            Self::Layer => "layer",
            Self::Group => "group",
            Self::Object => "object",
        }
    }
}

/// A connection exactly as read: all three fields are raw strings and any
/// of them may be missing. The builder validates them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConnection {
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub connection: Option<String>,
}

impl RawConnection {
    pub fn new(handle: &str, to: &str, connection: &str) -> Self {
        Self {
            handle: Some(handle.to_owned()),
            to: Some(to.to_owned()),
            connection: Some(connection.to_owned()),
        }
    }
}

/// One node of the reader's tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocNode {
    /// Element name: `diagram`, `diagramdata`, `layer`, `group`, `object`.
    pub tag: String,

    /// The element's own string fields (`id`, `type`, `version`, `name`,
    /// `visible`, ...).
    #[serde(default)]
    pub props: HashMap<String, String>,

    /// Decoded `<attribute>` children.
    #[serde(default)]
    pub attributes: AttributeMap,

    /// `<connections>` entries (objects only).
    #[serde(default)]
    pub connections: Vec<RawConnection>,

    /// Nested elements in document order.
    #[serde(default)]
    pub children: Vec<DocNode>,
}

impl DocNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Shorthand for an `object` node with the given id and type.
    pub fn object(id: &str, type_name: &str) -> Self {
        Self::new("object").with_prop("id", id).with_prop("type", type_name)
    }

    /// Shorthand for a visible, connectable `layer` node.
    pub fn layer(name: &str) -> Self {
        Self::new("layer")
            .with_prop("name", name)
            .with_prop("visible", "true")
            .with_prop("connectable", "true")
    }

    #[must_use]
    pub fn with_prop(mut self, key: &str, value: &str) -> Self {
        self.props.insert(key.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: AttributeMap) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_connection(mut self, connection: RawConnection) -> Self {
        self.connections.push(connection);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: DocNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn doc_tag(&self) -> Option<DocTag> {
        DocTag::from_name(&self.tag)
    }

    pub fn prop(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(String::as_str)
    }
}
