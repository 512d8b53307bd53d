//! Owned diagram elements, as produced by the construction pass.
//!
//! Layers and groups own their children outright. Once the layers are
//! handed to [`Diagram::new`](crate::diagram::Diagram::new) they are moved
//! into the diagram's arena and only reachable through borrowed handles.

use crate::attributes::{AttrValue, AttributeMap};
use crate::id::ObjectId;
use crate::line::LineKind;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Connections ─────────────────────────────────────────────────────────

/// Which point on the target object a connection is attached to.
/// Carried through, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionPoint {
    Index(u32),
    Token(String),
}

impl ConnectionPoint {
    /// Numeric points become `Index`, anything else is kept verbatim.
    pub fn parse(raw: &str) -> Self {
        raw.parse()
            .map_or_else(|_| Self::Token(raw.to_owned()), Self::Index)
    }
}

/// A reference from one of an object's handles to another object, by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Attachment point on the owning object.
    pub handle: u32,
    /// The target object's id, resolved through the diagram on demand.
    pub to: ObjectId,
    pub point: Option<ConnectionPoint>,
}

impl Connection {
    pub fn new(handle: u32, to: impl Into<ObjectId>) -> Self {
        Self {
            handle,
            to: to.into(),
            point: None,
        }
    }

    #[must_use]
    pub fn at_point(mut self, point: ConnectionPoint) -> Self {
        self.point = Some(point);
        self
    }
}

// ─── Objects ─────────────────────────────────────────────────────────────

/// A leaf element: a box, a text, a line, ...
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    id: ObjectId,
    type_name: String,
    version: String,
    attributes: AttributeMap,
    /// Unique per handle, kept in first-seen order.
    connections: SmallVec<[Connection; 2]>,
    /// Derived from `attributes`; recomputed whenever they are replaced.
    line_kind: Option<LineKind>,
}

impl Object {
    pub fn new(id: impl Into<ObjectId>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            version: String::new(),
            attributes: AttributeMap::new(),
            connections: SmallVec::new(),
            line_kind: None,
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: AttributeMap) -> Self {
        self.line_kind = LineKind::classify(&attributes);
        self.attributes = attributes;
        self
    }

    /// Add a connection. A second connection on the same handle replaces
    /// the first one in place.
    #[must_use]
    pub fn with_connection(mut self, connection: Connection) -> Self {
        match self
            .connections
            .iter_mut()
            .find(|c| c.handle == connection.handle)
        {
            Some(existing) => *existing = connection,
            None => self.connections.push(connection),
        }
        self
    }

    #[must_use]
    pub fn with_connections(self, connections: impl IntoIterator<Item = Connection>) -> Self {
        connections
            .into_iter()
            .fold(self, |obj, conn| obj.with_connection(conn))
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Free-form type tag, e.g. `"Flowchart - Box"`.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection(&self, handle: u32) -> Option<&Connection> {
        self.connections.iter().find(|c| c.handle == handle)
    }

    /// The `text.string` attribute. Dia wraps strings in `#...#`; the
    /// markers are stripped when the string starts and ends with `#`, so a
    /// lone `"#"` reads as empty.
    pub fn text(&self) -> Option<&str> {
        let raw = self
            .attributes
            .get_path("text.string")
            .and_then(AttrValue::as_str)?;
        if raw.starts_with('#') && raw.ends_with('#') {
            Some(raw.get(1..raw.len() - 1).unwrap_or_default())
        } else {
            Some(raw)
        }
    }

    pub fn line_kind(&self) -> Option<LineKind> {
        self.line_kind
    }

    pub fn is_line(&self) -> bool {
        self.line_kind.is_some()
    }
}

// ─── Containers ──────────────────────────────────────────────────────────

/// A direct child of a layer or group.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Object(Object),
    Group(Group),
}

impl From<Object> for Child {
    fn from(obj: Object) -> Self {
        Child::Object(obj)
    }
}

impl From<Group> for Child {
    fn from(group: Group) -> Self {
        Child::Group(group)
    }
}

/// An anonymous container of objects and nested groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub attributes: AttributeMap,
    pub children: Vec<Child>,
}

impl Group {
    pub fn new(children: impl IntoIterator<Item = Child>) -> Self {
        Self {
            attributes: AttributeMap::new(),
            children: children.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: AttributeMap) -> Self {
        self.attributes = attributes;
        self
    }
}

/// A named top-level container.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub visible: bool,
    pub connectable: bool,
    pub active: bool,
    pub children: Vec<Child>,
}

impl Layer {
    /// A visible, connectable, inactive layer.
    pub fn new(name: impl Into<String>, children: impl IntoIterator<Item = Child>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            connectable: true,
            active: false,
            children: children.into_iter().collect(),
        }
    }
}

/// Diagram-wide settings (`<diagramdata>`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramData {
    pub attributes: AttributeMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_text(s: &str) -> Object {
        Object::new("123", "Testing").with_attributes(
            AttributeMap::new().with("text", AttributeMap::new().with("string", s)),
        )
    }

    #[test]
    fn text_strips_markers() {
        assert_eq!(with_text("#hello world#").text(), Some("hello world"));
    }

    #[test]
    fn text_without_markers_is_raw() {
        assert_eq!(with_text("hello world").text(), Some("hello world"));
        assert_eq!(with_text("#only leading").text(), Some("#only leading"));
    }

    #[test]
    fn lone_marker_reads_as_empty() {
        assert_eq!(with_text("#").text(), Some(""));
        assert_eq!(with_text("##").text(), Some(""));
        assert_eq!(with_text("#a#").text(), Some("a"));
    }

    #[test]
    fn text_missing() {
        assert_eq!(Object::new("1", "Testing").text(), None);
        let obj = Object::new("1", "Testing")
            .with_attributes(AttributeMap::new().with("text", AttributeMap::new()));
        assert_eq!(obj.text(), None);
    }

    #[test]
    fn duplicate_handles_last_writer_wins() {
        let obj = Object::new("L", "Standard - Line").with_connections([
            Connection::new(0, "A"),
            Connection::new(1, "B"),
            Connection::new(0, "C"),
        ]);
        let handles: Vec<u32> = obj.connections().iter().map(|c| c.handle).collect();
        assert_eq!(handles, vec![0, 1]);
        assert_eq!(obj.connection(0).unwrap().to, ObjectId::intern("C"));
    }

    #[test]
    fn connection_point_parsing() {
        assert_eq!(ConnectionPoint::parse("8"), ConnectionPoint::Index(8));
        assert_eq!(
            ConnectionPoint::parse("center"),
            ConnectionPoint::Token("center".into())
        );
    }

    #[test]
    fn default_object_is_not_a_line() {
        assert!(!Object::new("1", "Flowchart - Box").is_line());
    }
}
