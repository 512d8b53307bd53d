//! The diagram graph: an immutable arena of layers, groups, and objects.
//!
//! Containment is stored as a petgraph DAG whose edges go parent → child.
//! Nodes are inserted depth-first in declaration order, so sorting a node's
//! children by `NodeIndex` restores document order. Connections between
//! objects are *not* graph edges: they stay as `ObjectId`s and are resolved
//! through `object_index` when asked for.
//!
//! Callers never touch `NodeIndex` directly. They get lightweight `Copy`
//! handles (`ObjectRef`, `GroupRef`, `LayerRef`) that borrow the diagram.

use crate::attributes::AttributeMap;
use crate::build::BuildConfig;
use crate::error::DiaError;
use crate::id::{ObjectId, ObjectKey};
use crate::line::{Line, LineKind};
use crate::model::{Child, Connection, DiagramData, Layer, Object};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::{Hash, Hasher};

// ─── Arena ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct LayerInfo {
    name: String,
    visible: bool,
    connectable: bool,
    active: bool,
}

#[derive(Debug, Clone)]
enum Element {
    Layer(LayerInfo),
    Group(AttributeMap),
    Object(Object),
}

/// A fully built diagram. Read-only once constructed.
#[derive(Debug, Clone)]
pub struct Diagram {
    graph: DiGraph<Element, ()>,
    /// Top-level layers in declaration order.
    layers: Vec<NodeIndex>,
    data: DiagramData,
    object_index: HashMap<ObjectId, NodeIndex>,
    layer_index: HashMap<String, NodeIndex>,
}

impl Diagram {
    /// Build a diagram from its layers with the default [`BuildConfig`].
    ///
    /// # Errors
    /// `DuplicateId` if two objects share an id.
    pub fn new(data: DiagramData, layers: Vec<Layer>) -> Result<Self, DiaError> {
        Self::with_config(data, layers, &BuildConfig::default())
    }

    /// Build a diagram from its layers.
    ///
    /// Moves every layer into the arena, records parent links, and builds
    /// the id and layer-name indices in one depth-first pass.
    ///
    /// # Errors
    /// - `DuplicateId` if two objects share an id
    /// - `DuplicateLayer` if `config.strict_layer_names` and two layers share a name
    /// - `UnresolvedReference` if `config.validate_references` and a connection
    ///   names an unknown object
    pub fn with_config(
        data: DiagramData,
        layers: Vec<Layer>,
        config: &BuildConfig,
    ) -> Result<Self, DiaError> {
        let mut diagram = Self {
            graph: DiGraph::new(),
            layers: Vec::with_capacity(layers.len()),
            data,
            object_index: HashMap::new(),
            layer_index: HashMap::new(),
        };

        for layer in layers {
            let idx = diagram.graph.add_node(Element::Layer(LayerInfo {
                name: layer.name.clone(),
                visible: layer.visible,
                connectable: layer.connectable,
                active: layer.active,
            }));
            diagram.layers.push(idx);

            match diagram.layer_index.entry(layer.name) {
                Entry::Vacant(slot) => {
                    slot.insert(idx);
                }
                Entry::Occupied(slot) => {
                    if config.strict_layer_names {
                        return Err(DiaError::DuplicateLayer(slot.key().clone()));
                    }
                    log::warn!(
                        "duplicate layer name \"{}\"; lookups resolve to the first one",
                        slot.key()
                    );
                }
            }

            diagram.insert_children(idx, layer.children)?;
        }

        if config.validate_references {
            diagram.check_references()?;
        }

        log::debug!(
            "built diagram: {} layers, {} objects, {} nodes",
            diagram.layers.len(),
            diagram.object_index.len(),
            diagram.graph.node_count()
        );

        Ok(diagram)
    }

    fn insert_children(&mut self, parent: NodeIndex, children: Vec<Child>) -> Result<(), DiaError> {
        for child in children {
            match child {
                Child::Object(object) => {
                    let id = object.id();
                    let idx = self.graph.add_node(Element::Object(object));
                    self.graph.add_edge(parent, idx, ());
                    if self.object_index.insert(id, idx).is_some() {
                        return Err(DiaError::DuplicateId(id));
                    }
                    log::trace!("object {id} at {idx:?}");
                }
                Child::Group(group) => {
                    let idx = self.graph.add_node(Element::Group(group.attributes));
                    self.graph.add_edge(parent, idx, ());
                    log::trace!("group at {idx:?} with {} children", group.children.len());
                    self.insert_children(idx, group.children)?;
                }
            }
        }
        Ok(())
    }

    fn check_references(&self) -> Result<(), DiaError> {
        for obj in self.objects() {
            for conn in obj.connections() {
                obj.resolve(conn)?;
            }
        }
        Ok(())
    }

    // ─── Public API ──────────────────────────────────────────────────────

    /// Diagram-level attributes.
    pub fn data(&self) -> &DiagramData {
        &self.data
    }

    /// Layers in declaration order.
    pub fn layers(&self) -> impl Iterator<Item = LayerRef<'_>> {
        self.layers.iter().filter_map(|&idx| self.layer_at(idx))
    }

    /// Look up a layer by name.
    ///
    /// # Errors
    /// `LayerNotFound` if no layer has that name.
    pub fn layer(&self, name: &str) -> Result<LayerRef<'_>, DiaError> {
        self.layer_index
            .get(name)
            .and_then(|&idx| self.layer_at(idx))
            .ok_or_else(|| DiaError::LayerNotFound(name.to_owned()))
    }

    /// Every object in the diagram, depth-first in declaration order.
    pub fn objects(&self) -> Objects<'_> {
        Objects { diagram: self }
    }

    /// The object a connection points at.
    ///
    /// # Errors
    /// `ObjectNotFound` if the target id is not in the diagram. Use
    /// [`ObjectRef::resolve`] to get the owning object in the error.
    pub fn resolve(&self, connection: &Connection) -> Result<ObjectRef<'_>, DiaError> {
        self.objects().get(connection.to)
    }

    /// Every group and object, depth-first pre-order (a group comes before
    /// its contents).
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes::new(self, self.layers.iter().rev().copied().collect())
    }

    // ─── Arena access ────────────────────────────────────────────────────

    /// Children of `idx` in document order.
    fn children_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    fn parent_of(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
    }

    fn object_at(&self, index: NodeIndex) -> Option<ObjectRef<'_>> {
        match &self.graph[index] {
            Element::Object(object) => Some(ObjectRef {
                diagram: self,
                index,
                object,
            }),
            _ => None,
        }
    }

    fn group_at(&self, index: NodeIndex) -> Option<GroupRef<'_>> {
        match &self.graph[index] {
            Element::Group(attributes) => Some(GroupRef {
                diagram: self,
                index,
                attributes,
            }),
            _ => None,
        }
    }

    fn layer_at(&self, index: NodeIndex) -> Option<LayerRef<'_>> {
        match &self.graph[index] {
            Element::Layer(info) => Some(LayerRef {
                diagram: self,
                index,
                info,
            }),
            _ => None,
        }
    }

    fn container_at(&self, index: NodeIndex) -> Option<ParentRef<'_>> {
        match &self.graph[index] {
            Element::Layer(_) => self.layer_at(index).map(ParentRef::Layer),
            Element::Group(_) => self.group_at(index).map(ParentRef::Group),
            Element::Object(_) => None,
        }
    }

    fn node_at(&self, index: NodeIndex) -> Option<NodeRef<'_>> {
        match &self.graph[index] {
            Element::Object(_) => self.object_at(index).map(NodeRef::Object),
            Element::Group(_) => self.group_at(index).map(NodeRef::Group),
            Element::Layer(_) => None,
        }
    }

    /// Walk up from `idx` to the enclosing layer.
    fn enclosing_layer(&self, idx: NodeIndex) -> Option<LayerRef<'_>> {
        let mut current = self.parent_of(idx)?;
        loop {
            if let Some(layer) = self.layer_at(current) {
                return Some(layer);
            }
            current = self.parent_of(current)?;
        }
    }
}

// ─── Handles ─────────────────────────────────────────────────────────────

/// Handles compare equal when they point at the same node of the same
/// diagram.
macro_rules! handle_identity {
    ($ty:ident) => {
        impl PartialEq for $ty<'_> {
            fn eq(&self, other: &Self) -> bool {
                std::ptr::eq(self.diagram, other.diagram) && self.index == other.index
            }
        }

        impl Eq for $ty<'_> {}

        impl Hash for $ty<'_> {
            fn hash<H: Hasher>(&self, state: &mut H) {
                std::ptr::hash(self.diagram, state);
                self.index.hash(state);
            }
        }
    };
}

/// A borrowed handle to an object in a diagram.
#[derive(Clone, Copy)]
pub struct ObjectRef<'d> {
    diagram: &'d Diagram,
    index: NodeIndex,
    object: &'d Object,
}

handle_identity!(ObjectRef);

impl fmt::Debug for ObjectRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("id", &self.id())
            .field("type", &self.type_name())
            .field("is_line", &self.is_line())
            .finish()
    }
}

impl<'d> ObjectRef<'d> {
    /// The owned object data.
    pub fn data(&self) -> &'d Object {
        self.object
    }

    pub fn diagram(&self) -> &'d Diagram {
        self.diagram
    }

    pub fn id(&self) -> ObjectId {
        self.object.id()
    }

    pub fn type_name(&self) -> &'d str {
        self.object.type_name()
    }

    pub fn version(&self) -> &'d str {
        self.object.version()
    }

    pub fn attributes(&self) -> &'d AttributeMap {
        self.object.attributes()
    }

    pub fn connections(&self) -> &'d [Connection] {
        self.object.connections()
    }

    pub fn connection(&self, handle: u32) -> Option<&'d Connection> {
        self.object.connection(handle)
    }

    pub fn text(&self) -> Option<&'d str> {
        self.object.text()
    }

    pub fn line_kind(&self) -> Option<LineKind> {
        self.object.line_kind()
    }

    pub fn is_line(&self) -> bool {
        self.object.is_line()
    }

    /// View this object as a line.
    ///
    /// # Errors
    /// `NotALine` if the object is not line-shaped.
    pub fn as_line(self) -> Result<Line<'d>, DiaError> {
        Line::new(self)
    }

    /// The group or layer directly containing this object.
    pub fn parent(&self) -> Option<ParentRef<'d>> {
        self.diagram
            .parent_of(self.index)
            .and_then(|p| self.diagram.container_at(p))
    }

    pub fn layer(&self) -> Option<LayerRef<'d>> {
        self.diagram.enclosing_layer(self.index)
    }

    /// Resolve the target of `connection` in this object's diagram.
    ///
    /// # Errors
    /// `UnresolvedReference` if the target id is not in the diagram.
    pub fn resolve(&self, connection: &Connection) -> Result<ObjectRef<'d>, DiaError> {
        self.diagram
            .resolve(connection)
            .map_err(|_| DiaError::UnresolvedReference {
                from: self.id(),
                handle: connection.handle,
                to: connection.to,
            })
    }

    /// Resolved targets of this object's own connections, in order.
    pub fn connected_objects(self) -> impl Iterator<Item = Result<ObjectRef<'d>, DiaError>> {
        self.connections().iter().map(move |conn| self.resolve(conn))
    }

    /// Lines whose tail is attached to this object.
    ///
    /// Every line end is resolved along the way, so a dangling tail
    /// anywhere in the diagram shows up as an `Err` item.
    pub fn outbound_lines(self) -> impl Iterator<Item = Result<ObjectRef<'d>, DiaError>> {
        self.diagram.objects().outbound_lines(self)
    }

    /// Lines whose head is attached to this object. Dangling heads are
    /// `Err` items.
    pub fn inbound_lines(self) -> impl Iterator<Item = Result<ObjectRef<'d>, DiaError>> {
        self.diagram.objects().inbound_lines(self)
    }

    /// `(line, head object)` for each outbound line.
    pub fn outbound(self) -> impl Iterator<Item = Result<LinePair<'d>, DiaError>> {
        self.diagram.objects().outbound(self)
    }

    /// `(line, tail object)` for each inbound line.
    pub fn inbound(self) -> impl Iterator<Item = Result<LinePair<'d>, DiaError>> {
        self.diagram.objects().inbound(self)
    }

    /// Objects with any connection pointing at this one.
    pub fn connected_to_this(self) -> impl Iterator<Item = Result<ObjectRef<'d>, DiaError>> {
        self.diagram.objects().connected_to_this(self)
    }
}

/// A borrowed handle to a group.
#[derive(Clone, Copy)]
pub struct GroupRef<'d> {
    diagram: &'d Diagram,
    index: NodeIndex,
    attributes: &'d AttributeMap,
}

handle_identity!(GroupRef);

impl fmt::Debug for GroupRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupRef")
            .field("index", &self.index.index())
            .finish()
    }
}

impl<'d> GroupRef<'d> {
    pub fn attributes(&self) -> &'d AttributeMap {
        self.attributes
    }

    pub fn diagram(&self) -> &'d Diagram {
        self.diagram
    }

    pub fn parent(&self) -> Option<ParentRef<'d>> {
        self.diagram
            .parent_of(self.index)
            .and_then(|p| self.diagram.container_at(p))
    }

    pub fn layer(&self) -> Option<LayerRef<'d>> {
        self.diagram.enclosing_layer(self.index)
    }

    /// Direct children in document order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'d>> + use<'d> {
        let diagram = self.diagram;
        diagram
            .children_of(self.index)
            .into_iter()
            .filter_map(move |idx| diagram.node_at(idx))
    }

    /// Objects anywhere inside this group, depth-first.
    pub fn iter_objects(&self) -> ObjectIter<'d> {
        ObjectIter(Nodes::under(self.diagram, self.index))
    }

    pub fn iter_line_objects(&self) -> impl Iterator<Item = ObjectRef<'d>> + use<'d> {
        self.iter_objects().filter(ObjectRef::is_line)
    }
}

/// A borrowed handle to a layer.
#[derive(Clone, Copy)]
pub struct LayerRef<'d> {
    diagram: &'d Diagram,
    index: NodeIndex,
    info: &'d LayerInfo,
}

handle_identity!(LayerRef);

impl fmt::Debug for LayerRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerRef")
            .field("name", &self.info.name)
            .finish()
    }
}

impl<'d> LayerRef<'d> {
    pub fn name(&self) -> &'d str {
        &self.info.name
    }

    pub fn visible(&self) -> bool {
        self.info.visible
    }

    pub fn connectable(&self) -> bool {
        self.info.connectable
    }

    pub fn active(&self) -> bool {
        self.info.active
    }

    pub fn diagram(&self) -> &'d Diagram {
        self.diagram
    }

    /// Direct children in document order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'d>> + use<'d> {
        let diagram = self.diagram;
        diagram
            .children_of(self.index)
            .into_iter()
            .filter_map(move |idx| diagram.node_at(idx))
    }

    /// Objects anywhere in this layer, depth-first in declaration order.
    pub fn iter_objects(&self) -> ObjectIter<'d> {
        ObjectIter(Nodes::under(self.diagram, self.index))
    }

    pub fn iter_line_objects(&self) -> impl Iterator<Item = ObjectRef<'d>> + use<'d> {
        self.iter_objects().filter(ObjectRef::is_line)
    }

    /// An object of this layer (at any depth) by id.
    ///
    /// # Errors
    /// `ObjectNotFound` if the id is unknown or belongs to another layer.
    pub fn object(&self, id: impl ObjectKey) -> Result<ObjectRef<'d>, DiaError> {
        id.existing()
            .and_then(|found| self.diagram.objects().get(found).ok())
            .filter(|obj| obj.layer().as_ref() == Some(self))
            .ok_or_else(|| DiaError::ObjectNotFound(id.key_str().to_owned()))
    }
}

/// A group or an object: anything that can sit inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef<'d> {
    Object(ObjectRef<'d>),
    Group(GroupRef<'d>),
}

impl<'d> NodeRef<'d> {
    pub fn as_object(&self) -> Option<ObjectRef<'d>> {
        match *self {
            NodeRef::Object(obj) => Some(obj),
            NodeRef::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<GroupRef<'d>> {
        match *self {
            NodeRef::Group(group) => Some(group),
            NodeRef::Object(_) => None,
        }
    }

    pub fn parent(&self) -> Option<ParentRef<'d>> {
        match self {
            NodeRef::Object(obj) => obj.parent(),
            NodeRef::Group(group) => group.parent(),
        }
    }

    pub fn layer(&self) -> Option<LayerRef<'d>> {
        match self {
            NodeRef::Object(obj) => obj.layer(),
            NodeRef::Group(group) => group.layer(),
        }
    }
}

/// The container directly above a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentRef<'d> {
    Layer(LayerRef<'d>),
    Group(GroupRef<'d>),
}

// ─── Iteration ───────────────────────────────────────────────────────────

/// Depth-first pre-order walk over groups and objects.
///
/// Each call to `Diagram::nodes` (or `iter_objects`) starts a fresh walk.
#[derive(Debug, Clone)]
pub struct Nodes<'d> {
    diagram: &'d Diagram,
    /// Pending nodes; the top of the stack is visited next.
    stack: Vec<NodeIndex>,
}

impl<'d> Nodes<'d> {
    fn new(diagram: &'d Diagram, stack: Vec<NodeIndex>) -> Self {
        Self { diagram, stack }
    }

    /// Walk everything below `root`, excluding `root` itself.
    fn under(diagram: &'d Diagram, root: NodeIndex) -> Self {
        let mut stack = diagram.children_of(root);
        stack.reverse();
        Self::new(diagram, stack)
    }
}

impl<'d> Iterator for Nodes<'d> {
    type Item = NodeRef<'d>;

    fn next(&mut self) -> Option<NodeRef<'d>> {
        loop {
            let idx = self.stack.pop()?;
            let children = self.diagram.children_of(idx);
            self.stack.extend(children.into_iter().rev());
            if let Some(node) = self.diagram.node_at(idx) {
                return Some(node);
            }
        }
    }
}

/// Depth-first walk over objects only.
#[derive(Debug, Clone)]
pub struct ObjectIter<'d>(Nodes<'d>);

impl<'d> Iterator for ObjectIter<'d> {
    type Item = ObjectRef<'d>;

    fn next(&mut self) -> Option<ObjectRef<'d>> {
        self.0.find_map(|node| node.as_object())
    }
}

/// `(line, object at the other end)`; the other end may be unconnected.
pub type LinePair<'d> = (ObjectRef<'d>, Option<ObjectRef<'d>>);

/// Diagram-wide view over objects: iteration, lookup by id, and the
/// line/connectivity filters built on top of them.
///
/// The view is `Copy`; every iteration re-walks the diagram from the start.
#[derive(Debug, Clone, Copy)]
pub struct Objects<'d> {
    diagram: &'d Diagram,
}

impl<'d> Objects<'d> {
    pub fn iter(self) -> ObjectIter<'d> {
        ObjectIter(self.diagram.nodes())
    }

    pub fn len(self) -> usize {
        self.diagram.object_index.len()
    }

    pub fn is_empty(self) -> bool {
        self.diagram.object_index.is_empty()
    }

    /// Look up an object by id.
    ///
    /// # Errors
    /// `ObjectNotFound` if the id is not in the diagram.
    pub fn get(self, id: impl ObjectKey) -> Result<ObjectRef<'d>, DiaError> {
        id.existing()
            .and_then(|id| self.diagram.object_index.get(&id))
            .and_then(|&idx| self.diagram.object_at(idx))
            .ok_or_else(|| DiaError::ObjectNotFound(id.key_str().to_owned()))
    }

    /// Line-shaped objects, in object order.
    pub fn filter_lines(self) -> impl Iterator<Item = ObjectRef<'d>> {
        self.iter().filter(ObjectRef::is_line)
    }

    fn lines(self) -> impl Iterator<Item = Line<'d>> {
        self.iter().filter_map(|obj| obj.as_line().ok())
    }

    /// Lines whose tail is attached to `obj`.
    pub fn outbound_lines(
        self,
        obj: ObjectRef<'d>,
    ) -> impl Iterator<Item = Result<ObjectRef<'d>, DiaError>> {
        self.lines_from(obj).map(|line| line.map(|line| line.object()))
    }

    /// Lines whose head is attached to `obj`.
    pub fn inbound_lines(
        self,
        obj: ObjectRef<'d>,
    ) -> impl Iterator<Item = Result<ObjectRef<'d>, DiaError>> {
        self.lines_to(obj).map(|line| line.map(|line| line.object()))
    }

    /// `(line, head object)` for each line leaving `obj`.
    pub fn outbound(
        self,
        obj: ObjectRef<'d>,
    ) -> impl Iterator<Item = Result<LinePair<'d>, DiaError>> {
        self.lines_from(obj)
            .map(|line| line.and_then(|line| line.connected_to().map(|head| (line.object(), head))))
    }

    /// `(line, tail object)` for each line arriving at `obj`.
    pub fn inbound(
        self,
        obj: ObjectRef<'d>,
    ) -> impl Iterator<Item = Result<LinePair<'d>, DiaError>> {
        self.lines_to(obj)
            .map(|line| line.and_then(|line| line.connected_from().map(|tail| (line.object(), tail))))
    }

    /// Every object (line or not) with a connection targeting `obj`.
    ///
    /// An object's connections are resolved in order until one reaches
    /// `obj`; a dangling one met first is yielded as the error.
    pub fn connected_to_this(
        self,
        obj: ObjectRef<'d>,
    ) -> impl Iterator<Item = Result<ObjectRef<'d>, DiaError>> {
        self.iter().filter_map(move |other| {
            other.connected_objects().find_map(|target| match target {
                Ok(target) if target == obj => Some(Ok(other)),
                Ok(_) => None,
                Err(err) => Some(Err(err)),
            })
        })
    }

    fn lines_from(self, obj: ObjectRef<'d>) -> impl Iterator<Item = Result<Line<'d>, DiaError>> {
        self.lines()
            .filter_map(move |line| attached(line, line.connected_from(), obj))
    }

    fn lines_to(self, obj: ObjectRef<'d>) -> impl Iterator<Item = Result<Line<'d>, DiaError>> {
        self.lines()
            .filter_map(move |line| attached(line, line.connected_to(), obj))
    }
}

/// Keep `line` if the resolved `end` is `obj`; pass resolution errors on.
fn attached<'d>(
    line: Line<'d>,
    end: Result<Option<ObjectRef<'d>>, DiaError>,
    obj: ObjectRef<'d>,
) -> Option<Result<Line<'d>, DiaError>> {
    match end {
        Ok(Some(end)) if end == obj => Some(Ok(line)),
        Ok(_) => None,
        Err(err) => Some(Err(err)),
    }
}

impl<'d> IntoIterator for Objects<'d> {
    type Item = ObjectRef<'d>;
    type IntoIter = ObjectIter<'d>;

    fn into_iter(self) -> ObjectIter<'d> {
        self.iter()
    }
}
