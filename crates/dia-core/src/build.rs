//! Construction pass: reader's `DocNode` tree → `Diagram`.
//!
//! Objects are built straight from their node; groups and layers build
//! their children first, then wrap them. The finished layers go to
//! [`Diagram::with_config`], which links parents and builds the indices.
//! Any missing required field aborts the whole build.

use crate::diagram::Diagram;
use crate::document::{DocNode, DocTag, RawConnection};
use crate::error::DiaError;
use crate::model::{Child, Connection, ConnectionPoint, DiagramData, Group, Layer, Object};

// ─── Config ───────────────────────────────────────────────────────────────

/// Configuration for the construction pass.
///
/// Defaults accept anything a well-formed `.dia` file can contain and defer
/// reference checking to query time.
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    /// Fail the build if any connection targets an id missing from the
    /// diagram. Default: **false** (dangling ids fail only when resolved).
    pub validate_references: bool,

    /// Treat two layers with the same name as malformed input.
    /// Default: **false** (the first layer keeps the name).
    pub strict_layer_names: bool,
}

// ─── Entry points ─────────────────────────────────────────────────────────

/// Build a diagram from the reader's root `diagram` node.
///
/// # Errors
/// Malformed-input errors for missing or invalid required fields, and
/// duplicate object ids.
pub fn build_diagram(root: &DocNode) -> Result<Diagram, DiaError> {
    build_diagram_with(root, &BuildConfig::default())
}

/// Like [`build_diagram`], with an explicit config.
///
/// # Errors
/// See [`build_diagram`] and [`Diagram::with_config`].
pub fn build_diagram_with(root: &DocNode, config: &BuildConfig) -> Result<Diagram, DiaError> {
    if root.doc_tag() != Some(DocTag::Diagram) {
        return Err(DiaError::UnexpectedTag {
            expected: DocTag::Diagram.as_str(),
            found: root.tag.clone(),
        });
    }

    let mut data = DiagramData::default();
    let mut layers = Vec::new();

    for child in &root.children {
        match child.doc_tag() {
            Some(DocTag::DiagramData) => data.attributes = child.attributes.clone(),
            Some(DocTag::Layer) => layers.push(build_layer(child)?),
            _ => log::warn!("skipping <{}> under <diagram>", child.tag),
        }
    }

    Diagram::with_config(data, layers, config)
}

/// Build one layer and everything below it.
///
/// # Errors
/// `MissingField` when the layer has no `name`, plus any child error.
pub fn build_layer(node: &DocNode) -> Result<Layer, DiaError> {
    let tag = DocTag::Layer.as_str();
    let name = node.prop("name").ok_or_else(|| DiaError::missing(tag, "name"))?;

    let layer = Layer {
        name: name.to_owned(),
        visible: flag(node, "visible"),
        connectable: flag(node, "connectable"),
        active: flag(node, "active"),
        children: build_children(node)?,
    };
    log::trace!("layer \"{}\" with {} children", layer.name, layer.children.len());
    Ok(layer)
}

/// Build one group and everything below it.
///
/// # Errors
/// Any child error.
pub fn build_group(node: &DocNode) -> Result<Group, DiaError> {
    Ok(Group::new(build_children(node)?).with_attributes(node.attributes.clone()))
}

/// Build one object with its connections.
///
/// # Errors
/// `MissingField` when `id` or `type` is missing, plus connection errors.
pub fn build_object(node: &DocNode) -> Result<Object, DiaError> {
    let tag = DocTag::Object.as_str();
    let id = node.prop("id").ok_or_else(|| DiaError::missing(tag, "id"))?;
    let type_name = node
        .prop("type")
        .ok_or_else(|| DiaError::missing(tag, "type"))?;

    let connections = node
        .connections
        .iter()
        .map(build_connection)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Object::new(id, type_name)
        .with_version(node.prop("version").unwrap_or_default())
        .with_attributes(node.attributes.clone())
        .with_connections(connections))
}

/// Validate a raw connection triple.
///
/// # Errors
/// `MissingField` for a missing `handle` or `to`; `InvalidField` for a
/// handle that is not a non-negative integer.
pub fn build_connection(raw: &RawConnection) -> Result<Connection, DiaError> {
    const TAG: &str = "connection";
    let handle_raw = raw
        .handle
        .as_deref()
        .ok_or_else(|| DiaError::missing(TAG, "handle"))?;
    let handle = handle_raw
        .trim()
        .parse::<u32>()
        .map_err(|_| DiaError::InvalidField {
            tag: TAG.to_owned(),
            field: "handle",
            value: handle_raw.to_owned(),
        })?;
    let to = raw.to.as_deref().ok_or_else(|| DiaError::missing(TAG, "to"))?;

    let mut conn = Connection::new(handle, to);
    if let Some(point) = raw.connection.as_deref() {
        conn = conn.at_point(ConnectionPoint::parse(point));
    }
    Ok(conn)
}

// ─── Helpers ──────────────────────────────────────────────────────────────

fn build_children(node: &DocNode) -> Result<Vec<Child>, DiaError> {
    let mut children = Vec::with_capacity(node.children.len());
    for child in &node.children {
        match child.doc_tag() {
            Some(DocTag::Object) => children.push(Child::Object(build_object(child)?)),
            Some(DocTag::Group) => children.push(Child::Group(build_group(child)?)),
            _ => log::warn!("skipping <{}> under <{}>", child.tag, node.tag),
        }
    }
    Ok(children)
}

/// Layer flags are the literal strings `"true"`/`"false"`; anything else,
/// including a missing flag, reads as false.
fn flag(node: &DocNode, key: &str) -> bool {
    node.prop(key) == Some("true")
}
