//! Decoded attribute values attached to objects, groups, and the diagram.
//!
//! The core treats attributes as opaque except for a handful of keys:
//! `text.string` (object text) and the line-indicator point lists
//! (`conn_endpoints`, `orth_points`, `bez_points`, `poly_points`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Value shapes ────────────────────────────────────────────────────────

/// A raw 2D coordinate. No geometry is performed on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A raw rectangle as two corner coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Font {
    pub family: String,
    pub style: String,
    pub name: String,
}

/// A single decoded attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrValue {
    Real(f64),
    Int(i64),
    Enum(i64),
    Boolean(bool),
    Point(Point),
    Rectangle(Rect),
    String(String),
    Color(String),
    Font(Font),
    /// Nested attribute group (`text`, `grid`, ...).
    Composite(AttributeMap),
    /// Multi-valued attribute, e.g. the points of a polyline.
    List(Vec<AttrValue>),
    /// The attribute was present but carried no value.
    Empty,
}

impl AttrValue {
    /// Whether the value carries nothing: `Empty`, or an empty
    /// list/string/composite. Scalars are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            AttrValue::Empty => true,
            AttrValue::List(items) => items.is_empty(),
            AttrValue::String(s) => s.is_empty(),
            AttrValue::Composite(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) | AttrValue::Color(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric coercion: reals, ints, and enums all read as `f64`.
    pub fn as_real(&self) -> Option<f64> {
        match *self {
            AttrValue::Real(v) => Some(v),
            AttrValue::Int(v) | AttrValue::Enum(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            AttrValue::Int(v) | AttrValue::Enum(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            AttrValue::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match *self {
            AttrValue::Point(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_rect(&self) -> Option<Rect> {
        match *self {
            AttrValue::Rectangle(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&AttributeMap> {
        match self {
            AttrValue::Composite(map) => Some(map),
            _ => None,
        }
    }

    /// List view. A single non-list value reads as a one-element slice so
    /// point attributes work whether one or many points were decoded.
    pub fn as_list(&self) -> &[AttrValue] {
        match self {
            AttrValue::List(items) => items,
            AttrValue::Empty => &[],
            other => std::slice::from_ref(other),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::String(s)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Real(v)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Boolean(b)
    }
}

impl From<Point> for AttrValue {
    fn from(p: Point) -> Self {
        AttrValue::Point(p)
    }
}

impl From<AttributeMap> for AttrValue {
    fn from(map: AttributeMap) -> Self {
        AttrValue::Composite(map)
    }
}

// ─── Attribute map ───────────────────────────────────────────────────────

/// Attribute name → decoded value. Built once per document node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap(HashMap<String, AttrValue>);

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    /// Look up a dotted path through nested composites:
    /// `get_path("text.string")` reads `string` inside the `text` composite.
    pub fn get_path(&self, path: &str) -> Option<&AttrValue> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = current.as_composite()?.get(segment)?;
        }
        Some(current)
    }

    /// True when `name` is present with a non-empty value.
    pub fn has_value(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
