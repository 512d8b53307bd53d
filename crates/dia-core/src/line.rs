//! Line semantics: which end of a connector is the head and which the tail.
//!
//! Whether an object is a line is decided by its attributes, not its type
//! name. The attribute also picks the line family, and the family decides
//! which handle is the head:
//!
//! | family       | attribute        | tail | head                         |
//! |--------------|------------------|------|------------------------------|
//! | bezier       | `bez_points`     | 0    | 3                            |
//! | polyline     | `poly_points`    | 0    | highest handle, never 0      |
//! | orthogonal   | `orth_points`    | 0    | 1                            |
//! | straight     | `conn_endpoints` | 0    | 1                            |

use crate::attributes::AttributeMap;
use crate::diagram::ObjectRef;
use crate::error::DiaError;
use crate::model::Connection;

pub const CONN_ENDPOINTS: &str = "conn_endpoints";
pub const ORTH_POINTS: &str = "orth_points";
pub const BEZ_POINTS: &str = "bez_points";
pub const POLY_POINTS: &str = "poly_points";

/// The tail of every line family.
pub const TAIL_HANDLE: u32 = 0;
const BEZIER_HEAD_HANDLE: u32 = 3;
const DEFAULT_HEAD_HANDLE: u32 = 1;

/// Visual family of a line-shaped object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Straight,
    Orthogonal,
    Bezier,
    Polyline,
}

impl LineKind {
    /// Classify an attribute map, or `None` if it does not describe a line.
    pub fn classify(attributes: &AttributeMap) -> Option<Self> {
        if attributes.has_value(BEZ_POINTS) {
            Some(Self::Bezier)
        } else if attributes.has_value(POLY_POINTS) {
            Some(Self::Polyline)
        } else if attributes.has_value(ORTH_POINTS) {
            Some(Self::Orthogonal)
        } else if attributes.has_value(CONN_ENDPOINTS) {
            Some(Self::Straight)
        } else {
            None
        }
    }
}

/// A line-shaped object viewed as a directed edge from tail to head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Line<'d> {
    object: ObjectRef<'d>,
    kind: LineKind,
}

impl<'d> Line<'d> {
    /// View `object` as a line.
    ///
    /// # Errors
    /// `NotALine` if the object's attributes do not mark it as one.
    pub fn new(object: ObjectRef<'d>) -> Result<Self, DiaError> {
        object
            .line_kind()
            .map(|kind| Self { object, kind })
            .ok_or_else(|| DiaError::NotALine(object.id()))
    }

    pub fn object(&self) -> ObjectRef<'d> {
        self.object
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    /// The handle treated as the head, if there is one.
    pub fn head_handle(&self) -> Option<u32> {
        match self.kind {
            LineKind::Bezier => Some(BEZIER_HEAD_HANDLE),
            LineKind::Polyline => self
                .object
                .connections()
                .iter()
                .map(|c| c.handle)
                .max()
                .filter(|&h| h != TAIL_HANDLE),
            LineKind::Straight | LineKind::Orthogonal => Some(DEFAULT_HEAD_HANDLE),
        }
    }

    /// The connection at the tail handle.
    pub fn connection_from(&self) -> Option<&'d Connection> {
        self.object.connection(TAIL_HANDLE)
    }

    /// The connection at the head handle.
    pub fn connection_to(&self) -> Option<&'d Connection> {
        self.head_handle()
            .and_then(|handle| self.object.connection(handle))
    }

    /// The object the tail is attached to.
    ///
    /// # Errors
    /// `UnresolvedReference` if the tail names an id missing from the diagram.
    pub fn connected_from(&self) -> Result<Option<ObjectRef<'d>>, DiaError> {
        self.connection_from()
            .map(|conn| self.object.resolve(conn))
            .transpose()
    }

    /// The object the head is attached to.
    ///
    /// # Errors
    /// `UnresolvedReference` if the head names an id missing from the diagram.
    pub fn connected_to(&self) -> Result<Option<ObjectRef<'d>>, DiaError> {
        self.connection_to()
            .map(|conn| self.object.resolve(conn))
            .transpose()
    }
}
