//! Error types for diagram construction and queries.
//!
//! Every failure is a [`DiaError`] variant carrying the id, name, or field
//! that caused it. [`DiaError::kind`] groups the variants into the four
//! broad classes callers usually branch on.

use thiserror::Error;

use crate::id::ObjectId;

/// Broad classification of a [`DiaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A layer or object lookup found nothing.
    NotFound,
    /// The caller asked for something the target cannot do
    /// (e.g. line semantics on a box).
    InvalidOperation,
    /// The document tree is missing or mangling a required field.
    MalformedInput,
    /// A connection names an object id that does not exist in the diagram.
    UnresolvedReference,
}

/// The error type for all `dia-core` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiaError {
    #[error("no layer named \"{0}\"")]
    LayerNotFound(String),

    #[error("no object with id \"{0}\"")]
    ObjectNotFound(String),

    #[error("object \"{0}\" is not a line")]
    NotALine(ObjectId),

    #[error("malformed <{tag}> node: missing required field `{field}`")]
    MissingField { tag: String, field: &'static str },

    #[error("malformed <{tag}> node: invalid `{field}` value \"{value}\"")]
    InvalidField {
        tag: String,
        field: &'static str,
        value: String,
    },

    #[error("malformed document: expected <{expected}> but found <{found}>")]
    UnexpectedTag {
        expected: &'static str,
        found: String,
    },

    #[error("malformed document: object id \"{0}\" is used more than once")]
    DuplicateId(ObjectId),

    #[error("malformed document: layer name \"{0}\" is used more than once")]
    DuplicateLayer(String),

    #[error("cannot decode {kind} value \"{raw}\"")]
    InvalidValue { kind: String, raw: String },

    #[error("connection at handle {handle} of \"{from}\" refers to unknown object \"{to}\"")]
    UnresolvedReference {
        from: ObjectId,
        handle: u32,
        to: ObjectId,
    },
}

impl DiaError {
    /// The broad class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LayerNotFound(_) | Self::ObjectNotFound(_) => ErrorKind::NotFound,
            Self::NotALine(_) => ErrorKind::InvalidOperation,
            Self::MissingField { .. }
            | Self::InvalidField { .. }
            | Self::UnexpectedTag { .. }
            | Self::DuplicateId(_)
            | Self::DuplicateLayer(_)
            | Self::InvalidValue { .. } => ErrorKind::MalformedInput,
            Self::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
        }
    }

    pub(crate) fn missing(tag: &str, field: &'static str) -> Self {
        Self::MissingField {
            tag: tag.to_owned(),
            field,
        }
    }
}
