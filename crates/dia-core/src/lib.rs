pub mod attributes;
pub mod build;
pub mod decode;
pub mod diagram;
pub mod document;
pub mod error;
pub mod expr;
pub mod id;
pub mod line;
pub mod model;

pub use attributes::{AttrValue, AttributeMap, Font, Point, Rect};
pub use build::{BuildConfig, build_diagram, build_diagram_with};
pub use diagram::{
    Diagram, GroupRef, LayerRef, LinePair, NodeRef, Nodes, ObjectIter, ObjectRef, Objects,
    ParentRef,
};
pub use document::{DocNode, DocTag, RawConnection};
pub use error::{DiaError, ErrorKind};
pub use expr::{Expr, Seq};
pub use id::{ObjectId, ObjectKey};
pub use line::{Line, LineKind};
pub use model::{Child, Connection, ConnectionPoint, DiagramData, Group, Layer, Object};
