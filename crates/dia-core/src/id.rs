//! Object ids as they appear in `.dia` files (`O0`, `O17`, ...).
//!
//! Every id seen while building a diagram is interned once; connections,
//! the diagram's id index, and errors all carry the 4-byte handle. Lookups
//! by string go through [`ObjectKey`] so that asking for an id nobody ever
//! declared does not add it to the table.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

static IDS: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// The id of an object, shared by the object itself and every connection
/// that points at it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(Spur);

impl ObjectId {
    /// The id for `s`, adding it to the table on first use.
    pub fn intern(s: &str) -> Self {
        ObjectId(IDS.get_or_intern(s))
    }

    /// The id for `s` if any object or connection has used it.
    pub fn lookup(s: &str) -> Option<Self> {
        IDS.get(s).map(ObjectId)
    }

    pub fn as_str(&self) -> &'static str {
        IDS.resolve(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self::intern(s)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.as_str())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ObjectId::intern(&s))
    }
}

// ─── Lookup keys ─────────────────────────────────────────────────────────

/// Something an object can be looked up by: an `ObjectId` or a plain
/// string.
pub trait ObjectKey {
    /// The interned id, or `None` when the string was never interned (and
    /// so cannot name any object).
    fn existing(&self) -> Option<ObjectId>;

    fn key_str(&self) -> &str;
}

impl ObjectKey for ObjectId {
    fn existing(&self) -> Option<ObjectId> {
        Some(*self)
    }

    fn key_str(&self) -> &str {
        self.as_str()
    }
}

impl ObjectKey for &str {
    fn existing(&self) -> Option<ObjectId> {
        ObjectId::lookup(self)
    }

    fn key_str(&self) -> &str {
        self
    }
}
