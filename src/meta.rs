//! The serializable type descriptions an extraction produces.
//!
//! Easier-to-consume counterparts of the DWARF entries: every struct, enum
//! and base type the target transitively depends on, flattened into one
//! dictionary a downstream tool can rebuild in a single pass.

use indexmap::IndexMap;
use log::warn;
use serde::Serialize;

/// Classification of a base type's representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseEncoding {
    SignedIntegral,
    UnsignedIntegral,
    FloatingPoint,
}

/// One struct member: declared type name (an array member's is spelled like
/// `int[3]`), member name, byte offset and byte size. The offset is `None`
/// when it could not be decoded; it serializes as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberMeta {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
    pub offset: Option<u64>,
    pub size: u64,
}

/// A registered type descriptor. Arrays are structurally transparent and
/// never appear as a descriptor of their own; an array's element type is
/// registered in its place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeMeta {
    Base {
        name: String,
        size: u64,
        encoding: BaseEncoding,
    },
    Struct {
        name: String,
        size: u64,
        members: Vec<MemberMeta>,
    },
    Enum {
        name: String,
        size: u64,
        /// Absent when the source debug info omits the underlying type
        underlying_type: Option<String>,
    },
}

impl TypeMeta {
    pub fn name(&self) -> &str {
        match self {
            TypeMeta::Base { name, .. }
            | TypeMeta::Struct { name, .. }
            | TypeMeta::Enum { name, .. } => name,
        }
    }
}

/// Insertion-ordered mapping from type name to descriptor.
///
/// Keys are unique and a descriptor is inserted only after the descriptors it
/// references (the nested-struct shell being the one documented exception),
/// so a consumer can rebuild every type in one linear pass over the
/// serialized form.
#[derive(Debug, Default)]
pub struct TypeDict {
    entries: IndexMap<String, TypeMeta>,
}

impl TypeDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TypeMeta> {
        self.entries.get(name)
    }

    /// Insert a descriptor under its own name. A name is inserted at most
    /// once; re-inserting is a no-op keeping the first descriptor.
    pub fn insert(&mut self, meta: TypeMeta) {
        let name = meta.name().to_owned();
        if self.entries.contains_key(&name) {
            warn!("type `{}` registered twice, keeping the first", name);
            return;
        }
        self.entries.insert(name, meta);
    }

    /// Append a member to an already-inserted struct descriptor (the shell
    /// inserted before its members are walked)
    pub fn push_member(&mut self, struct_name: &str, member: MemberMeta) {
        match self.entries.get_mut(struct_name) {
            Some(TypeMeta::Struct { members, .. }) => members.push(member),
            _ => warn!(
                "no struct shell named `{}` to append member `{}` to",
                struct_name, member.name
            ),
        }
    }

    /// Descriptors in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeMeta)> {
        self.entries.iter().map(|(name, meta)| (name.as_str(), meta))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for TypeDict {
    /// Serializes as an array of descriptors in insertion order; each
    /// descriptor carries its own name
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}
