//! Read access to the debug-info entry tree.
//!
//! The raw byte-stream decoding (abbreviation tables, unit headers, string
//! sections) is gimli's job; this module wraps it in a small typed surface:
//! a [`Die`] handle for one entry, and tag-classified [`views`] exposing only
//! the operations valid for each type tag.

pub mod die;
pub mod loader;
pub mod views;

pub use die::{Die, Reader};
pub use loader::{endianness, load_dwarf, load_units};
pub use views::{
    resolve_typedef, ArrayType, BaseType, EnumType, Member, PointerType, StructType, TypeView,
    Typedef,
};
