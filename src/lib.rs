//! structdump - dump the memory layout of a struct-typed global from an
//! ELF's DWARF debug information.
//!
//! Given a binary and the name of a global variable of struct type, this
//! library produces a self-contained, serializable description of every
//! struct, enum and base type the variable's type transitively depends on:
//! sizes, member names, member byte offsets and type names. The output is
//! usable by a downstream tool (a memory inspector, for example) without
//! access to the original binary or its debug metadata.

pub mod dwarf;
pub mod error;
pub mod extract;
pub mod meta;
pub mod symbols;

pub use error::Error;
pub use extract::{dump, extract, Extraction};
pub use meta::{BaseEncoding, MemberMeta, TypeDict, TypeMeta};
pub use symbols::{find_symbol, Symbol};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize the logging system
pub fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .filter_module("structdump", level)
        .format_timestamp_secs()
        .init();
}
