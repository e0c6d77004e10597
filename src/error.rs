use thiserror::Error;

/// Fatal conditions that abort an extraction.
///
/// Degraded-but-recoverable conditions (an undecodable member offset, an enum
/// without an underlying type) never show up here; they are logged at the
/// point of detection and encoded as absent fields in the output.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested global is not in the binary's symbol table
    #[error("symbol `{0}` not found in the symbol table")]
    SymbolNotFound(String),

    /// The binary carries no DWARF debug information
    #[error("no DWARF debug information present")]
    NoDebugInfo,

    /// No DW_TAG_variable entry with the requested name exists
    #[error("variable `{0}` not found in the debug info")]
    VariableNotFound(String),

    /// The variable's resolved type is not a structure
    #[error("top-level type is not a struct (found {tag})")]
    TopTypeNotStruct { tag: gimli::DwTag },

    /// A tag this tool does not handle turned up while sizing, naming or
    /// registering a type
    #[error("unsupported tag {tag} for entry at {offset:#x}")]
    UnsupportedTag { tag: gimli::DwTag, offset: usize },

    /// A base type with an encoding outside signed/unsigned/floating
    #[error("base type `{name}` has unsupported encoding {encoding}")]
    UnknownBaseEncoding {
        name: String,
        encoding: gimli::DwAte,
    },

    /// An array whose length cannot be read from a subrange child
    #[error("cannot determine length of array at {offset:#x}")]
    ArrayLength { offset: usize },

    /// A required attribute is missing from an entry
    #[error("missing attribute {attr} on entry at {offset:#x}")]
    MissingAttribute { attr: gimli::DwAt, offset: usize },

    /// A typedef chain longer than the resolver's depth limit, which in
    /// practice means the debug info contains an alias cycle
    #[error("typedef chain at {offset:#x} exceeds the depth limit")]
    AliasChainTooDeep { offset: usize },

    /// A DW_AT_type attribute that cannot be resolved to an entry in the
    /// same compilation unit
    #[error("cannot resolve type reference of entry at {offset:#x}")]
    TypeRef { offset: usize },

    /// The input is not an ELF binary
    #[error("unsupported binary format")]
    UnsupportedFormat,

    #[error("malformed DWARF: {0}")]
    Dwarf(#[from] gimli::Error),

    #[error("malformed binary: {0}")]
    Binary(#[from] goblin::error::Error),

    #[error("failed to parse object file: {0}")]
    Object(#[from] object::read::Error),
}
