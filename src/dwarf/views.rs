//! Tag-classified views over type entries.
//!
//! Instead of asserting a tag at each access, a type entry is classified once
//! into the closed [`TypeView`] enum; each view then exposes only the
//! operations valid for its tag. Views are ephemeral borrows, they own
//! nothing.

use gimli::{AttributeValue, Operation};
use log::warn;

use crate::dwarf::Die;
use crate::error::Error;

/// Longest typedef chain the resolver will follow. Real programs nest a
/// handful of aliases; anything past this limit is a cycle in malformed
/// debug info.
const MAX_TYPEDEF_DEPTH: usize = 128;

/// Strip a chain of typedefs down to the first non-alias entry
pub fn resolve_typedef<'a, 'u>(mut die: Die<'a, 'u>) -> Result<Die<'a, 'u>, Error> {
    let start = die.debug_info_offset();
    for _ in 0..MAX_TYPEDEF_DEPTH {
        if die.tag() != gimli::DW_TAG_typedef {
            return Ok(die);
        }
        die = Typedef(die).referenced_type()?;
    }
    Err(Error::AliasChainTooDeep { offset: start })
}

/// A type entry classified by tag
pub enum TypeView<'a, 'u> {
    Base(BaseType<'a, 'u>),
    Struct(StructType<'a, 'u>),
    Enum(EnumType<'a, 'u>),
    Array(ArrayType<'a, 'u>),
    Typedef(Typedef<'a, 'u>),
    Pointer(PointerType<'a, 'u>),
}

impl<'a, 'u> TypeView<'a, 'u> {
    pub fn classify(die: Die<'a, 'u>) -> Result<Self, Error> {
        match die.tag() {
            gimli::DW_TAG_base_type => Ok(Self::Base(BaseType(die))),
            gimli::DW_TAG_structure_type => Ok(Self::Struct(StructType(die))),
            gimli::DW_TAG_enumeration_type => Ok(Self::Enum(EnumType(die))),
            gimli::DW_TAG_array_type => Ok(Self::Array(ArrayType(die))),
            gimli::DW_TAG_typedef => Ok(Self::Typedef(Typedef(die))),
            gimli::DW_TAG_pointer_type => Ok(Self::Pointer(PointerType(die))),
            tag => Err(Error::UnsupportedTag {
                tag,
                offset: die.debug_info_offset(),
            }),
        }
    }
}

/// DW_TAG_base_type
pub struct BaseType<'a, 'u>(Die<'a, 'u>);

impl BaseType<'_, '_> {
    pub fn name(&self) -> Result<String, Error> {
        self.0.required_name()
    }

    pub fn byte_size(&self) -> Result<u64, Error> {
        self.0.required_udata(gimli::DW_AT_byte_size)
    }

    pub fn encoding(&self) -> Result<gimli::DwAte, Error> {
        match self.0.attr_value(gimli::DW_AT_encoding)? {
            Some(AttributeValue::Encoding(ate)) => Ok(ate),
            _ => Err(Error::MissingAttribute {
                attr: gimli::DW_AT_encoding,
                offset: self.0.debug_info_offset(),
            }),
        }
    }
}

/// DW_TAG_structure_type
pub struct StructType<'a, 'u>(Die<'a, 'u>);

impl<'a, 'u> StructType<'a, 'u> {
    /// The struct's tag name; anonymous structs have none
    pub fn tag_name(&self) -> Result<Option<String>, Error> {
        self.0.name()
    }

    pub fn byte_size(&self) -> Result<u64, Error> {
        self.0.required_udata(gimli::DW_AT_byte_size)
    }

    pub fn debug_info_offset(&self) -> usize {
        self.0.debug_info_offset()
    }

    /// Member entries in declaration order. Children with other tags (nested
    /// type definitions) are not members and are skipped.
    pub fn members(&self) -> Result<Vec<Member<'a, 'u>>, Error> {
        Ok(self
            .0
            .children()?
            .into_iter()
            .filter(|child| child.tag() == gimli::DW_TAG_member)
            .map(Member)
            .collect())
    }
}

/// DW_TAG_member
pub struct Member<'a, 'u>(Die<'a, 'u>);

impl<'a, 'u> Member<'a, 'u> {
    pub fn name(&self) -> Result<String, Error> {
        self.0.required_name()
    }

    pub fn member_type(&self) -> Result<Die<'a, 'u>, Error> {
        self.0.type_ref()?.ok_or(Error::MissingAttribute {
            attr: gimli::DW_AT_type,
            offset: self.0.debug_info_offset(),
        })
    }

    /// Byte offset of the member within its struct.
    ///
    /// `None` is the decoder's only failure mode: a missing location
    /// attribute (bit-fields), a location expression other than a single
    /// DW_OP_plus_uconst, or an unhandled attribute form all degrade to
    /// `None` with a warning. Callers must propagate the absence, never
    /// coerce it to zero.
    pub fn byte_offset(&self) -> Result<Option<u64>, Error> {
        let value = match self.0.attr_value(gimli::DW_AT_data_member_location)? {
            Some(value) => value,
            None => {
                warn!(
                    "member at {:#x} has no data_member_location (bit-field?), offset unknown",
                    self.0.debug_info_offset()
                );
                return Ok(None);
            }
        };
        // Plain integer forms cover the common linear-offset encoding
        if let Some(offset) = value.udata_value() {
            return Ok(Some(offset));
        }
        match value {
            AttributeValue::Exprloc(expression) => {
                let mut operations = expression.operations(self.0.encoding());
                match (operations.next(), operations.next()) {
                    (Ok(Some(Operation::PlusConstant { value })), Ok(None)) => Ok(Some(value)),
                    _ => {
                        warn!(
                            "member at {:#x}: location expression is not a single \
                             DW_OP_plus_uconst, offset unknown",
                            self.0.debug_info_offset()
                        );
                        Ok(None)
                    }
                }
            }
            other => {
                warn!(
                    "member at {:#x}: unsupported data_member_location form {:?}, offset unknown",
                    self.0.debug_info_offset(),
                    other
                );
                Ok(None)
            }
        }
    }
}

/// DW_TAG_typedef
pub struct Typedef<'a, 'u>(pub(crate) Die<'a, 'u>);

impl<'a, 'u> Typedef<'a, 'u> {
    pub fn name(&self) -> Result<String, Error> {
        self.0.required_name()
    }

    /// The aliased type, one step
    pub fn referenced_type(&self) -> Result<Die<'a, 'u>, Error> {
        self.0.type_ref()?.ok_or(Error::MissingAttribute {
            attr: gimli::DW_AT_type,
            offset: self.0.debug_info_offset(),
        })
    }

    /// The aliased type with any further typedefs stripped
    pub fn resolved_type(&self) -> Result<Die<'a, 'u>, Error> {
        resolve_typedef(self.referenced_type()?)
    }
}

/// DW_TAG_enumeration_type
pub struct EnumType<'a, 'u>(Die<'a, 'u>);

impl<'a, 'u> EnumType<'a, 'u> {
    pub fn tag_name(&self) -> Result<Option<String>, Error> {
        self.0.name()
    }

    pub fn byte_size(&self) -> Result<u64, Error> {
        self.0.required_udata(gimli::DW_AT_byte_size)
    }

    pub fn debug_info_offset(&self) -> usize {
        self.0.debug_info_offset()
    }

    /// The enum's underlying integer type. Some compilers omit it; that is a
    /// recognized degraded case, not an error.
    pub fn underlying_type(&self) -> Result<Option<Die<'a, 'u>>, Error> {
        self.0.type_ref()
    }
}

/// DW_TAG_array_type
pub struct ArrayType<'a, 'u>(Die<'a, 'u>);

impl<'a, 'u> ArrayType<'a, 'u> {
    pub fn element_type(&self) -> Result<Die<'a, 'u>, Error> {
        self.0.type_ref()?.ok_or(Error::MissingAttribute {
            attr: gimli::DW_AT_type,
            offset: self.0.debug_info_offset(),
        })
    }

    pub fn debug_info_offset(&self) -> usize {
        self.0.debug_info_offset()
    }

    /// Element count, read from the single subrange child's upper bound
    /// (zero-based inclusive, so plus one)
    pub fn length(&self) -> Result<u64, Error> {
        for child in self.0.children()? {
            match child.tag() {
                // gcc and clang emit this for C arrays
                gimli::DW_TAG_subrange_type => {
                    return child
                        .udata(gimli::DW_AT_upper_bound)?
                        .and_then(|upper_bound| upper_bound.checked_add(1))
                        .ok_or(Error::ArrayLength {
                            offset: self.0.debug_info_offset(),
                        });
                }
                // enum-indexed bounds are out of scope
                gimli::DW_TAG_enumeration_type => {
                    return Err(Error::UnsupportedTag {
                        tag: child.tag(),
                        offset: child.debug_info_offset(),
                    });
                }
                _ => {}
            }
        }
        Err(Error::ArrayLength {
            offset: self.0.debug_info_offset(),
        })
    }
}

/// DW_TAG_pointer_type
pub struct PointerType<'a, 'u>(Die<'a, 'u>);

impl<'a, 'u> PointerType<'a, 'u> {
    pub fn byte_size(&self) -> Result<u64, Error> {
        self.0.required_udata(gimli::DW_AT_byte_size)
    }

    /// The pointed-to type; `None` for `void *`
    pub fn pointee_type(&self) -> Result<Option<Die<'a, 'u>>, Error> {
        self.0.type_ref()
    }
}
