//! The type-graph resolver: walks the debug-info entries a global's type
//! transitively depends on and flattens them into a [`TypeDict`].

use log::{info, warn};

use crate::dwarf::{
    endianness, load_dwarf, load_units, resolve_typedef, BaseType, Die, Reader, TypeView,
};
use crate::error::Error;
use crate::meta::{BaseEncoding, MemberMeta, TypeDict, TypeMeta};
use crate::symbols::find_symbol;

/// Result of a successful extraction: the display name of the variable's
/// declared type, and the dictionary of everything it depends on
#[derive(Debug)]
pub struct Extraction {
    pub type_name: String,
    pub types: TypeDict,
}

/// Extract the type dictionary for a named global out of an ELF binary.
///
/// Locates the symbol, loads the DWARF sections, finds the matching variable
/// entry and walks its type graph.
pub fn dump(data: &[u8], var_name: &str) -> Result<Extraction, Error> {
    let symbol = find_symbol(data, var_name)?
        .ok_or_else(|| Error::SymbolNotFound(var_name.to_owned()))?;
    info!(
        "{} is at address {:#x}, size {}",
        var_name, symbol.address, symbol.size
    );

    let file = object::File::parse(data)?;
    let endian = endianness(&file);
    let sections = load_dwarf(&file)?;
    let dwarf = sections.borrow(|section| gimli::EndianSlice::new(section, endian));
    extract(&dwarf, var_name)
}

/// Extract the type dictionary from already-loaded DWARF data
pub fn extract(dwarf: &gimli::Dwarf<Reader<'_>>, var_name: &str) -> Result<Extraction, Error> {
    let units = load_units(dwarf)?;
    if units.is_empty() {
        return Err(Error::NoDebugInfo);
    }
    let variable = find_variable(dwarf, &units, var_name)?
        .ok_or_else(|| Error::VariableNotFound(var_name.to_owned()))?;
    let var_type = variable.type_ref()?.ok_or(Error::MissingAttribute {
        attr: gimli::DW_AT_type,
        offset: variable.debug_info_offset(),
    })?;
    process_top_type(var_type)
}

/// Depth-first search over every unit for a variable entry with the given
/// name. Entries whose names cannot be resolved are skipped.
fn find_variable<'a, 'u>(
    dwarf: &'u gimli::Dwarf<Reader<'a>>,
    units: &'u [gimli::Unit<Reader<'a>>],
    name: &str,
) -> Result<Option<Die<'a, 'u>>, Error> {
    for unit in units {
        let mut entries = unit.entries();
        while let Some((_, entry)) = entries.next_dfs()? {
            if entry.tag() != gimli::DW_TAG_variable {
                continue;
            }
            let die = Die::new(dwarf, unit, entry.offset())?;
            if matches!(die.name(), Ok(Some(n)) if n == name) {
                return Ok(Some(die));
            }
        }
    }
    Ok(None)
}

/// Walk the top-level type: the resolved type must be a struct. Members are
/// registered first; the top struct itself is inserted last, under the
/// display name of the *declared* type (the alias name if the variable was
/// declared through a typedef).
pub fn process_top_type(original: Die) -> Result<Extraction, Error> {
    let resolved = resolve_typedef(original)?;
    let top = match TypeView::classify(resolved) {
        Ok(TypeView::Struct(structure)) => structure,
        _ => {
            return Err(Error::TopTypeNotStruct {
                tag: resolved.tag(),
            })
        }
    };

    let display_name = type_name(original)?;
    let mut types = TypeDict::new();
    let mut members = Vec::new();
    for member in top.members()? {
        let member_type = member.member_type()?;
        let member_type_name = type_name(member_type)?;
        register_with_name(member_type, &member_type_name, &mut types)?;
        members.push(MemberMeta {
            ty: member_type_name,
            name: member.name()?,
            offset: member.byte_offset()?,
            size: type_size(member_type)?,
        });
    }
    types.insert(TypeMeta::Struct {
        name: display_name.clone(),
        size: top.byte_size()?,
        members,
    });

    Ok(Extraction {
        type_name: display_name,
        types,
    })
}

/// Ensure `name` is present in the dictionary, inserting it and everything
/// it depends on exactly once, dependencies first.
///
/// The name guard up front makes registration idempotent per name and is the
/// recursion bound for repeated references to the same named type.
pub fn register_with_name(die: Die, name: &str, dict: &mut TypeDict) -> Result<(), Error> {
    if dict.contains(name) {
        return Ok(());
    }
    match TypeView::classify(die)? {
        // A typedef is registered under its own alias name but with the
        // underlying descriptor kind
        TypeView::Typedef(typedef) => register_with_name(typedef.resolved_type()?, name, dict),
        TypeView::Base(base) => {
            let encoding = base_encoding(&base)?;
            dict.insert(TypeMeta::Base {
                name: name.to_owned(),
                size: base.byte_size()?,
                encoding,
            });
            Ok(())
        }
        TypeView::Enum(enumeration) => {
            let underlying_type = match enumeration.underlying_type()? {
                Some(underlying) => {
                    // the underlying type goes in first so the consumer sees
                    // it before the enum that names it
                    let underlying_name = type_name(underlying)?;
                    register_with_name(underlying, &underlying_name, dict)?;
                    Some(underlying_name)
                }
                None => {
                    warn!(
                        "enum at {:#x} has no underlying type in the debug info",
                        enumeration.debug_info_offset()
                    );
                    None
                }
            };
            dict.insert(TypeMeta::Enum {
                name: name.to_owned(),
                size: enumeration.byte_size()?,
                underlying_type,
            });
            Ok(())
        }
        TypeView::Struct(structure) => {
            // The empty shell goes in before the members are walked: a
            // struct that transitively reaches itself terminates on the name
            // guard instead of recursing forever.
            dict.insert(TypeMeta::Struct {
                name: name.to_owned(),
                size: structure.byte_size()?,
                members: Vec::new(),
            });
            for member in structure.members()? {
                let member_type = member.member_type()?;
                let member_type_name = type_name(member_type)?;
                register_with_name(member_type, &member_type_name, dict)?;
                dict.push_member(
                    name,
                    MemberMeta {
                        ty: member_type_name,
                        name: member.name()?,
                        offset: member.byte_offset()?,
                        size: type_size(member_type)?,
                    },
                );
            }
            Ok(())
        }
        TypeView::Array(array) => {
            // Arrays are transparent: the element type is registered in the
            // array's place. A typedef may itself resolve to an array.
            let element = array.element_type()?;
            let element_name = type_name(element)?;
            register_with_name(element, &element_name, dict)
        }
        // Pointers are resolved only for naming, never expanded
        TypeView::Pointer(_) => Ok(()),
    }
}

/// Canonical display name for a type entry
pub fn type_name(die: Die) -> Result<String, Error> {
    match TypeView::classify(die)? {
        TypeView::Typedef(typedef) => typedef.name(),
        TypeView::Base(base) => base.name(),
        TypeView::Array(array) => {
            let element = array.element_type()?;
            Ok(format!("{}[{}]", type_name(element)?, array.length()?))
        }
        TypeView::Struct(structure) => Ok(match structure.tag_name()? {
            Some(tag) => format!("struct {tag}"),
            None => format!("struct <anon@{:#x}>", structure.debug_info_offset()),
        }),
        TypeView::Enum(enumeration) => Ok(match enumeration.tag_name()? {
            Some(tag) => format!("enum {tag}"),
            None => format!("enum <anon@{:#x}>", enumeration.debug_info_offset()),
        }),
        TypeView::Pointer(pointer) => Ok(match pointer.pointee_type()? {
            Some(pointee) => format!("{}*", type_name(pointee)?),
            None => "void*".to_owned(),
        }),
    }
}

/// Byte size of a type entry
pub fn type_size(die: Die) -> Result<u64, Error> {
    match TypeView::classify(die)? {
        TypeView::Base(base) => base.byte_size(),
        TypeView::Struct(structure) => structure.byte_size(),
        TypeView::Enum(enumeration) => enumeration.byte_size(),
        TypeView::Typedef(typedef) => type_size(typedef.resolved_type()?),
        TypeView::Array(array) => {
            let element = resolve_typedef(array.element_type()?)?;
            type_size(element)?
                .checked_mul(array.length()?)
                .ok_or(Error::ArrayLength {
                    offset: array.debug_info_offset(),
                })
        }
        TypeView::Pointer(pointer) => pointer.byte_size(),
    }
}

/// Classify a base type's encoding; anything outside the signed/unsigned/
/// floating set is fatal
fn base_encoding(base: &BaseType) -> Result<BaseEncoding, Error> {
    match base.encoding()? {
        gimli::DW_ATE_float => Ok(BaseEncoding::FloatingPoint),
        gimli::DW_ATE_signed | gimli::DW_ATE_signed_char => Ok(BaseEncoding::SignedIntegral),
        gimli::DW_ATE_unsigned | gimli::DW_ATE_unsigned_char => Ok(BaseEncoding::UnsignedIntegral),
        encoding => Err(Error::UnknownBaseEncoding {
            name: base.name()?,
            encoding,
        }),
    }
}
