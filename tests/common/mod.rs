//! Helpers for building in-memory DWARF fixtures with gimli's write API.

use std::collections::HashMap;

use gimli::write::{AttributeValue, DwarfUnit, EndianVec, Expression, Sections, UnitEntryId};
use gimli::{RunTimeEndian, SectionId};

use structdump::dwarf::{Die, Reader};

/// A freshly encoded set of DWARF sections
pub struct Fixture {
    sections: HashMap<SectionId, Vec<u8>>,
}

impl Fixture {
    /// Encode the unit into section bytes
    pub fn build(dwarf: &mut DwarfUnit) -> Self {
        let mut sections = Sections::new(EndianVec::new(RunTimeEndian::Little));
        dwarf.write(&mut sections).expect("encoding DWARF sections");
        let mut map = HashMap::new();
        sections
            .for_each(|id, data| -> Result<(), gimli::Error> {
                map.insert(id, data.slice().to_vec());
                Ok(())
            })
            .expect("collecting DWARF sections");
        Self { sections: map }
    }

    /// Load the encoded sections back through gimli's read API
    pub fn load(&self) -> gimli::Dwarf<Reader<'_>> {
        gimli::Dwarf::load(|id| {
            Ok::<_, gimli::Error>(gimli::EndianSlice::new(
                self.sections.get(&id).map(Vec::as_slice).unwrap_or(&[]),
                RunTimeEndian::Little,
            ))
        })
        .expect("loading DWARF sections")
    }
}

/// An empty DWARF unit with the usual C toolchain encoding
pub fn new_unit() -> DwarfUnit {
    DwarfUnit::new(gimli::Encoding {
        format: gimli::Format::Dwarf32,
        version: 4,
        address_size: 8,
    })
}

pub fn add_base_type(
    dwarf: &mut DwarfUnit,
    name: &str,
    size: u64,
    encoding: gimli::DwAte,
) -> UnitEntryId {
    let root = dwarf.unit.root();
    let id = dwarf.unit.add(root, gimli::DW_TAG_base_type);
    let die = dwarf.unit.get_mut(id);
    die.set(
        gimli::DW_AT_name,
        AttributeValue::String(name.as_bytes().to_vec()),
    );
    die.set(gimli::DW_AT_byte_size, AttributeValue::Udata(size));
    die.set(gimli::DW_AT_encoding, AttributeValue::Encoding(encoding));
    id
}

pub fn add_struct(dwarf: &mut DwarfUnit, name: Option<&str>, size: u64) -> UnitEntryId {
    let root = dwarf.unit.root();
    let id = dwarf.unit.add(root, gimli::DW_TAG_structure_type);
    let die = dwarf.unit.get_mut(id);
    if let Some(name) = name {
        die.set(
            gimli::DW_AT_name,
            AttributeValue::String(name.as_bytes().to_vec()),
        );
    }
    die.set(gimli::DW_AT_byte_size, AttributeValue::Udata(size));
    id
}

/// How a member's DW_AT_data_member_location is encoded
pub enum MemberLoc {
    /// No location attribute at all
    Missing,
    /// Plain integer constant
    Udata(u64),
    /// One-byte constant form
    Data1(u8),
    /// An embedded expression program, raw bytes
    Expr(Vec<u8>),
}

pub fn add_member(
    dwarf: &mut DwarfUnit,
    parent: UnitEntryId,
    name: &str,
    ty: UnitEntryId,
    loc: MemberLoc,
) -> UnitEntryId {
    let id = dwarf.unit.add(parent, gimli::DW_TAG_member);
    let die = dwarf.unit.get_mut(id);
    die.set(
        gimli::DW_AT_name,
        AttributeValue::String(name.as_bytes().to_vec()),
    );
    die.set(gimli::DW_AT_type, AttributeValue::UnitRef(ty));
    match loc {
        MemberLoc::Missing => {}
        MemberLoc::Udata(offset) => die.set(
            gimli::DW_AT_data_member_location,
            AttributeValue::Udata(offset),
        ),
        MemberLoc::Data1(offset) => die.set(
            gimli::DW_AT_data_member_location,
            AttributeValue::Data1(offset),
        ),
        MemberLoc::Expr(bytes) => die.set(
            gimli::DW_AT_data_member_location,
            AttributeValue::Exprloc(Expression::raw(bytes)),
        ),
    }
    id
}

/// Repoint an already-added entry's DW_AT_type, for building reference
/// cycles that cannot be declared front-to-back
pub fn set_type(dwarf: &mut DwarfUnit, id: UnitEntryId, ty: UnitEntryId) {
    dwarf
        .unit
        .get_mut(id)
        .set(gimli::DW_AT_type, AttributeValue::UnitRef(ty));
}

pub fn add_typedef(dwarf: &mut DwarfUnit, name: &str, ty: UnitEntryId) -> UnitEntryId {
    let root = dwarf.unit.root();
    let id = dwarf.unit.add(root, gimli::DW_TAG_typedef);
    let die = dwarf.unit.get_mut(id);
    die.set(
        gimli::DW_AT_name,
        AttributeValue::String(name.as_bytes().to_vec()),
    );
    die.set(gimli::DW_AT_type, AttributeValue::UnitRef(ty));
    id
}

pub fn add_enum(
    dwarf: &mut DwarfUnit,
    name: Option<&str>,
    size: u64,
    underlying: Option<UnitEntryId>,
) -> UnitEntryId {
    let root = dwarf.unit.root();
    let id = dwarf.unit.add(root, gimli::DW_TAG_enumeration_type);
    let die = dwarf.unit.get_mut(id);
    if let Some(name) = name {
        die.set(
            gimli::DW_AT_name,
            AttributeValue::String(name.as_bytes().to_vec()),
        );
    }
    die.set(gimli::DW_AT_byte_size, AttributeValue::Udata(size));
    if let Some(underlying) = underlying {
        die.set(gimli::DW_AT_type, AttributeValue::UnitRef(underlying));
    }
    id
}

/// An array of `upper_bound + 1` elements, bounded by a subrange child the
/// way gcc emits C arrays
pub fn add_array(dwarf: &mut DwarfUnit, element: UnitEntryId, upper_bound: u64) -> UnitEntryId {
    let root = dwarf.unit.root();
    let id = dwarf.unit.add(root, gimli::DW_TAG_array_type);
    dwarf
        .unit
        .get_mut(id)
        .set(gimli::DW_AT_type, AttributeValue::UnitRef(element));
    let subrange = dwarf.unit.add(id, gimli::DW_TAG_subrange_type);
    dwarf
        .unit
        .get_mut(subrange)
        .set(gimli::DW_AT_upper_bound, AttributeValue::Udata(upper_bound));
    id
}

/// An array whose subrange child carries no upper bound, as a compiler may
/// emit for a flexible array member
pub fn add_array_without_bound(dwarf: &mut DwarfUnit, element: UnitEntryId) -> UnitEntryId {
    let root = dwarf.unit.root();
    let id = dwarf.unit.add(root, gimli::DW_TAG_array_type);
    dwarf
        .unit
        .get_mut(id)
        .set(gimli::DW_AT_type, AttributeValue::UnitRef(element));
    dwarf.unit.add(id, gimli::DW_TAG_subrange_type);
    id
}

/// An array bounded by an enumeration child instead of a subrange
pub fn add_array_with_enum_bound(dwarf: &mut DwarfUnit, element: UnitEntryId) -> UnitEntryId {
    let root = dwarf.unit.root();
    let id = dwarf.unit.add(root, gimli::DW_TAG_array_type);
    dwarf
        .unit
        .get_mut(id)
        .set(gimli::DW_AT_type, AttributeValue::UnitRef(element));
    dwarf.unit.add(id, gimli::DW_TAG_enumeration_type);
    id
}

pub fn add_pointer(
    dwarf: &mut DwarfUnit,
    pointee: Option<UnitEntryId>,
    size: u64,
) -> UnitEntryId {
    let root = dwarf.unit.root();
    let id = dwarf.unit.add(root, gimli::DW_TAG_pointer_type);
    let die = dwarf.unit.get_mut(id);
    die.set(gimli::DW_AT_byte_size, AttributeValue::Udata(size));
    if let Some(pointee) = pointee {
        die.set(gimli::DW_AT_type, AttributeValue::UnitRef(pointee));
    }
    id
}

pub fn add_variable(dwarf: &mut DwarfUnit, name: &str, ty: UnitEntryId) -> UnitEntryId {
    let root = dwarf.unit.root();
    let id = dwarf.unit.add(root, gimli::DW_TAG_variable);
    let die = dwarf.unit.get_mut(id);
    die.set(
        gimli::DW_AT_name,
        AttributeValue::String(name.as_bytes().to_vec()),
    );
    die.set(gimli::DW_AT_type, AttributeValue::UnitRef(ty));
    id
}

/// Raw bytes of a single DW_OP_plus_uconst with a small operand
pub fn plus_uconst(offset: u8) -> Vec<u8> {
    assert!(offset < 0x80, "operand must fit one ULEB byte");
    vec![gimli::DW_OP_plus_uconst.0, offset]
}

/// The canonical fixture: `struct Point { int x; int y; }` behind a global
/// named `g_point`
pub fn point_fixture() -> Fixture {
    let mut dwarf = new_unit();
    let int = add_base_type(&mut dwarf, "int", 4, gimli::DW_ATE_signed);
    let point = add_struct(&mut dwarf, Some("Point"), 8);
    add_member(&mut dwarf, point, "x", int, MemberLoc::Udata(0));
    add_member(&mut dwarf, point, "y", int, MemberLoc::Udata(4));
    add_variable(&mut dwarf, "g_point", point);
    Fixture::build(&mut dwarf)
}

/// Find a DIE with the given tag and name, for registration-level tests
pub fn find_die_by_name<'a, 'u>(
    dwarf: &'u gimli::Dwarf<Reader<'a>>,
    unit: &'u gimli::Unit<Reader<'a>>,
    tag: gimli::DwTag,
    name: &str,
) -> Die<'a, 'u> {
    let mut entries = unit.entries();
    while let Some((_, entry)) = entries.next_dfs().expect("walking entries") {
        if entry.tag() != tag {
            continue;
        }
        let die = Die::new(dwarf, unit, entry.offset()).expect("materializing entry");
        if die.name().expect("reading name").as_deref() == Some(name) {
            return die;
        }
    }
    panic!("no {} named {} in fixture", tag, name);
}

/// Names of the dictionary entries in insertion order, from the JSON output
pub fn json_names(types: &structdump::TypeDict) -> Vec<String> {
    let value: serde_json::Value =
        serde_json::from_str(&types.to_json().expect("serializing dict")).expect("parsing JSON");
    value
        .as_array()
        .expect("output is an array")
        .iter()
        .map(|entry| entry["name"].as_str().expect("entry has a name").to_owned())
        .collect()
}
