use gimli::{AttributeValue, DwAt, DwTag, EndianSlice, RunTimeEndian, UnitOffset};

use crate::error::Error;

/// Concrete gimli reader used throughout the crate
pub type Reader<'a> = EndianSlice<'a, RunTimeEndian>;

/// Handle to one debug-info entry.
///
/// A `Die` is a cheap copyable view: it borrows the loaded DWARF data and
/// re-materializes the underlying entry from its unit offset on each access.
/// The tag is read once at construction so classification never fails after
/// the handle exists.
#[derive(Clone, Copy)]
pub struct Die<'a, 'u> {
    dwarf: &'u gimli::Dwarf<Reader<'a>>,
    unit: &'u gimli::Unit<Reader<'a>>,
    offset: UnitOffset,
    tag: DwTag,
}

impl<'a, 'u> Die<'a, 'u> {
    pub fn new(
        dwarf: &'u gimli::Dwarf<Reader<'a>>,
        unit: &'u gimli::Unit<Reader<'a>>,
        offset: UnitOffset,
    ) -> Result<Self, Error> {
        let tag = unit.entry(offset)?.tag();
        Ok(Self {
            dwarf,
            unit,
            offset,
            tag,
        })
    }

    pub fn tag(&self) -> DwTag {
        self.tag
    }

    /// Offset of this entry within `.debug_info`, for diagnostics and for
    /// synthesizing unique names for anonymous types
    pub fn debug_info_offset(&self) -> usize {
        self.offset
            .to_debug_info_offset(&self.unit.header)
            .map_or(self.offset.0, |offset| offset.0)
    }

    /// Encoding parameters of the containing unit (needed to decode embedded
    /// location expressions)
    pub fn encoding(&self) -> gimli::Encoding {
        self.unit.encoding()
    }

    pub fn attr_value(&self, attr: DwAt) -> Result<Option<AttributeValue<Reader<'a>>>, Error> {
        Ok(self.unit.entry(self.offset)?.attr_value(attr)?)
    }

    /// The entry's DW_AT_name, resolved through the string sections
    pub fn name(&self) -> Result<Option<String>, Error> {
        match self.attr_value(gimli::DW_AT_name)? {
            Some(value) => {
                let raw = self.dwarf.attr_string(self.unit, value)?;
                Ok(Some(raw.to_string()?.to_owned()))
            }
            None => Ok(None),
        }
    }

    /// A required DW_AT_name; absence is fatal
    pub fn required_name(&self) -> Result<String, Error> {
        self.name()?.ok_or(Error::MissingAttribute {
            attr: gimli::DW_AT_name,
            offset: self.debug_info_offset(),
        })
    }

    /// An unsigned integer attribute in any of its constant forms
    pub fn udata(&self, attr: DwAt) -> Result<Option<u64>, Error> {
        Ok(self.attr_value(attr)?.and_then(|value| value.udata_value()))
    }

    /// A required unsigned integer attribute; absence is fatal
    pub fn required_udata(&self, attr: DwAt) -> Result<u64, Error> {
        self.udata(attr)?.ok_or(Error::MissingAttribute {
            attr,
            offset: self.debug_info_offset(),
        })
    }

    /// Follow the entry's DW_AT_type reference, if any.
    ///
    /// Same-unit references are the only kind this tool resolves; a reference
    /// in any other form is fatal rather than guessed at.
    pub fn type_ref(&self) -> Result<Option<Die<'a, 'u>>, Error> {
        let value = match self.attr_value(gimli::DW_AT_type)? {
            Some(value) => value,
            None => return Ok(None),
        };
        let offset = match value {
            AttributeValue::UnitRef(offset) => offset,
            AttributeValue::DebugInfoRef(offset) => offset
                .to_unit_offset(&self.unit.header)
                .ok_or(Error::TypeRef {
                    offset: self.debug_info_offset(),
                })?,
            _ => {
                return Err(Error::TypeRef {
                    offset: self.debug_info_offset(),
                })
            }
        };
        Ok(Some(Die::new(self.dwarf, self.unit, offset)?))
    }

    /// The entry's direct children, in declaration order
    pub fn children(&self) -> Result<Vec<Die<'a, 'u>>, Error> {
        let mut tree = self.unit.entries_tree(Some(self.offset))?;
        let root = tree.root()?;
        let mut iter = root.children();
        let mut children = Vec::new();
        while let Some(node) = iter.next()? {
            let entry = node.entry();
            children.push(Die {
                dwarf: self.dwarf,
                unit: self.unit,
                offset: entry.offset(),
                tag: entry.tag(),
            });
        }
        Ok(children)
    }
}

impl std::fmt::Debug for Die<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Die")
            .field("tag", &self.tag)
            .field("offset", &self.debug_info_offset())
            .finish()
    }
}
