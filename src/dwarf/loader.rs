use std::borrow::Cow;

use gimli::RunTimeEndian;
use object::{Object, ObjectSection};

use crate::dwarf::Reader;
use crate::error::Error;

/// Pick the runtime endianness matching the object file
pub fn endianness(file: &object::File) -> RunTimeEndian {
    if file.is_little_endian() {
        RunTimeEndian::Little
    } else {
        RunTimeEndian::Big
    }
}

/// Load all DWARF sections out of an object file.
///
/// Sections the file does not carry load as empty slices; whether any debug
/// info is actually present is decided later by [`load_units`] coming back
/// empty. The returned `Dwarf` borrows the file's data; callers turn it into
/// a `Dwarf<Reader>` with [`gimli::Dwarf::borrow`].
pub fn load_dwarf<'data>(
    file: &object::File<'data>,
) -> Result<gimli::Dwarf<Cow<'data, [u8]>>, Error> {
    let load_section = |id: gimli::SectionId| -> Result<Cow<'data, [u8]>, gimli::Error> {
        Ok(file
            .section_by_name(id.name())
            .and_then(|section| section.data().ok())
            .map(Cow::Borrowed)
            .unwrap_or(Cow::Borrowed(&[])))
    };
    Ok(gimli::Dwarf::load(load_section)?)
}

/// Materialize every compilation unit up front.
///
/// The extraction is a pure walk over an in-memory tree, so all units are
/// parsed before the walk begins; an empty result means the binary has no
/// debug information.
pub fn load_units<'a>(
    dwarf: &gimli::Dwarf<Reader<'a>>,
) -> Result<Vec<gimli::Unit<Reader<'a>>>, Error> {
    let mut units = Vec::new();
    let mut headers = dwarf.units();
    while let Some(header) = headers.next()? {
        units.push(dwarf.unit(header)?);
    }
    Ok(units)
}
