use goblin::Object;
use log::debug;

use crate::error::Error;

/// Address and size of a global symbol, as recorded in the symbol table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Memory address (st_value)
    pub address: u64,
    /// Symbol size in bytes (st_size)
    pub size: u64,
}

/// Look up a global symbol by name in an ELF symbol table.
///
/// Returns `Ok(None)` when the symbol table exists but has no entry with the
/// requested name; the caller decides whether that is fatal.
pub fn find_symbol(data: &[u8], name: &str) -> Result<Option<Symbol>, Error> {
    match Object::parse(data)? {
        Object::Elf(elf) => {
            for sym in elf.syms.iter() {
                let Some(sym_name) = elf.strtab.get_at(sym.st_name) else {
                    continue;
                };
                if sym_name == name {
                    debug!(
                        "symbol {} found: address {:#x}, size {}",
                        name, sym.st_value, sym.st_size
                    );
                    return Ok(Some(Symbol {
                        address: sym.st_value,
                        size: sym.st_size,
                    }));
                }
            }
            Ok(None)
        }
        _ => Err(Error::UnsupportedFormat),
    }
}
