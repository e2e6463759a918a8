//! ELF32 program loading: section-based, not program-header-based.

use std::fs;
use std::path::Path;

use rv32_emu::Device;

use crate::error::LoaderError;
use crate::header::{
    ElfHeader, STT_FUNC, SHF_EXECINSTR, SHT_PROGBITS, SHT_STRTAB, SHT_SYMTAB, name_at,
    section_headers, symbols,
};

/// What loading an ELF image produced, beyond writing its sections into
/// the device's address space.
pub struct LoadedImage {
    pub entry: u32,
    /// Highest `addr + size` over executable (`SHF_EXECINSTR`) sections;
    /// bounds the decoded-instruction cache.
    pub prog_end: u32,
    /// The resolved `_exit` symbol's value, used by the outer run loop to
    /// detect termination. Not consulted by the core itself.
    pub exit_addr: u32,
}

/// Load the ELF image at `path` into `device`'s address space and return
/// the watermark/symbol info needed to drive it.
pub fn load_elf(device: &mut Device, path: impl AsRef<Path>) -> Result<LoadedImage, LoaderError> {
    let data = fs::read(path)?;
    load_elf_bytes(device, &data)
}

fn load_elf_bytes(device: &mut Device, data: &[u8]) -> Result<LoadedImage, LoaderError> {
    log::debug!("parsing ELF image ({} bytes)", data.len());
    let header = ElfHeader::parse(data)?;
    log::debug!("entry={:#010x} shnum={}", header.entry, header.shnum);
    let sections = section_headers(data, &header)?;

    let shstrtab_hdr = sections
        .get(header.shstrndx as usize)
        .ok_or(LoaderError::MissingSectionNameTable)?;
    let shstrtab_end = shstrtab_hdr.offset as usize + shstrtab_hdr.size as usize;
    let shstrtab = data
        .get(shstrtab_hdr.offset as usize..shstrtab_end)
        .ok_or(LoaderError::Truncated { wanted: shstrtab_end, have: data.len() })?;

    let mut prog_end = 0u32;
    let mut strtab: Option<&[u8]> = None;
    let mut symtab: Option<&[u8]> = None;

    for section in &sections {
        let name = name_at(shstrtab, section.name_off);

        if section.sh_type == SHT_PROGBITS && section.size > 0 {
            let end = section.offset as usize + section.size as usize;
            let bytes = data
                .get(section.offset as usize..end)
                .ok_or(LoaderError::Truncated { wanted: end, have: data.len() })?;
            log::trace!(
                "section '{name}': {} bytes at {:#010x} (file offset {:#x})",
                section.size,
                section.addr,
                section.offset
            );
            device
                .address_space_mut()
                .write_bytes(section.addr, bytes)
                .map_err(|_| LoaderError::SectionOutOfBounds {
                    name: name.clone(),
                    addr: section.addr,
                    size: section.size,
                })?;
            if section.flags & SHF_EXECINSTR != 0 {
                prog_end = prog_end.max(section.addr + section.size);
                log::trace!("    -> executable, prog_end now {prog_end:#010x}");
            }
        } else if section.size > 0 {
            log::trace!("    -> skipping non-PROGBITS section '{name}'");
        }

        if section.sh_type == SHT_STRTAB && name == ".strtab" {
            let end = section.offset as usize + section.size as usize;
            strtab = Some(
                data.get(section.offset as usize..end)
                    .ok_or(LoaderError::Truncated { wanted: end, have: data.len() })?,
            );
        }
        if section.sh_type == SHT_SYMTAB && name == ".symtab" {
            let end = section.offset as usize + section.size as usize;
            symtab = Some(
                data.get(section.offset as usize..end)
                    .ok_or(LoaderError::Truncated { wanted: end, have: data.len() })?,
            );
        }
    }

    let strtab = strtab.ok_or(LoaderError::MissingSymbolTable)?;
    let symtab = symtab.ok_or(LoaderError::MissingSymbolTable)?;

    let syms = symbols(symtab)?;
    log::debug!("resolving _exit from {} symbol(s)", syms.len());
    let exit_addr = syms
        .into_iter()
        .find(|sym| sym.info & 0xF == STT_FUNC && name_at(strtab, sym.name_off) == "_exit")
        .map(|sym| sym.value)
        .ok_or(LoaderError::MissingExitSymbol)?;
    log::debug!("_exit resolved to {exit_addr:#010x}");

    if prog_end > 0 {
        device.build_decoded_cache(prog_end);
        log::debug!("decoded-instruction cache built up to {prog_end:#010x}");
    }

    Ok(LoadedImage {
        entry: header.entry,
        prog_end,
        exit_addr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_non_elf_file() {
        let mut device = Device::new(0x1000, 0x0800_0000, 0x1000, 0x2000_0000, 0x1000, 0x0100_0000);
        let err = load_elf_bytes(&mut device, b"not an elf").unwrap_err();
        assert!(matches!(err, LoaderError::Truncated { .. } | LoaderError::BadMagic));
    }
}
