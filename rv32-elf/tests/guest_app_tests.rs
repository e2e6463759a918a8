//! Integration tests for ELF loading: builds minimal ELF32 images
//! byte-by-byte (mirroring the reference crate's simple-ELF generator
//! style) rather than shipping binary fixtures.

use rv32_emu::Device;
use rv32_inst::encode;

const ROM_ORIGIN: u32 = 0x0800_0000;

/// Build a minimal ELF32/RISC-V image: a `.text` PROGBITS section holding
/// `code`, plus `.symtab`/`.strtab`/`.shstrtab` so `_exit` resolves.
fn build_elf_image(code: &[u8], exit_value: u32) -> Vec<u8> {
    // Section name strings.
    let mut shstrtab = vec![0u8];
    let text_name = shstrtab.len() as u32;
    shstrtab.extend_from_slice(b".text\0");
    let symtab_name = shstrtab.len() as u32;
    shstrtab.extend_from_slice(b".symtab\0");
    let strtab_name = shstrtab.len() as u32;
    shstrtab.extend_from_slice(b".strtab\0");
    let shstrtab_name = shstrtab.len() as u32;
    shstrtab.extend_from_slice(b".shstrtab\0");

    // Symbol name strings.
    let mut strtab = vec![0u8];
    let exit_name = strtab.len() as u32;
    strtab.extend_from_slice(b"_exit\0");

    // Symbol table: mandatory null entry, then `_exit`.
    let mut symtab = Vec::new();
    symtab.extend_from_slice(&sym_entry(0, 0, 0));
    symtab.extend_from_slice(&sym_entry(exit_name, exit_value, 2 /* STT_FUNC */));

    let header_size = 52u32;
    let text_off = header_size;
    let symtab_off = text_off + code.len() as u32;
    let strtab_off = symtab_off + symtab.len() as u32;
    let shstrtab_off = strtab_off + strtab.len() as u32;
    let shoff = shstrtab_off + shstrtab.len() as u32;

    let mut file = Vec::new();
    file.extend_from_slice(&elf_header(ROM_ORIGIN, shoff, 5, 4));
    file.extend_from_slice(code);
    file.extend_from_slice(&symtab);
    file.extend_from_slice(&strtab);
    file.extend_from_slice(&shstrtab);

    file.extend_from_slice(&shdr(0, 0, 0, 0, 0, 0, 0)); // NULL
    file.extend_from_slice(&shdr(text_name, 1 /* PROGBITS */, 0x4 /* EXECINSTR */, ROM_ORIGIN, text_off, code.len() as u32, 0));
    file.extend_from_slice(&shdr(symtab_name, 2 /* SYMTAB */, 0, 0, symtab_off, symtab.len() as u32, 3));
    file.extend_from_slice(&shdr(strtab_name, 3 /* STRTAB */, 0, 0, strtab_off, strtab.len() as u32, 0));
    file.extend_from_slice(&shdr(shstrtab_name, 3 /* STRTAB */, 0, 0, shstrtab_off, shstrtab.len() as u32, 0));

    file
}

fn elf_header(entry: u32, shoff: u32, shnum: u16, shstrndx: u16) -> [u8; 52] {
    let mut h = [0u8; 52];
    h[0..4].copy_from_slice(b"\x7fELF");
    h[4] = 1; // ELFCLASS32
    h[5] = 1; // little-endian
    h[18..20].copy_from_slice(&0xF3u16.to_le_bytes()); // e_machine: RISC-V
    h[24..28].copy_from_slice(&entry.to_le_bytes());
    h[32..36].copy_from_slice(&shoff.to_le_bytes());
    h[46..48].copy_from_slice(&40u16.to_le_bytes()); // e_shentsize
    h[48..50].copy_from_slice(&shnum.to_le_bytes());
    h[50..52].copy_from_slice(&shstrndx.to_le_bytes());
    h
}

fn shdr(name: u32, sh_type: u32, flags: u32, addr: u32, offset: u32, size: u32, link: u32) -> [u8; 40] {
    let mut s = [0u8; 40];
    s[0..4].copy_from_slice(&name.to_le_bytes());
    s[4..8].copy_from_slice(&sh_type.to_le_bytes());
    s[8..12].copy_from_slice(&flags.to_le_bytes());
    s[12..16].copy_from_slice(&addr.to_le_bytes());
    s[16..20].copy_from_slice(&offset.to_le_bytes());
    s[20..24].copy_from_slice(&size.to_le_bytes());
    s[24..28].copy_from_slice(&link.to_le_bytes());
    s
}

fn sym_entry(name: u32, value: u32, info: u8) -> [u8; 16] {
    let mut e = [0u8; 16];
    e[0..4].copy_from_slice(&name.to_le_bytes());
    e[4..8].copy_from_slice(&value.to_le_bytes());
    e[12] = info;
    e
}

fn fresh_device() -> Device {
    Device::new(0x4000, ROM_ORIGIN, 0x1000, 0x2000_0000, 0x1000, 0x0100_0000)
}

#[test]
fn loads_progbits_sections_and_resolves_exit() {
    let addi = encode::itype(0x13, 0, 1, 0, 1);
    let mut code = Vec::new();
    code.extend_from_slice(&addi.to_le_bytes());
    code.extend_from_slice(&addi.to_le_bytes());

    let image = build_elf_image(&code, ROM_ORIGIN + 4);
    let mut device = fresh_device();
    let loaded = rv32_elf::load_elf(&mut device, write_temp(&image)).unwrap();

    assert_eq!(loaded.entry, ROM_ORIGIN);
    assert_eq!(loaded.prog_end, ROM_ORIGIN + 8);
    assert_eq!(loaded.exit_addr, ROM_ORIGIN + 4);
    assert_eq!(device.read(ROM_ORIGIN, 4).unwrap(), addi.to_le_bytes());
}

#[test]
fn loaded_program_executes_through_the_device() {
    let addi = encode::itype(0x13, 0, 1, 0, 5);
    let image = build_elf_image(&addi.to_le_bytes(), ROM_ORIGIN);
    let mut device = fresh_device();
    rv32_elf::load_elf(&mut device, write_temp(&image)).unwrap();

    device.step().unwrap();
    assert_eq!(device.reg(1), 5);
}

#[test]
fn missing_exit_symbol_is_reported() {
    // A .symtab/.strtab pair with no `_exit` entry at all.
    let mut strtab = vec![0u8];
    let other_name = strtab.len() as u32;
    strtab.extend_from_slice(b"main\0");
    let mut symtab = Vec::new();
    symtab.extend_from_slice(&sym_entry(0, 0, 0));
    symtab.extend_from_slice(&sym_entry(other_name, ROM_ORIGIN, 2));

    let mut shstrtab = vec![0u8];
    let text_name = shstrtab.len() as u32;
    shstrtab.extend_from_slice(b".text\0");
    let symtab_name = shstrtab.len() as u32;
    shstrtab.extend_from_slice(b".symtab\0");
    let strtab_name = shstrtab.len() as u32;
    shstrtab.extend_from_slice(b".strtab\0");
    let shstrtab_name = shstrtab.len() as u32;
    shstrtab.extend_from_slice(b".shstrtab\0");

    let code = [0u8; 4];
    let header_size = 52u32;
    let text_off = header_size;
    let symtab_off = text_off + code.len() as u32;
    let strtab_off = symtab_off + symtab.len() as u32;
    let shstrtab_off = strtab_off + strtab.len() as u32;
    let shoff = shstrtab_off + shstrtab.len() as u32;

    let mut file = Vec::new();
    file.extend_from_slice(&elf_header(ROM_ORIGIN, shoff, 5, 4));
    file.extend_from_slice(&code);
    file.extend_from_slice(&symtab);
    file.extend_from_slice(&strtab);
    file.extend_from_slice(&shstrtab);
    file.extend_from_slice(&shdr(0, 0, 0, 0, 0, 0, 0));
    file.extend_from_slice(&shdr(text_name, 1, 0x4, ROM_ORIGIN, text_off, code.len() as u32, 0));
    file.extend_from_slice(&shdr(symtab_name, 2, 0, 0, symtab_off, symtab.len() as u32, 3));
    file.extend_from_slice(&shdr(strtab_name, 3, 0, 0, strtab_off, strtab.len() as u32, 0));
    file.extend_from_slice(&shdr(shstrtab_name, 3, 0, 0, shstrtab_off, shstrtab.len() as u32, 0));

    let mut device = fresh_device();
    let err = rv32_elf::load_elf(&mut device, write_temp(&file)).unwrap_err();
    assert!(matches!(err, rv32_elf::LoaderError::MissingExitSymbol));
}

/// Writes `bytes` to a fresh temp file and returns its path; `load_elf`
/// only reads from paths, so tests need a real file on disk. Tests in
/// this binary run concurrently on separate threads of one process, so
/// the name is disambiguated with a counter, not just the PID.
fn write_temp(bytes: &[u8]) -> std::path::PathBuf {
    use std::io::Write;
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut path = std::env::temp_dir();
    path.push(format!("rv32-elf-test-{}-{n}.elf", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(bytes).unwrap();
    path
}
