//! Error taxonomy for ELF loading and ILP schedule parsing.

use std::fmt;
use std::io;

/// Everything that can make loading an ELF image fail.
#[derive(Debug)]
pub enum LoaderError {
    /// Couldn't read the file at all.
    Io(io::Error),
    /// The file is shorter than the header it's being read as.
    Truncated { wanted: usize, have: usize },
    /// `e_ident` doesn't start with the ELF magic bytes.
    BadMagic,
    /// `e_ident.bitness` isn't `1` (ELF32).
    WrongClass { found: u8 },
    /// `e_machine` isn't `0xF3` (RISC-V).
    WrongMachine { found: u16 },
    /// A `PROGBITS` section's `sh_addr..sh_addr+sh_size` didn't land
    /// inside any configured region.
    SectionOutOfBounds {
        name: String,
        addr: u32,
        size: u32,
    },
    /// The section header string table index (`e_shstrndx`) doesn't name
    /// a valid section, so section names can't be resolved.
    MissingSectionNameTable,
    /// Neither a `.strtab` nor a `.symtab` section was present, so
    /// `_exit` can't be resolved.
    MissingSymbolTable,
    /// `.symtab` has no `STT_FUNC` entry named `_exit`.
    MissingExitSymbol,
}

impl From<io::Error> for LoaderError {
    fn from(err: io::Error) -> Self {
        LoaderError::Io(err)
    }
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderError::Io(err) => write!(f, "failed to read ELF file: {err}"),
            LoaderError::Truncated { wanted, have } => write!(
                f,
                "ELF file is truncated: wanted at least {wanted} bytes, found {have}"
            ),
            LoaderError::BadMagic => write!(f, "not an ELF file: missing \\x7fELF magic"),
            LoaderError::WrongClass { found } => {
                write!(f, "unsupported ELF class {found}: only ELF32 (1) is supported")
            }
            LoaderError::WrongMachine { found } => write!(
                f,
                "unsupported e_machine {found:#06x}: only RISC-V (0xf3) is supported"
            ),
            LoaderError::SectionOutOfBounds { name, addr, size } => write!(
                f,
                "section '{name}' ({size} bytes at {addr:#010x}) does not fit in any configured region"
            ),
            LoaderError::MissingSectionNameTable => {
                write!(f, "e_shstrndx does not name a valid section header string table")
            }
            LoaderError::MissingSymbolTable => {
                write!(f, "ELF file has no .symtab/.strtab section pair")
            }
            LoaderError::MissingExitSymbol => {
                write!(f, "no STT_FUNC symbol named '_exit' in .symtab")
            }
        }
    }
}

impl std::error::Error for LoaderError {}

/// Everything that can make parsing an ILP schedule file fail.
#[derive(Debug)]
pub enum IlpError {
    Io(io::Error),
    Truncated { wanted: usize, have: usize },
    /// The first four bytes aren't `"ILP\0"`.
    BadMagic,
}

impl From<io::Error> for IlpError {
    fn from(err: io::Error) -> Self {
        IlpError::Io(err)
    }
}

impl fmt::Display for IlpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IlpError::Io(err) => write!(f, "failed to read ILP schedule file: {err}"),
            IlpError::Truncated { wanted, have } => write!(
                f,
                "ILP schedule file is truncated: wanted at least {wanted} bytes, found {have}"
            ),
            IlpError::BadMagic => write!(f, "not an ILP schedule file: missing \"ILP\\0\" magic"),
        }
    }
}

impl std::error::Error for IlpError {}
