//! Honeypot Bytecode
//!
//! Disassembles deployed EVM bytecode and extracts the constants the
//! simulation engine needs: method selectors, storage-slot candidates and
//! embedded addresses.

pub mod error;
pub mod parser;
pub mod proxy;
pub mod scanner;
pub mod utils;

pub use error::ScanError;
pub use parser::{parse_instructions, Instruction};
pub use proxy::minimal_proxy_target;
pub use scanner::{scan_bytecode, scan_code, BytecodeScan};
