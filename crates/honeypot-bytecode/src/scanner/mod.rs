use std::collections::HashSet;
use std::hash::Hash;

use ethereum_types::{Address, H256};

use crate::error::ScanError;
use crate::parser::{parse_instructions, Instruction, PUSH1, PUSH20, PUSH32, PUSH4};
use crate::utils::{decode_hex, selector};

const SENTINEL_SELECTOR: [u8; 4] = [0xff; 4];
const SENTINEL_ADDRESS: [u8; 20] = [0xff; 20];

/// Constants recovered from a contract's runtime bytecode.
///
/// Every list is de-duplicated and keeps first-seen order, which the slot
/// matcher relies on for its tie-break.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BytecodeScan {
    /// Operands of `PUSH4`, minus the `ffffffff` mask.
    pub methods: Vec<[u8; 4]>,
    /// Operands of `PUSH1` and `PUSH32`, left-padded to 32 bytes.
    pub storage_slots: Vec<H256>,
    /// Operands of `PUSH20`, minus the all-`f` mask.
    pub adr_in_code: Vec<Address>,
}

impl BytecodeScan {
    /// Selectors rendered as `0x`-prefixed hex.
    pub fn method_ids(&self) -> Vec<String> {
        self.methods
            .iter()
            .map(|m| format!("0x{}", hex::encode(m)))
            .collect()
    }

    pub fn has_method(&self, signature: &str) -> bool {
        self.methods.contains(&selector(signature))
    }
}

/// Scans a hex-encoded bytecode string.
pub fn scan_bytecode(bytecode_hex: &str) -> Result<BytecodeScan, ScanError> {
    let code = decode_hex(bytecode_hex).map_err(|e| ScanError::InvalidHex(e.to_string()))?;
    if code.is_empty() {
        return Err(ScanError::EmptyCode);
    }
    Ok(scan_code(&code))
}

/// Scans raw bytecode.
pub fn scan_code(code: &[u8]) -> BytecodeScan {
    let instructions = parse_instructions(code);

    let methods = dedup(
        instructions
            .iter()
            .filter(|i| i.opcode == PUSH4 && i.data.len() == 4)
            .map(|i| {
                let mut out = [0u8; 4];
                out.copy_from_slice(&i.data);
                out
            })
            .filter(|m| *m != SENTINEL_SELECTOR),
    );

    let storage_slots = dedup(
        instructions
            .iter()
            .filter(|i| i.opcode == PUSH1 || i.opcode == PUSH32)
            .map(left_pad),
    );

    let adr_in_code = dedup(
        instructions
            .iter()
            .filter(|i| i.opcode == PUSH20 && i.data.len() == 20)
            .filter(|i| i.data[..] != SENTINEL_ADDRESS[..])
            .map(|i| Address::from_slice(&i.data)),
    );

    BytecodeScan {
        methods,
        storage_slots,
        adr_in_code,
    }
}

fn left_pad(instruction: &Instruction) -> H256 {
    let mut out = [0u8; 32];
    let data = &instruction.data;
    out[32 - data.len()..].copy_from_slice(data);
    H256(out)
}

fn dedup<T: Eq + Hash + Copy>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(*item)).collect()
}
