pub const PUSH1: u8 = 0x60;
pub const PUSH4: u8 = 0x63;
pub const PUSH20: u8 = 0x73;
pub const PUSH32: u8 = 0x7f;

/// Decoded instruction from bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u8,
    /// Push operand; empty for every non-`PUSHn` opcode.
    pub data: Vec<u8>,
    pub pos: usize,
}

impl Instruction {
    pub fn is_push(&self) -> bool {
        (PUSH1..=PUSH32).contains(&self.opcode)
    }

    /// Operand width declared by the opcode, regardless of truncation.
    pub fn push_width(&self) -> usize {
        if self.is_push() {
            (self.opcode - PUSH1 + 1) as usize
        } else {
            0
        }
    }

    /// `true` when the code ended before the full operand was read.
    pub fn is_truncated(&self) -> bool {
        self.data.len() < self.push_width()
    }
}

/// Decodes raw bytecode into a list of instructions.
///
/// A push running past the end of the code (common inside the trailing
/// metadata blob) keeps whatever bytes remain.
pub fn parse_instructions(code: &[u8]) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    let mut i = 0;
    while i < code.len() {
        let opcode = code[i];
        let mut data = Vec::new();
        let pos = i;
        if (PUSH1..=PUSH32).contains(&opcode) {
            let n = (opcode - PUSH1 + 1) as usize;
            let end = core::cmp::min(i + 1 + n, code.len());
            data.extend_from_slice(&code[i + 1..end]);
            i += 1 + n;
        } else {
            i += 1;
        }
        instructions.push(Instruction { opcode, data, pos });
    }
    instructions
}
